//! Bulk export of articles to delimited text.
//!
//! Exports need no permission check. Help items are written as plaintext
//! fields; sealed articles are written as their stored `iv:ciphertext`
//! text, never decrypted.
//!
//! Each record is one line of tab-separated fields. Backslash, tab, CR and
//! LF inside a field are escaped as `\\`, `\t`, `\r` and `\n`. List fields
//! join their items with `;`, escaped as `\;` inside an item.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use helpvault_core::HelpArticle;
use helpvault_store::Store;

use crate::error::{Result, VaultError};

/// First line of the help item section.
pub const HELP_SECTION: &str = "# help_articles";

/// First line of the sealed article section.
pub const SEALED_SECTION: &str = "# sealed_articles";

/// Number of records written per section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupReport {
    pub help_articles: usize,
    pub sealed_articles: usize,
}

pub struct BackupExporter<S> {
    store: Arc<S>,
}

impl<S> Clone for BackupExporter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

fn escape_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| escape_field(item).replace(';', "\\;"))
        .collect::<Vec<_>>()
        .join(";")
}

fn help_line(item: &HelpArticle) -> String {
    [
        item.id.to_string(),
        escape_field(&item.title),
        escape_field(&item.description),
        escape_field(&item.short_description),
        escape_list(&item.authors),
        escape_list(&item.keywords),
        escape_list(&item.references),
        escape_field(&item.level),
        escape_field(&item.group_name),
    ]
    .join("\t")
}

impl<S: Store> BackupExporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Write one line per help item. Returns the number of items written.
    pub async fn backup_help_articles<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let items = self.store.list_help_articles().await?;
        for item in &items {
            writeln!(writer, "{}", help_line(item))?;
        }
        Ok(items.len())
    }

    /// Write `group<TAB>article<TAB>iv:ciphertext` per sealed article.
    pub async fn backup_sealed_articles<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let rows = self.store.list_sealed_articles(None).await?;
        for row in &rows {
            writeln!(writer, "{}\t{}\t{}", row.group.0, row.article.0, row.sealed)?;
        }
        Ok(rows.len())
    }

    /// Write both sections to a file, replacing it.
    pub async fn backup_articles_to_file(&self, path: impl AsRef<Path>) -> Result<BackupReport> {
        let mut buf = Vec::new();

        writeln!(buf, "{HELP_SECTION}")?;
        let help_articles = self.backup_help_articles(&mut buf).await?;
        writeln!(buf, "{SEALED_SECTION}")?;
        let sealed_articles = self.backup_sealed_articles(&mut buf).await?;

        let path = path.as_ref().to_path_buf();
        let target = path.clone();
        tokio::task::spawn_blocking(move || std::fs::write(target, buf))
            .await
            .map_err(|e| VaultError::Export(std::io::Error::other(e)))??;

        tracing::info!(
            path = %path.display(),
            help_articles,
            sealed_articles,
            "articles exported"
        );
        Ok(BackupReport {
            help_articles,
            sealed_articles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("a\tb\nc\\d\re"), "a\\tb\\nc\\\\d\\re");
        assert_eq!(escape_field("plain"), "plain");
    }

    #[test]
    fn test_escape_list() {
        let items = vec!["Ref;1".to_string(), "Ref2".to_string()];
        assert_eq!(escape_list(&items), "Ref\\;1;Ref2");
        assert_eq!(escape_list(&[]), "");
    }

    #[test]
    fn test_help_line_layout() {
        let item = HelpArticle {
            id: 7,
            title: "Title1".into(),
            description: "line one\nline two".into(),
            short_description: "Short".into(),
            authors: vec!["A1".into(), "A2".into()],
            keywords: vec![],
            references: vec!["R1".into()],
            level: "Beginner".into(),
            group_name: "Group1".into(),
            created_at: 0,
        };

        assert_eq!(
            help_line(&item),
            "7\tTitle1\tline one\\nline two\tShort\tA1;A2\t\tR1\tBeginner\tGroup1"
        );
    }
}
