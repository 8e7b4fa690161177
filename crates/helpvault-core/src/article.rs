//! Articles: plaintext help items and sealed group articles.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{ArticleId, GroupId};

/// A plaintext help item as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpArticle {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub references: Vec<String>,
    pub level: String,
    pub group_name: String,
    pub created_at: i64,
}

/// Fields for a help item that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHelpArticle {
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub references: Vec<String>,
    pub level: String,
    pub group_name: String,
}

impl NewHelpArticle {
    /// Start a help item with a title and body.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn short_description(mut self, text: impl Into<String>) -> Self {
        self.short_description = text.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn group_name(mut self, group: impl Into<String>) -> Self {
        self.group_name = group.into();
        self
    }

    /// Titles identify help items, so they must be present.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::InvalidArticle("title is empty".into()));
        }
        Ok(())
    }
}

/// An encrypted article row: `sealed` is the `iv:ciphertext` text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedArticle {
    pub group: GroupId,
    pub article: ArticleId,
    pub sealed: String,
    pub updated_at: i64,
}
