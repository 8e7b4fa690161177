//! Encrypted Content Vault: per-article encryption gated on the
//! permission matrix.
//!
//! Every read checks VIEW before the stored pair is even loaded; no
//! decryption happens for a requester who fails the check.

use std::sync::Arc;

use helpvault_core::{now_millis, ArticleId, GroupId, SealedArticle, Username};
use helpvault_perms::{GroupOperation, IvStrategy, SealedContent, SymmetricCipher};
use helpvault_store::Store;

use crate::error::{Result, VaultError};
use crate::matrix::PermissionMatrix;

pub struct ContentVault<S> {
    store: Arc<S>,
    matrix: PermissionMatrix<S>,
    cipher: Arc<dyn SymmetricCipher>,
    iv_strategy: IvStrategy,
    admin_writes: bool,
}

impl<S> Clone for ContentVault<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            matrix: self.matrix.clone(),
            cipher: self.cipher.clone(),
            iv_strategy: self.iv_strategy,
            admin_writes: self.admin_writes,
        }
    }
}

impl<S: Store> ContentVault<S> {
    pub fn new(
        store: Arc<S>,
        matrix: PermissionMatrix<S>,
        cipher: Arc<dyn SymmetricCipher>,
        iv_strategy: IvStrategy,
        admin_writes: bool,
    ) -> Self {
        Self {
            store,
            matrix,
            cipher,
            iv_strategy,
            admin_writes,
        }
    }

    /// Encrypt and store an article, replacing any previous version.
    ///
    /// `author` needs ADMIN on the group (VIEW when admin writes are off).
    pub async fn put_article(
        &self,
        group: GroupId,
        article: ArticleId,
        plaintext: &[u8],
        author: &Username,
    ) -> Result<()> {
        self.matrix
            .authorize(group, author, GroupOperation::WriteArticles, self.admin_writes)
            .await?;

        let sealed = SealedContent::seal(self.cipher.as_ref(), plaintext, self.iv_strategy)?;
        let row = SealedArticle {
            group,
            article,
            sealed: sealed.encode(),
            updated_at: now_millis(),
        };
        self.store.upsert_sealed_article(&row).await?;

        tracing::info!(%group, %article, author = %author, "article stored");
        Ok(())
    }

    /// Decrypt an article for `requester`, who must hold VIEW on the group.
    pub async fn get_article_content(
        &self,
        group: GroupId,
        article: ArticleId,
        requester: &Username,
    ) -> Result<Vec<u8>> {
        self.matrix
            .authorize(group, requester, GroupOperation::ReadArticles, self.admin_writes)
            .await?;

        let row = self
            .store
            .get_sealed_article(group, article)
            .await?
            .ok_or_else(|| VaultError::NotFound(article.to_string()))?;

        let plaintext = SealedContent::decode(&row.sealed)
            .and_then(|sealed| sealed.open(self.cipher.as_ref()))
            .map_err(|e| {
                tracing::warn!(%group, %article, error = %e, "corrupt sealed article");
                VaultError::from(e)
            })?;

        tracing::debug!(%group, %article, requester = %requester, "article read");
        Ok(plaintext)
    }

    /// Delete an article. Same permission as writing.
    pub async fn delete_article(
        &self,
        group: GroupId,
        article: ArticleId,
        requester: &Username,
    ) -> Result<()> {
        self.matrix
            .authorize(group, requester, GroupOperation::WriteArticles, self.admin_writes)
            .await?;

        if !self.store.delete_sealed_article(group, article).await? {
            return Err(VaultError::NotFound(article.to_string()));
        }
        tracing::info!(%group, %article, requester = %requester, "article deleted");
        Ok(())
    }

    /// Ids of the articles in a group, for a requester holding VIEW.
    pub async fn article_ids(&self, group: GroupId, requester: &Username) -> Result<Vec<ArticleId>> {
        self.matrix
            .authorize(group, requester, GroupOperation::ReadArticles, self.admin_writes)
            .await?;

        let rows = self.store.list_sealed_articles(Some(group)).await?;
        Ok(rows.into_iter().map(|row| row.article).collect())
    }
}
