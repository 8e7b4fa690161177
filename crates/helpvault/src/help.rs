//! Help Catalogue: plaintext help items, identified by title.
//!
//! Help items are public; no permission check applies.

use std::sync::Arc;

use helpvault_core::{now_millis, HelpArticle, NewHelpArticle};
use helpvault_store::Store;

use crate::error::{Result, VaultError};

pub struct HelpCatalogue<S> {
    store: Arc<S>,
}

impl<S> Clone for HelpCatalogue<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> HelpCatalogue<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Add a help item. Titles are unique.
    pub async fn add(&self, item: NewHelpArticle) -> Result<HelpArticle> {
        item.validate()?;

        let stored = self
            .store
            .insert_help_article(&item, now_millis())
            .await?
            .ok_or_else(|| VaultError::DuplicateIdentity(format!("help item {:?}", item.title)))?;

        tracing::info!(id = stored.id, title = %stored.title, "help item added");
        Ok(stored)
    }

    pub async fn get(&self, title: &str) -> Result<HelpArticle> {
        self.store
            .get_help_article(title)
            .await?
            .ok_or_else(|| VaultError::NotFound(format!("help item {title:?}")))
    }

    pub async fn delete(&self, title: &str) -> Result<()> {
        if !self.store.delete_help_article(title).await? {
            return Err(VaultError::NotFound(format!("help item {title:?}")));
        }
        tracing::info!(title, "help item deleted");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<HelpArticle>> {
        Ok(self.store.list_help_articles().await?)
    }
}
