//! Remote mail-store contract consumed by the thread coordinator.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{Thread, Uid};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("folder not found: {0}")]
    FolderNotFound(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Mutations against the remote mail store.
///
/// The store's own consistency model is opaque: each call either resolves or
/// fails, and `reconcile_changes` asks it to refresh everything after a
/// structural change.
#[async_trait]
pub trait MailStore: Send + Sync {
    async fn move_messages(
        &self,
        account: &str,
        ids: &[Uid],
        from_folder: &str,
        to_folder: &str,
    ) -> Result<(), StoreError>;

    async fn star_messages(&self, account: &str, folder: &str, ids: &[Uid])
    -> Result<(), StoreError>;

    async fn unstar_messages(
        &self,
        account: &str,
        folder: &str,
        ids: &[Uid],
    ) -> Result<(), StoreError>;

    /// Fire-and-forget: enqueue read-state updates keyed `account-message_id`
    fn mark_read(&self, keys: &[String]);

    /// Trigger a global refresh after a structural mutation
    fn reconcile_changes(&self);
}

/// Data-fetch layer: supplies the threads currently in a folder
pub trait ThreadSource: Send + Sync {
    fn load_threads(&self, folder: &str) -> Vec<Thread>;
}
