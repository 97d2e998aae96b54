use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{Document, DocumentId};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("snapshot feed closed")]
    FeedClosed,
}

/// Full point-in-time listing of a collection, in backend order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<(DocumentId, Document)>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Live query over one collection. The first item is the current snapshot;
/// dropping the receiver unsubscribes.
pub type SnapshotFeed = mpsc::UnboundedReceiver<Result<Snapshot, StoreError>>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, StoreError>;
    /// Reads one document straight from the backend, bypassing any feed.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
    /// Merges `fields` into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;
    async fn remove(&self, collection: &str, id: &str) -> Result<(), StoreError>;
    async fn subscribe(&self, collection: &str) -> Result<SnapshotFeed, StoreError>;
}
