use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use schooldesk_core::{Document, DocumentId, DocumentStore, Snapshot, SnapshotFeed, StoreError};

type Subscriber = mpsc::UnboundedSender<Result<Snapshot, StoreError>>;

#[derive(Default)]
struct CollectionData {
    documents: Vec<(DocumentId, Document)>,
    subscribers: Vec<Subscriber>,
}

impl CollectionData {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|(doc_id, _)| doc_id.as_ref() == id)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            documents: self.documents.clone(),
        }
    }

    fn publish(&mut self, collection: &str) {
        let snapshot = self.snapshot();
        self.subscribers.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
        tracing::trace!(collection, subscribers = self.subscribers.len(), "Snapshot published");
    }
}

/// Document store that keeps every collection in process memory.
///
/// Documents keep insertion order, ids are random UUIDs, and every committed
/// write pushes a fresh snapshot to the collection's live subscribers.
pub struct InMemoryDocumentStore {
    collections: RwLock<BTreeMap<Arc<str>, CollectionData>>,
    offline: AtomicBool,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// While offline every write fails with `StoreError::Unavailable`.
    /// Subscriptions stay open.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        tracing::debug!(offline, "Document store connectivity changed");
    }

    /// Pushes an error to every live subscriber of `collection`.
    pub fn break_feeds(&self, collection: &str, reason: &str) {
        let mut collections = self.write_lock();
        if let Some(data) = collections.get_mut(collection) {
            let error = StoreError::Unavailable(reason.to_string());
            data.subscribers.retain(|tx| tx.send(Err(error.clone())).is_ok());
        }
    }

    /// Current contents of a collection, outside of any subscription.
    pub fn documents(&self, collection: &str) -> Vec<(DocumentId, Document)> {
        self.read_lock()
            .get(collection)
            .map(|data| data.documents.clone())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.read_lock()
            .get(collection)
            .map(|data| data.subscribers.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("backend is offline".to_string()));
        }
        Ok(())
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, BTreeMap<Arc<str>, CollectionData>> {
        self.collections.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, BTreeMap<Arc<str>, CollectionData>> {
        self.collections.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId, StoreError> {
        self.ensure_online()?;
        let id: DocumentId = Arc::from(Uuid::new_v4().simple().to_string());

        let mut collections = self.write_lock();
        let data = collections.entry(Arc::from(collection)).or_default();
        data.documents.push((id.clone(), document));
        data.publish(collection);

        tracing::debug!(collection, id = %id, "Document inserted");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.ensure_online()?;
        let collections = self.read_lock();
        Ok(collections.get(collection).and_then(|data| {
            data.position(id).map(|pos| data.documents[pos].1.clone())
        }))
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.ensure_online()?;
        let not_found = || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        };

        let mut collections = self.write_lock();
        let data = collections.get_mut(collection).ok_or_else(not_found)?;
        let pos = data.position(id).ok_or_else(not_found)?;
        data.documents[pos].1.extend(fields);
        data.publish(collection);

        tracing::debug!(collection, id, "Document updated");
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.ensure_online()?;
        let not_found = || StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        };

        let mut collections = self.write_lock();
        let data = collections.get_mut(collection).ok_or_else(not_found)?;
        let pos = data.position(id).ok_or_else(not_found)?;
        data.documents.remove(pos);
        data.publish(collection);

        tracing::debug!(collection, id, "Document removed");
        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> Result<SnapshotFeed, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut collections = self.write_lock();
        let data = collections.entry(Arc::from(collection)).or_default();
        // A closed receiver here just means the caller already went away.
        let _ = tx.send(Ok(data.snapshot()));
        data.subscribers.push(tx);

        tracing::debug!(collection, "Subscription opened");
        Ok(rx)
    }
}
