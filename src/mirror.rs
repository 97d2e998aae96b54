//! Local copies of remote collections, refreshed from live snapshot feeds.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use schooldesk_core::{DocumentStore, Record, SnapshotFeed, StoreError};

use crate::error::AppError;

/// Health of one collection's snapshot feed.
#[derive(Debug, Clone)]
pub enum FeedState {
    /// No snapshot received yet.
    Connecting,
    Live,
    /// The feed failed; records are the last ones received.
    Stale(AppError),
}

impl FeedState {
    pub fn is_live(&self) -> bool {
        matches!(self, FeedState::Live)
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, FeedState::Stale(_))
    }
}

#[derive(Debug, Clone)]
struct MirrorState<T> {
    records: Arc<Vec<T>>,
    feed: FeedState,
}

/// Mirror of one remote collection.
///
/// Only the feed task writes to the mirror. Writes made through the store show
/// up here once the backend echoes them in a new snapshot.
pub struct CollectionMirror<T: Record> {
    state: watch::Receiver<MirrorState<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Record> CollectionMirror<T> {
    pub async fn open(documents: &dyn DocumentStore) -> Self {
        let (tx, rx) = watch::channel(MirrorState {
            records: Arc::new(Vec::new()),
            feed: FeedState::Connecting,
        });

        let task = match documents.subscribe(T::COLLECTION).await {
            Ok(feed) => Some(tokio::spawn(run_feed(feed, tx))),
            Err(source) => {
                let error = AppError::Subscription {
                    collection: T::COLLECTION,
                    source,
                };
                tracing::error!(%error, "Could not subscribe");
                tx.send_modify(|state| state.feed = FeedState::Stale(error));
                None
            }
        };

        Self { state: rx, task }
    }

    /// Records in snapshot order.
    pub fn records(&self) -> Arc<Vec<T>> {
        self.state.borrow().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.state.borrow().records.iter().find(|r| r.id() == id).cloned()
    }

    pub fn feed_state(&self) -> FeedState {
        self.state.borrow().feed.clone()
    }

    /// Resolves once the mirrored records satisfy `predicate`, or with the
    /// current records if the feed has ended.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Arc<Vec<T>>
    where
        F: FnMut(&[T]) -> bool,
    {
        let mut rx = self.state.clone();
        let result = rx.wait_for(|state| predicate(state.records.as_slice())).await;
        match result {
            Ok(state) => state.records.clone(),
            Err(_) => self.records(),
        }
    }

    pub async fn wait_for_feed<F>(&self, mut predicate: F) -> FeedState
    where
        F: FnMut(&FeedState) -> bool,
    {
        let mut rx = self.state.clone();
        let result = rx.wait_for(|state| predicate(&state.feed)).await;
        match result {
            Ok(state) => state.feed.clone(),
            Err(_) => self.feed_state(),
        }
    }

    /// Stops the feed. Records stay as last received.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(collection = T::COLLECTION, "Subscription released");
        }
    }
}

impl<T: Record> Drop for CollectionMirror<T> {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_feed<T: Record>(mut feed: SnapshotFeed, state: watch::Sender<MirrorState<T>>) {
    while let Some(event) = feed.recv().await {
        match event {
            Ok(snapshot) => {
                let records: Vec<T> = snapshot
                    .documents
                    .iter()
                    .map(|(id, document)| T::from_document(id, document))
                    .collect();
                tracing::debug!(collection = T::COLLECTION, count = records.len(), "Snapshot applied");
                state.send_modify(|s| {
                    s.records = Arc::new(records);
                    s.feed = FeedState::Live;
                });
            }
            Err(source) => {
                let error = AppError::Subscription {
                    collection: T::COLLECTION,
                    source,
                };
                tracing::error!(%error, "Keeping last known records");
                state.send_modify(|s| s.feed = FeedState::Stale(error));
            }
        }
    }

    tracing::warn!(collection = T::COLLECTION, "Snapshot feed ended");
    state.send_modify(|s| {
        s.feed = FeedState::Stale(AppError::Subscription {
            collection: T::COLLECTION,
            source: StoreError::FeedClosed,
        })
    });
}
