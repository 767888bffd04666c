//! # Change Feed and Live Subscriptions
//!
//! Every committed write publishes the collection it touched. A
//! [`Subscription`] turns those notifications into full, ordered snapshots.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Repository write ──commit──► ChangeFeed::notify(Collection::Sales)     │
//! │                                      │ broadcast                        │
//! │                     ┌────────────────┼────────────────┐                 │
//! │                     ▼                ▼                ▼                 │
//! │              Subscription     Subscription      Subscription            │
//! │              (Sales)          (Products)        (Sales)                 │
//! │                 │              ignores             │                    │
//! │                 ▼                                  ▼                    │
//! │          full re-read                        full re-read               │
//! │          (date DESC)                         (date DESC)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are always complete collections, never diffs. A subscriber
//! that falls behind gets a single fresh snapshot instead of every missed
//! notification.

use std::fmt;

use moda_core::{Customer, Product, Sale};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

use crate::error::DbResult;
use crate::pool::Database;

/// The three stored collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Products,
    Customers,
    Sales,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Products, Collection::Customers, Collection::Sales];
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Products => "products",
            Collection::Customers => "customers",
            Collection::Sales => "sales",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Change Feed
// =============================================================================

/// Broadcast channel of collection-changed notifications.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Collection>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ChangeFeed { tx }
    }

    /// Publishes a committed write. Having no listeners is fine.
    pub fn notify(&self, collection: Collection) {
        let receivers = self.tx.send(collection).unwrap_or(0);
        debug!(%collection, receivers, "Change published");
    }

    /// Raw receiver for callers that only need the signal.
    pub fn listen(&self) -> broadcast::Receiver<Collection> {
        self.tx.subscribe()
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// A complete, ordered copy of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Products(Vec<Product>),
    Customers(Vec<Customer>),
    Sales(Vec<Sale>),
}

impl Snapshot {
    pub fn collection(&self) -> Collection {
        match self {
            Snapshot::Products(_) => Collection::Products,
            Snapshot::Customers(_) => Collection::Customers,
            Snapshot::Sales(_) => Collection::Sales,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Snapshot::Products(v) => v.len(),
            Snapshot::Customers(v) => v.len(),
            Snapshot::Sales(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live view of one collection.
///
/// ## Example
/// ```rust,ignore
/// let mut sub = db.subscribe(Collection::Products);
/// let first = sub.next().await?;          // current contents
/// db.products().insert(&shirt).await?;
/// let second = sub.next().await?;         // contents after the insert
/// ```
#[derive(Debug)]
pub struct Subscription {
    db: Database,
    collection: Collection,
    rx: broadcast::Receiver<Collection>,
    primed: bool,
}

impl Subscription {
    pub(crate) fn new(db: Database, collection: Collection) -> Self {
        // listen before the first read so no write can slip between them
        let rx = db.feed().listen();
        Subscription {
            db,
            collection,
            rx,
            primed: false,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `Ok(None)` once the feed is closed.
    pub async fn next(&mut self) -> DbResult<Option<Snapshot>> {
        if !self.primed {
            self.primed = true;
            return self.load().await.map(Some);
        }

        loop {
            match self.rx.recv().await {
                Ok(changed) if changed == self.collection => break,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(collection = %self.collection, skipped, "Subscriber lagged");
                    break;
                }
                Err(RecvError::Closed) => return Ok(None),
            }
        }

        // notifications already queued are covered by the re-read below
        loop {
            match self.rx.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        self.load().await.map(Some)
    }

    async fn load(&self) -> DbResult<Snapshot> {
        let snapshot = match self.collection {
            Collection::Products => Snapshot::Products(self.db.products().list().await?),
            Collection::Customers => Snapshot::Customers(self.db.customers().list().await?),
            Collection::Sales => Snapshot::Sales(self.db.sales().list().await?),
        };
        debug!(collection = %self.collection, size = snapshot.len(), "Snapshot loaded");
        Ok(snapshot)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
