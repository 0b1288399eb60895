use async_trait::async_trait;
use thiserror::Error;

use crate::schemas::{ExpenseRecord, TripId, UserId};
use crate::snapshot::{SettlementSnapshot, SharedSettlement};

/// Identity of a share: at most one snapshot may ever be stored per key.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ShareKey {
    pub trip_id: TripId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
}

impl ShareKey {
    pub fn of(snapshot: &SettlementSnapshot) -> Self {
        Self {
            trip_id: snapshot.trip_id(),
            from_user_id: snapshot.from_user_id(),
            to_user_id: snapshot.to_user_id(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Storage-layer failure, propagated unchanged. The core never retries.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("storage failure: {0}")]
pub struct StorageError(String);

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Source of the expenses a settlement is computed from. Implementations
/// return all and only the expenses the owner may see; the core trusts
/// the list completely.
#[async_trait]
pub trait ExpenseSource: Send + Sync {
    async fn fetch_expenses(
        &self,
        trip_id: TripId,
        owner: UserId,
    ) -> Result<Vec<ExpenseRecord>, StorageError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve_user(&self, username: &str) -> Result<Option<UserId>, StorageError>;
}

/// Persistence for shared settlements.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Inserts the snapshot unless its key is already taken. The check and
    /// the write must be one atomic step in the storage layer (unique key
    /// or compare-and-set); a separate check-then-insert races under
    /// concurrent sharing.
    async fn insert_if_absent(
        &self,
        snapshot: SettlementSnapshot,
    ) -> Result<InsertOutcome, StorageError>;

    /// Everything shared to `to_user_id`, newest first. A persistent
    /// projection: entries stay visible indefinitely.
    async fn list_received(
        &self,
        to_user_id: UserId,
    ) -> Result<Vec<SharedSettlement>, StorageError>;
}
