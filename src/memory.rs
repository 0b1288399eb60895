use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::schemas::{ExpenseRecord, Trip, TripId, User, UserId};
use crate::snapshot::{SettlementSnapshot, SharedSettlement, TripRef, UserRef};
use crate::store::{
    ExpenseSource, InsertOutcome, SettlementStore, ShareKey, StorageError, UserDirectory,
};

#[derive(Clone, Debug)]
struct StoredShare {
    id: u64,
    snapshot: SettlementSnapshot,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    trips: HashMap<TripId, Trip>,
    expenses: HashMap<(TripId, UserId), Vec<ExpenseRecord>>,
    shares: HashMap<ShareKey, StoredShare>,
    next_share_id: u64,
}

/// In-process backend implementing all three boundary traits. The share
/// insert holds one mutex across check and write, so it is atomic within
/// a single process; multi-process deployments need `MongoBackend`.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.users.insert(user.id, user);
        }
    }

    pub fn add_trip(&self, trip: Trip) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.trips.insert(trip.id, trip);
        }
    }

    pub fn add_expense(&self, owner: UserId, expense: ExpenseRecord) {
        if let Ok(mut inner) = self.inner.lock() {
            inner
                .expenses
                .entry((expense.trip_id, owner))
                .or_default()
                .push(expense);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::new("memory backend mutex poisoned"))
    }
}

#[async_trait]
impl ExpenseSource for MemoryBackend {
    async fn fetch_expenses(
        &self,
        trip_id: TripId,
        owner: UserId,
    ) -> Result<Vec<ExpenseRecord>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .expenses
            .get(&(trip_id, owner))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for MemoryBackend {
    async fn resolve_user(&self, username: &str) -> Result<Option<UserId>, StorageError> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .find(|user| user.username == username)
            .map(|user| user.id))
    }
}

#[async_trait]
impl SettlementStore for MemoryBackend {
    async fn insert_if_absent(
        &self,
        snapshot: SettlementSnapshot,
    ) -> Result<InsertOutcome, StorageError> {
        let mut inner = self.lock()?;
        let key = ShareKey::of(&snapshot);
        if inner.shares.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        inner.next_share_id += 1;
        let id = inner.next_share_id;
        inner.shares.insert(key, StoredShare { id, snapshot });
        Ok(InsertOutcome::Inserted)
    }

    async fn list_received(
        &self,
        to_user_id: UserId,
    ) -> Result<Vec<SharedSettlement>, StorageError> {
        let inner = self.lock()?;
        let mut received: Vec<&StoredShare> = inner
            .shares
            .values()
            .filter(|share| share.snapshot.to_user_id() == to_user_id)
            .collect();
        received.sort_by(|a, b| {
            b.snapshot
                .created_at()
                .cmp(&a.snapshot.created_at())
                .then(b.id.cmp(&a.id))
        });
        Ok(received
            .into_iter()
            .map(|share| {
                let trip_name = inner
                    .trips
                    .get(&share.snapshot.trip_id())
                    .map(|trip| trip.name.clone())
                    .unwrap_or_default();
                let from_username = inner
                    .users
                    .get(&share.snapshot.from_user_id())
                    .map(|user| user.username.clone())
                    .unwrap_or_default();
                SharedSettlement {
                    id: share.id.to_string(),
                    trip: TripRef { name: trip_name },
                    from: UserRef {
                        username: from_username,
                    },
                    settlement_data: share.snapshot.settlement_data().clone(),
                    message: share.snapshot.message().to_owned(),
                    created_at: share.snapshot.created_at(),
                }
            })
            .collect())
    }
}
