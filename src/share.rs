use thiserror::Error;
use tracing::debug;

use crate::balance::{compute_balances, InvalidExpense};
use crate::schemas::{TripId, UserId};
use crate::snapshot::{SettlementSnapshot, SharedSettlement};
use crate::store::{
    ExpenseSource, InsertOutcome, SettlementStore, ShareKey, StorageError, UserDirectory,
};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ShareError {
    #[error("target user does not exist")]
    UserNotFound,
    #[error("settlement already shared with this user")]
    AlreadyShared,
    #[error(transparent)]
    InvalidExpense(#[from] InvalidExpense),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Delivers settlement snapshots at most once per
/// `(trip, sharer, recipient)` key, on top of whatever storage backend
/// provides the atomic insert.
pub struct ShareRegistry<S> {
    store: S,
}

impl<S: SettlementStore> ShareRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a snapshot for its recipient. Fails with `AlreadyShared`
    /// when the key is taken, leaving the stored snapshot untouched.
    pub async fn share(&self, snapshot: SettlementSnapshot) -> Result<(), ShareError> {
        let key = ShareKey::of(&snapshot);
        match self.store.insert_if_absent(snapshot).await? {
            InsertOutcome::Inserted => {
                debug!(
                    trip_id = key.trip_id,
                    from_user_id = key.from_user_id,
                    to_user_id = key.to_user_id,
                    "settlement shared"
                );
                Ok(())
            }
            InsertOutcome::AlreadyExists => {
                debug!(
                    trip_id = key.trip_id,
                    from_user_id = key.from_user_id,
                    to_user_id = key.to_user_id,
                    "duplicate share rejected"
                );
                Err(ShareError::AlreadyShared)
            }
        }
    }

    /// The full sharing flow: resolve the recipient by username, compute
    /// the trip's current settlement from the owner's expenses, freeze it
    /// and deliver it. Sharing to oneself is permitted.
    pub async fn share_trip<E, U>(
        &self,
        expenses: &E,
        users: &U,
        trip_id: TripId,
        owner: UserId,
        target_username: &str,
        message: Option<&str>,
    ) -> Result<(), ShareError>
    where
        E: ExpenseSource,
        U: UserDirectory,
    {
        let to_user_id = users
            .resolve_user(target_username)
            .await?
            .ok_or(ShareError::UserNotFound)?;
        let records = expenses.fetch_expenses(trip_id, owner).await?;
        let balances = compute_balances(&records)?;
        let snapshot = SettlementSnapshot::build(trip_id, owner, to_user_id, &balances, message);
        self.share(snapshot).await
    }

    pub async fn list_received(
        &self,
        to_user_id: UserId,
    ) -> Result<Vec<SharedSettlement>, ShareError> {
        Ok(self.store.list_received(to_user_id).await?)
    }
}
