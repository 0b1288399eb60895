use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::schemas::{ExpenseRecord, Trip, TripId, User, UserId};
use crate::snapshot::{SettlementSnapshot, SharedSettlement, TripRef, UserRef};
use crate::store::{ExpenseSource, InsertOutcome, SettlementStore, StorageError, UserDirectory};

use async_trait::async_trait;

const DB_NAME: &str = "tripsplit";

/// MongoDB-backed implementation of the boundary traits. At-most-once
/// sharing rests on a unique compound index over the share key: the
/// duplicate-key error from a plain `insert_one` is the atomic
/// check-and-insert, valid across processes.
pub struct MongoBackend {
    db: Database,
}

#[derive(Debug, Deserialize, Serialize)]
struct ShareDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    trip_id: TripId,
    from_user_id: UserId,
    to_user_id: UserId,
    settlement_data: std::collections::HashMap<String, f64>,
    message: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ExpenseDocument {
    owner_id: UserId,
    #[serde(flatten)]
    record: ExpenseRecord,
}

impl ShareDocument {
    fn from_snapshot(snapshot: &SettlementSnapshot) -> Self {
        Self {
            id: None,
            trip_id: snapshot.trip_id(),
            from_user_id: snapshot.from_user_id(),
            to_user_id: snapshot.to_user_id(),
            settlement_data: snapshot.settlement_data().clone(),
            message: snapshot.message().to_owned(),
            created_at: snapshot.created_at(),
        }
    }

    fn into_shared(self, trip_name: String, from_username: String) -> SharedSettlement {
        SharedSettlement {
            id: self.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            trip: TripRef { name: trip_name },
            from: UserRef {
                username: from_username,
            },
            settlement_data: self.settlement_data,
            message: self.message,
            created_at: self.created_at,
        }
    }
}

impl MongoBackend {
    pub async fn connect(uri: &str) -> Result<Self, StorageError> {
        let client = Client::with_uri_str(uri).await?;
        let backend = Self {
            db: client.database(DB_NAME),
        };
        backend.ensure_share_index().await?;
        info!("connected to mongodb");
        Ok(backend)
    }

    async fn ensure_share_index(&self) -> Result<(), StorageError> {
        let options = IndexOptions::builder().unique(true).build();
        let model = IndexModel::builder()
            .keys(doc! { "trip_id": 1, "from_user_id": 1, "to_user_id": 1 })
            .options(options)
            .build();
        self.shares().create_index(model, None).await?;
        Ok(())
    }

    fn shares(&self) -> Collection<ShareDocument> {
        self.db.collection("shared_settlements")
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn trips(&self) -> Collection<Trip> {
        self.db.collection("trips")
    }

    fn expenses(&self) -> Collection<ExpenseDocument> {
        self.db.collection("expenses")
    }

    pub async fn add_user(&self, user: User) -> Result<(), StorageError> {
        self.users().insert_one(user, None).await?;
        Ok(())
    }

    pub async fn add_trip(&self, trip: Trip) -> Result<(), StorageError> {
        self.trips().insert_one(trip, None).await?;
        Ok(())
    }

    pub async fn add_expense(
        &self,
        owner: UserId,
        record: ExpenseRecord,
    ) -> Result<(), StorageError> {
        let document = ExpenseDocument {
            owner_id: owner,
            record,
        };
        self.expenses().insert_one(document, None).await?;
        Ok(())
    }
}

impl From<mongodb::error::Error> for StorageError {
    fn from(err: mongodb::error::Error) -> Self {
        StorageError::new(err.to_string())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_err)) if write_err.code == 11000
    )
}

#[async_trait]
impl ExpenseSource for MongoBackend {
    async fn fetch_expenses(
        &self,
        trip_id: TripId,
        owner: UserId,
    ) -> Result<Vec<ExpenseRecord>, StorageError> {
        let mut cursor = self
            .expenses()
            .find(doc! { "trip_id": trip_id, "owner_id": owner }, None)
            .await?;
        let mut records = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            records.push(document.record);
        }
        Ok(records)
    }
}

#[async_trait]
impl UserDirectory for MongoBackend {
    async fn resolve_user(&self, username: &str) -> Result<Option<UserId>, StorageError> {
        let user = self
            .users()
            .find_one(doc! { "username": username }, None)
            .await?;
        Ok(user.map(|user| user.id))
    }
}

#[async_trait]
impl SettlementStore for MongoBackend {
    async fn insert_if_absent(
        &self,
        snapshot: SettlementSnapshot,
    ) -> Result<InsertOutcome, StorageError> {
        let document = ShareDocument::from_snapshot(&snapshot);
        match self.shares().insert_one(document, None).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_received(
        &self,
        to_user_id: UserId,
    ) -> Result<Vec<SharedSettlement>, StorageError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let mut cursor = self
            .shares()
            .find(doc! { "to_user_id": to_user_id }, options)
            .await?;
        let mut received = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            let trip_name = self
                .trips()
                .find_one(doc! { "id": document.trip_id }, None)
                .await?
                .map(|trip| trip.name)
                .unwrap_or_default();
            let from_username = self
                .users()
                .find_one(doc! { "id": document.from_user_id }, None)
                .await?
                .map(|user| user.username)
                .unwrap_or_default();
            received.push(document.into_shared(trip_name, from_username));
        }
        Ok(received)
    }
}
