use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TripId = i64;
pub type UserId = i64;

/// Free-text participant name. Not an account reference: two spellings
/// that differ in case or whitespace are two different people.
pub type ParticipantName = String;

/// A single payment made by one participant and split equally with the
/// names in `split_with` (which excludes the payer).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub trip_id: TripId,
    pub description: String,
    pub amount: f64,
    pub payer: ParticipantName,
    #[serde(default)]
    pub split_with: Vec<ParticipantName>,
    /// Informational only, never used in balance computation.
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Trip {
    pub id: TripId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}
