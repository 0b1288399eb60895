use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::balance::BalanceMap;
use crate::schemas::{TripId, UserId};

/// A settlement frozen at share time. The balance map is copied on
/// construction and never exposed mutably, so later changes to the trip's
/// expenses cannot alter what was shared.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SettlementSnapshot {
    trip_id: TripId,
    from_user_id: UserId,
    to_user_id: UserId,
    settlement_data: BalanceMap,
    message: String,
    created_at: DateTime<Utc>,
}

impl SettlementSnapshot {
    pub fn build(
        trip_id: TripId,
        from_user_id: UserId,
        to_user_id: UserId,
        balances: &BalanceMap,
        message: Option<&str>,
    ) -> Self {
        Self::build_at(trip_id, from_user_id, to_user_id, balances, message, Utc::now())
    }

    pub fn build_at(
        trip_id: TripId,
        from_user_id: UserId,
        to_user_id: UserId,
        balances: &BalanceMap,
        message: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            trip_id,
            from_user_id,
            to_user_id,
            settlement_data: balances.clone(),
            message: message.unwrap_or_default().to_owned(),
            created_at,
        }
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    pub fn from_user_id(&self) -> UserId {
        self.from_user_id
    }

    pub fn to_user_id(&self) -> UserId {
        self.to_user_id
    }

    pub fn settlement_data(&self) -> &BalanceMap {
        &self.settlement_data
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TripRef {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UserRef {
    pub username: String,
}

/// What a recipient sees in their inbox: the frozen settlement plus the
/// trip name and the sharer's username, resolved at read time.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SharedSettlement {
    pub id: String,
    #[serde(rename = "trips")]
    pub trip: TripRef,
    #[serde(rename = "users")]
    pub from: UserRef,
    pub settlement_data: BalanceMap,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
