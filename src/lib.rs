//! Settlement core for shared travel expenses.
//!
//! - **schemas**: serde data types (expenses, trips, users)
//! - **balance**: equal-split ledger fold producing signed balances
//! - **snapshot**: immutable settlement snapshots and the recipient view
//! - **store**: boundary traits over expenses, users and share persistence
//! - **share**: at-most-once delivery of snapshots between users
//! - **memory** / **mongo**: in-process and MongoDB backends
//!
//! Balance computation is pure and order-independent; the sharing path is
//! the only stateful part, and its at-most-once guarantee is enforced by
//! an atomic insert in the storage backend, not by in-process locking.

pub mod balance;
pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod share;
pub mod snapshot;
pub mod store;

pub use balance::{compute_balances, BalanceMap, InvalidExpense};
pub use memory::MemoryBackend;
pub use mongo::MongoBackend;
pub use schemas::{ExpenseRecord, ParticipantName, Trip, TripId, User, UserId};
pub use share::{ShareError, ShareRegistry};
pub use snapshot::{SettlementSnapshot, SharedSettlement, TripRef, UserRef};
pub use store::{
    ExpenseSource, InsertOutcome, SettlementStore, ShareKey, StorageError, UserDirectory,
};
