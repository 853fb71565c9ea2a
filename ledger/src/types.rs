//! The ledger's entity definitions (`spec.md` §3).

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{ReservationId, TransactionId, UserId};

/// Bridges a nullable `timestamptz` column to `Option<jiff::Timestamp>`.
///
/// `jiff_sqlx::Timestamp` only converts non-null columns; this wraps the
/// `Option` so `#[sqlx(try_from = "OptionalTimestamp")]` can decode
/// `expires_at`, which is absent for never-expiring lots.
#[derive(sqlx::Type)]
#[sqlx(transparent)]
pub struct OptionalTimestamp(Option<SqlxTs>);

impl TryFrom<OptionalTimestamp> for Option<Timestamp> {
    type Error = jiff::Error;

    fn try_from(value: OptionalTimestamp) -> Result<Self, Self::Error> {
        value.0.map(Timestamp::try_from).transpose()
    }
}

/// Row role, tagged variant half one: what kind of row this is.
///
/// `Commit`/`Rollback` are transitional — a row is stamped with them only
/// in the instant between a reservation's hold row being read and being
/// rewritten to its terminal `Withdrawal`/cancelled form. At rest only
/// `Deposit`, `Withdrawal`, and `Reserve` are ever observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Reserve,
    Commit,
    Rollback,
}

/// Row role, tagged variant half two: the row's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Reserved,
    Cancelled,
}

/// A single row of the append-only `transactions` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub type_: TransactionType,
    pub status: TransactionStatus,
    #[sqlx(try_from = "OptionalTimestamp")]
    pub expires_at: Option<Timestamp>,
    #[sqlx(try_from = "SqlxTs")]
    pub created_at: Timestamp,
    pub reservation_id: Option<ReservationId>,
    pub remaining_amount: i64,
}

/// Result of `GetBalance`: the available (unreserved, unexpired) total.
///
/// Per the open question in `spec.md` §9.1, this deliberately excludes
/// reserved points — preserve this semantics rather than silently
/// switching to `available + reserved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: UserId,
    pub total: i64,
}

/// One bucket of `GetExpiringPoints`: the total amount expiring at a
/// given instant, grouped across any lots that happen to share it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpiringBucket {
    pub expires_at: Timestamp,
    pub amount: i64,
}
