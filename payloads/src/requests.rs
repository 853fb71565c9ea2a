use crate::{ReservationId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct AddPoints {
    pub user_id: UserId,
    pub amount: i64,
    pub ttl_days: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawPoints {
    pub user_id: UserId,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetBalance {
    pub user_id: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReservePoints {
    pub user_id: UserId,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitReservation {
    pub reservation_id: ReservationId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RollbackReservation {
    pub reservation_id: ReservationId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetExpiringPoints {
    pub user_id: UserId,
    pub days: i64,
}

fn default_history_limit() -> i64 {
    50
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetTransactionHistory {
    pub user_id: UserId,
    #[serde(default = "default_history_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
