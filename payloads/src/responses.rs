use crate::ReservationId;
use serde::{Deserialize, Serialize};

pub use ledger::{Balance, ExpiringBucket, Transaction, TransactionStatus, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCreated {
    pub reservation_id: ReservationId,
}
