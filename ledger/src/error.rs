//! Error taxonomy for the ledger core (`spec.md` §7).
//!
//! Every variant here is one of the five kinds the spec names:
//! validation, insufficient_funds, not_found, conflict_transient,
//! internal. The HTTP collaborator layer (`api`) maps these to
//! transport status codes; this crate never leaks store-internal
//! error text through `Display`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input violated a declared precondition: non-positive amount,
    /// negative TTL/window, malformed identifier.
    #[error("validation error: {0}")]
    Validation(String),

    /// The debit requested more than was available at the moment the
    /// locks were acquired.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// The addressed entity (user, reservation) has no live state.
    #[error("not found: {0}")]
    NotFound(String),

    /// A serialization conflict or deadlock was detected by the store;
    /// the transaction rolled back cleanly and the call is safe to
    /// retry. See `spec.md` §9.4.
    #[error("transient conflict, retry the operation")]
    ConflictTransient,

    /// Any other store or I/O failure. Non-recoverable for the caller.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e
            && let Some(code) = db_err.code()
        {
            // 40001 = serialization_failure, 40P01 = deadlock_detected
            if code.as_ref() == "40001" || code.as_ref() == "40P01" {
                return LedgerError::ConflictTransient;
            }
        }
        LedgerError::Internal(e.into())
    }
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
