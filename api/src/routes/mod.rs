pub mod ledger;

use actix_web::{HttpResponse, Responder, ResponseError, body::BoxBody, dev::HttpServiceFactory, get, web};
use ledger::LedgerError;

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("/api")
        .service(health_check)
        .service(ledger::add_points)
        .service(ledger::withdraw_points)
        .service(ledger::get_balance)
        .service(ledger::get_expiring_points)
        .service(ledger::reserve_points)
        .service(ledger::commit_reservation)
        .service(ledger::rollback_reservation)
        .service(ledger::get_transaction_history)
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("healthy")
}

/// Transport-facing error, mapping `spec.md` §6's status-code table onto
/// `LedgerError`'s taxonomy (`spec.md` §7).
#[derive(Debug, thiserror::Error)]
pub enum APIError {
    #[error("validation error: {0}")]
    BadRequest(String),
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transient conflict, retry the operation")]
    ConflictTransient,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            Self::BadRequest(_) => HttpResponse::BadRequest().body(self.to_string()),
            Self::InsufficientFunds => {
                HttpResponse::BadRequest().body(self.to_string())
            }
            Self::NotFound(_) => HttpResponse::NotFound().body(self.to_string()),
            // 409: the open question in `spec.md` §9.4 resolved as a redesign
            // (see SPEC_FULL.md §2-3) — the caller can safely retry.
            Self::ConflictTransient => HttpResponse::Conflict().body(self.to_string()),
            Self::Internal(_) => {
                HttpResponse::InternalServerError().body("internal error")
            }
        }
    }
}

impl From<LedgerError> for APIError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(msg) => APIError::BadRequest(msg),
            LedgerError::InsufficientFunds => APIError::InsufficientFunds,
            LedgerError::NotFound(msg) => APIError::NotFound(msg),
            LedgerError::ConflictTransient => APIError::ConflictTransient,
            LedgerError::Internal(e) => APIError::Internal(e),
        }
    }
}
