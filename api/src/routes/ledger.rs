use actix_web::{HttpResponse, get, post, web};
use ledger::{Ledger, UserId};
use payloads::{requests, responses};
use uuid::Uuid;

use super::APIError;

#[tracing::instrument(skip(ledger), ret)]
#[post("/add_points")]
pub async fn add_points(
    details: web::Json<requests::AddPoints>,
    ledger: web::Data<Ledger>,
) -> Result<HttpResponse, APIError> {
    let transaction = ledger
        .add_points(details.user_id, details.amount, details.ttl_days)
        .await?;
    Ok(HttpResponse::Created().json(transaction))
}

#[tracing::instrument(skip(ledger), ret)]
#[post("/withdraw_points")]
pub async fn withdraw_points(
    details: web::Json<requests::WithdrawPoints>,
    ledger: web::Data<Ledger>,
) -> Result<HttpResponse, APIError> {
    ledger
        .withdraw_points(details.user_id, details.amount)
        .await?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(ledger), ret)]
#[get("/balance/{user_id}")]
pub async fn get_balance(
    user_id: web::Path<Uuid>,
    ledger: web::Data<Ledger>,
) -> Result<HttpResponse, APIError> {
    let balance = ledger.get_balance(UserId(user_id.into_inner())).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[tracing::instrument(skip(ledger), ret)]
#[post("/expiring_points")]
pub async fn get_expiring_points(
    details: web::Json<requests::GetExpiringPoints>,
    ledger: web::Data<Ledger>,
) -> Result<HttpResponse, APIError> {
    let buckets = ledger
        .get_expiring_points(details.user_id, details.days)
        .await?;
    Ok(HttpResponse::Ok().json(buckets))
}

#[tracing::instrument(skip(ledger), ret)]
#[post("/reserve_points")]
pub async fn reserve_points(
    details: web::Json<requests::ReservePoints>,
    ledger: web::Data<Ledger>,
) -> Result<HttpResponse, APIError> {
    let reservation_id = ledger
        .reserve_points(details.user_id, details.amount)
        .await?;
    Ok(HttpResponse::Created().json(responses::ReservationCreated { reservation_id }))
}

#[tracing::instrument(skip(ledger), ret)]
#[post("/commit_reservation")]
pub async fn commit_reservation(
    details: web::Json<requests::CommitReservation>,
    ledger: web::Data<Ledger>,
) -> Result<HttpResponse, APIError> {
    ledger.commit_reservation(details.reservation_id).await?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(ledger), ret)]
#[post("/rollback_reservation")]
pub async fn rollback_reservation(
    details: web::Json<requests::RollbackReservation>,
    ledger: web::Data<Ledger>,
) -> Result<HttpResponse, APIError> {
    ledger.rollback_reservation(details.reservation_id).await?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(ledger), ret)]
#[post("/transaction_history")]
pub async fn get_transaction_history(
    details: web::Json<requests::GetTransactionHistory>,
    ledger: web::Data<Ledger>,
) -> Result<HttpResponse, APIError> {
    let history = ledger
        .get_transaction_history(details.user_id, details.limit, details.offset)
        .await?;
    Ok(HttpResponse::Ok().json(history))
}

