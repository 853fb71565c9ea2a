use crate::{ReservationId, UserId, requests, responses};
use serde::Serialize;

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// An API client for interfacing with the ledger backend.
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", &self.address)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        self.inner_client
            .post(self.format_url(path))
            .json(body)
            .send()
            .await
    }

    async fn empty_get(&self, path: &str) -> ReqwestResult {
        self.inner_client.get(self.format_url(path)).send().await
    }
}

/// Methods on the backend API
impl APIClient {
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.empty_get("health_check").await?;
        ok_empty(response).await
    }

    pub async fn add_points(
        &self,
        details: &requests::AddPoints,
    ) -> Result<responses::Transaction, ClientError> {
        let response = self.post("add_points", details).await?;
        ok_body(response).await
    }

    pub async fn withdraw_points(
        &self,
        details: &requests::WithdrawPoints,
    ) -> Result<(), ClientError> {
        let response = self.post("withdraw_points", details).await?;
        ok_empty(response).await
    }

    pub async fn get_balance(
        &self,
        user_id: &UserId,
    ) -> Result<responses::Balance, ClientError> {
        let response = self
            .empty_get(&format!("balance/{user_id}"))
            .await?;
        ok_body(response).await
    }

    pub async fn get_expiring_points(
        &self,
        details: &requests::GetExpiringPoints,
    ) -> Result<Vec<responses::ExpiringBucket>, ClientError> {
        let response = self.post("expiring_points", details).await?;
        ok_body(response).await
    }

    pub async fn reserve_points(
        &self,
        details: &requests::ReservePoints,
    ) -> Result<responses::ReservationCreated, ClientError> {
        let response = self.post("reserve_points", details).await?;
        ok_body(response).await
    }

    pub async fn commit_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<(), ClientError> {
        let response = self
            .post(
                "commit_reservation",
                &requests::CommitReservation {
                    reservation_id: *reservation_id,
                },
            )
            .await?;
        ok_empty(response).await
    }

    pub async fn rollback_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<(), ClientError> {
        let response = self
            .post(
                "rollback_reservation",
                &requests::RollbackReservation {
                    reservation_id: *reservation_id,
                },
            )
            .await?;
        ok_empty(response).await
    }

    pub async fn get_transaction_history(
        &self,
        details: &requests::GetTransactionHistory,
    ) -> Result<Vec<responses::Transaction>, ClientError> {
        let response = self.post("transaction_history", details).await?;
        ok_body(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing response text.
    #[error("{1}")]
    APIError(reqwest::StatusCode, String),
    #[error("network error, please check your connection")]
    Network(#[from] reqwest::Error),
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(response.json::<T>().await?)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
