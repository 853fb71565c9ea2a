pub mod requests;
pub mod responses;

mod api_client;
pub use api_client::{APIClient, ClientError, ok_body, ok_empty};

/// Id type wrappers live on `ledger`; re-exported here so a client built
/// against `payloads` alone never needs a direct `ledger` dependency.
pub use ledger::{ReservationId, TransactionId, UserId};
