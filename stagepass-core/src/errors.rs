use thiserror::Error;

pub type Result<T> = std::result::Result<T, PurchaseError>;

/// Failure taxonomy of the purchase path. Everything here produces a client
/// or server error response with no partial effect: either the full
/// purchase-plus-credit sequence commits or it is fully rolled back.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("event {0} not found")]
    EventNotFound(u64),

    #[error("event {event_id}: not enough tickets for delta {delta}")]
    InsufficientTickets { event_id: u64, delta: i64 },

    #[error("node is not the primary and the request carries no replication timestamp")]
    NotPrimary,

    #[error("user-account service rejected the credit, purchase rolled back")]
    CreditRejected,
}
