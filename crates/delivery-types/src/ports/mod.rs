pub mod order_repository;
pub mod user_repository;

use thiserror::Error;

/// Everything the HTTP layer needs from a single store.
pub trait DeliveryRepository:
    user_repository::UserRepository + order_repository::OrderRepository
{
}

impl<T> DeliveryRepository for T where
    T: user_repository::UserRepository + order_repository::OrderRepository
{
}

/// Step of the accept transaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Begin,
    UpdateStatus,
    InsertAssignment,
    Commit,
}

impl std::fmt::Display for TxStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxStage::Begin => "begin",
            TxStage::UpdateStatus => "update status",
            TxStage::InsertAssignment => "insert assignment",
            TxStage::Commit => "commit",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("order {0} not found")]
    NotFound(i64),

    #[error("order {order_id} is {status}, not pending")]
    NotPending {
        order_id: i64,
        status: crate::domain::order::OrderStatus,
    },

    #[error("transaction failed at {stage}: {message}")]
    Transaction { stage: TxStage, message: String },
}

impl RepoError {
    pub fn tx(stage: TxStage, err: impl std::fmt::Display) -> Self {
        RepoError::Transaction {
            stage,
            message: err.to_string(),
        }
    }
}
