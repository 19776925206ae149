use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use delivery_types::ports::{RepoError, TxStage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid request method")]
    MethodNotAllowed,

    #[error("Invalid username or password")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Store failure outside a transaction. The message is what the caller sees.
    #[error("{0}")]
    Store(&'static str, #[source] RepoError),

    /// Failure inside the accept transaction, reported after rollback.
    #[error("{0}")]
    Transaction(&'static str, #[source] RepoError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Classify an error coming back from the accept transaction.
    pub fn from_accept(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => AppError::NotFound(format!("Order {id} not found")),
            RepoError::NotPending { .. } => AppError::Conflict("Order is not pending".into()),
            RepoError::Transaction { stage, .. } => {
                let msg = match stage {
                    TxStage::Begin => "Failed to begin transaction",
                    TxStage::UpdateStatus => "Failed to update order status",
                    TxStage::InsertAssignment => "Failed to insert driver order",
                    TxStage::Commit => "Failed to commit transaction",
                };
                AppError::Transaction(msg, err)
            }
            other => AppError::Store("Failed to accept order", other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(..) | AppError::Transaction(..) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        match &self {
            AppError::Store(msg, source) | AppError::Transaction(msg, source) => {
                tracing::error!(error = %source, "{msg}");
            }
            AppError::Internal(e) => tracing::error!(error = ?e, "internal error"),
            _ => tracing::debug!(status = %code, error = %self, "request rejected"),
        }
        // Plain text, never the underlying cause.
        (code, self.to_string()).into_response()
    }
}
