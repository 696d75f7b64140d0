use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// The main error type for the webhook service.
///
/// Each variant maps to one of the three externally observable failure
/// modes. The `Display` output doubles as the HTTP response body, so the
/// messages here are part of the wire contract with Stripe's retry logic.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Signature verification failed (bad/missing signature, stale
    /// timestamp, unparseable payload, or no secret configured).
    #[error("Webhook Error: {0}")]
    Signature(String),

    /// A completion event arrived without `userId`/`courseId` metadata.
    #[error("Webhook Error: Missing metadata")]
    MissingMetadata,

    /// The purchase insert failed. The inner message carries the store
    /// detail for logging; the response body stays generic.
    #[error("Database Error")]
    Database(String),
}

impl WebhookError {
    pub fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

impl From<sea_orm::DbErr> for WebhookError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Signature(_) | Self::MissingMetadata => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebhookError>;
