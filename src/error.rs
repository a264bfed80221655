use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Everything except `Database`/`Internal`/`External` is a recoverable
/// condition the caller is expected to handle (re-quote, retry later,
/// show the reason to the user).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Dates unavailable: {0}")]
    DatesUnavailable(String),

    #[error("Quote rejected: {0}")]
    QuoteRejected(String),

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Already settled: {0}")]
    AlreadySettled(String),

    #[error("Over-refund: requested {requested_cents} but only {refundable_cents} refundable")]
    OverRefund {
        requested_cents: i64,
        refundable_cents: i64,
    },

    #[error("Nothing to pay out")]
    NothingToPayout,

    #[error("Hold expired: {0}")]
    HoldExpired(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    External(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(ref msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error occurred" }),
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" }))
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "Forbidden" })),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::DatesUnavailable(ref msg) => (
                StatusCode::CONFLICT,
                json!({ "error": msg, "code": "dates_unavailable" }),
            ),
            AppError::QuoteRejected(ref msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": msg, "code": "quote_rejected" }),
            ),
            AppError::PaymentDeclined(ref msg) => (
                StatusCode::PAYMENT_REQUIRED,
                json!({ "error": msg, "code": "payment_declined" }),
            ),
            AppError::AlreadySettled(ref msg) => (
                StatusCode::CONFLICT,
                json!({ "error": msg, "code": "already_settled" }),
            ),
            AppError::OverRefund {
                requested_cents,
                refundable_cents,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "Refund amount exceeds refundable balance",
                    "code": "over_refund",
                    "requested_cents": requested_cents,
                    "refundable_cents": refundable_cents,
                }),
            ),
            AppError::NothingToPayout => (
                StatusCode::CONFLICT,
                json!({ "error": "No earnings to pay out", "code": "nothing_to_payout" }),
            ),
            AppError::HoldExpired(ref msg) => (
                StatusCode::GONE,
                json!({ "error": msg, "code": "hold_expired" }),
            ),
            AppError::Validation(ref msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": msg }))
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::External(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}
