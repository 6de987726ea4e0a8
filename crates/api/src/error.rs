//! API error types with HTTP response mapping.
//!
//! Every error body carries the same shape: `{ success: false, message,
//! reasonCode }`, with a stable reason code per condition. Provider and
//! storage detail is logged server-side, never echoed to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request carried no usable credential.
    Unauthenticated,
    /// Malformed request input (bad identifiers, missing fields).
    BadRequest(String),
    /// Checkout flow error.
    Checkout(CheckoutError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, reason_code) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
                "unauthenticated",
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "bad-request"),
            ApiError::Checkout(err) => checkout_error_to_response(err),
        };

        let body = serde_json::json!({
            "success": false,
            "message": message,
            "reasonCode": reason_code,
        });
        (status, Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String, &'static str) {
    let reason_code = err.reason_code();
    let (status, message) = match &err {
        CheckoutError::Ineligible(_) | CheckoutError::PaymentNotSucceeded { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::IntentMismatch { .. } => {
            // Already logged loudly at the orchestrator; a mismatch is a
            // potential integrity issue, not a routine client error.
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::UserNotFound(_)
        | CheckoutError::CourseNotFound(_)
        | CheckoutError::IntentNotFound(_)
        | CheckoutError::ProgressNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::NotEnrolled { .. } => (StatusCode::FORBIDDEN, err.to_string()),
        CheckoutError::ProviderUnavailable(detail) => {
            tracing::error!(%detail, "payment provider unavailable");
            (
                StatusCode::BAD_GATEWAY,
                "Payment provider is unavailable, please retry".to_string(),
            )
        }
        CheckoutError::Internal(detail) => {
            tracing::error!(%detail, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };
    (status, message, reason_code)
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
