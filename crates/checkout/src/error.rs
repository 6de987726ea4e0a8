//! Checkout error taxonomy.
//!
//! Every error carries a stable reason code for the API layer; provider
//! detail stays in logs and is never surfaced verbatim to clients.

use catalog::CatalogError;
use common::{CourseId, UserId};
use gateway::{GatewayError, IntentStatus};
use ledger::LedgerError;
use thiserror::Error;

/// Why a checkout attempt was not eligible to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    /// The course is already in the user's subscription set.
    AlreadyOwned,
    /// The course price is not a positive amount.
    InvalidPrice,
}

impl IneligibleReason {
    /// Returns the stable reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            IneligibleReason::AlreadyOwned => "already-owned",
            IneligibleReason::InvalidPrice => "invalid-price",
        }
    }
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The checkout attempt failed eligibility validation.
    #[error("Checkout not eligible: {0}")]
    Ineligible(IneligibleReason),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Course not found.
    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    /// The provider has no record of the referenced intent.
    #[error("Payment intent not found: {0}")]
    IntentNotFound(String),

    /// No progress record exists for the enrollment.
    #[error("No progress record for user {user_id} on course {course_id}")]
    ProgressNotFound {
        user_id: UserId,
        course_id: CourseId,
    },

    /// The user does not own the course.
    #[error("User {user_id} is not enrolled in course {course_id}")]
    NotEnrolled {
        user_id: UserId,
        course_id: CourseId,
    },

    /// The payment provider call errored; safe to retry checkout from
    /// scratch.
    #[error("Payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The intent exists but the payment has not completed.
    #[error("Payment has not succeeded (status: {status})")]
    PaymentNotSucceeded { status: IntentStatus },

    /// The intent's metadata does not bind it to the caller-asserted
    /// user and course. Treated as a potential integrity issue.
    #[error("Payment intent {intent_id} does not match this checkout")]
    IntentMismatch { intent_id: String },

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Returns the stable, client-visible reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            CheckoutError::Ineligible(reason) => reason.as_str(),
            CheckoutError::UserNotFound(_)
            | CheckoutError::CourseNotFound(_)
            | CheckoutError::IntentNotFound(_)
            | CheckoutError::ProgressNotFound { .. } => "not-found",
            CheckoutError::NotEnrolled { .. } => "not-enrolled",
            CheckoutError::ProviderUnavailable(_) => "provider-unavailable",
            CheckoutError::PaymentNotSucceeded { .. } => "payment-not-succeeded",
            CheckoutError::IntentMismatch { .. } => "intent-mismatch",
            CheckoutError::Internal(_) => "internal",
        }
    }
}

impl From<GatewayError> for CheckoutError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::ProviderUnavailable(msg) => CheckoutError::ProviderUnavailable(msg),
            GatewayError::IntentNotFound(id) => CheckoutError::IntentNotFound(id),
        }
    }
}

impl From<CatalogError> for CheckoutError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::UserNotFound(id) => CheckoutError::UserNotFound(id),
            other => CheckoutError::Internal(other.to_string()),
        }
    }
}

impl From<LedgerError> for CheckoutError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UserStore(catalog_err) => catalog_err.into(),
            LedgerError::ProgressNotFound { user_id, course_id } => {
                CheckoutError::ProgressNotFound { user_id, course_id }
            }
            other => CheckoutError::Internal(other.to_string()),
        }
    }
}
