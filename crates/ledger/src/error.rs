//! Ledger error types.

use catalog::CatalogError;
use common::{CourseId, UserId};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A payment record already exists for this intent identity.
    ///
    /// This is the authoritative idempotency guard: callers treat it as
    /// a benign duplicate, not a fatal error.
    #[error("Payment already recorded for intent {intent_id}")]
    DuplicateIntent { intent_id: String },

    /// No progress record exists for the (user, course) pair.
    #[error("No progress record for user {user_id} on course {course_id}")]
    ProgressNotFound {
        user_id: UserId,
        course_id: CourseId,
    },

    /// User store error.
    #[error("User store error: {0}")]
    UserStore(#[from] CatalogError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
