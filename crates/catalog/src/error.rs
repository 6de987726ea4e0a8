//! Boundary collaborator error types.

use common::UserId;
use thiserror::Error;

/// Errors surfaced by the catalog and user store boundaries.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The referenced user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
