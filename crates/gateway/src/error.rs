//! Gateway error types.

use thiserror::Error;

/// Errors surfaced by the payment provider boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The external provider call errored; the caller must not assume
    /// partial success and may retry checkout from scratch.
    #[error("Payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider has no record of the referenced intent.
    #[error("Payment intent not found: {0}")]
    IntentNotFound(String),
}
