//! Checkout orchestration.
//!
//! Drives the purchase flow end to end: eligibility validation, intent
//! creation against the payment gateway, confirmation with the metadata
//! binding check, and the idempotent enrollment commit through the
//! ledger. The orchestrator never branches on gateway mode; live and
//! simulated providers are interchangeable behind the trait.

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::{CheckoutError, IneligibleReason};
pub use orchestrator::{
    CheckoutOrchestrator, CheckoutSession, ConfirmOutcome, CourseSummary, PaymentStatusView,
};
pub use state::CheckoutState;
