//! Checkout attempt states.

use serde::{Deserialize, Serialize};

/// Lifecycle of one checkout attempt.
///
/// The happy path runs `Initiated → IntentCreated → Confirmed →
/// Enrolled`; `Rejected` and `Failed` are terminal error states
/// (ineligible input and upstream/commit failure respectively). No
/// state is persisted between the two client calls; the provider
/// intent carries the attempt across the external payment gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Initiated,
    IntentCreated,
    Confirmed,
    Enrolled,
    Rejected,
    Failed,
}

impl CheckoutState {
    /// Returns the wire representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Initiated => "initiated",
            CheckoutState::IntentCreated => "intent_created",
            CheckoutState::Confirmed => "confirmed",
            CheckoutState::Enrolled => "enrolled",
            CheckoutState::Rejected => "rejected",
            CheckoutState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
