//! The payment provider capability trait.

use async_trait::async_trait;
use common::Money;

use crate::error::GatewayError;
use crate::intent::{CreatedIntent, IntentMetadata, PaymentIntent};

/// Trait for payment provider operations.
///
/// Creation and read-back only: payment completion itself happens on the
/// buyer's client against the provider directly, so there are no
/// mutation methods beyond [`create_intent`](PaymentGateway::create_intent).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a charge intent for the given positive amount, tagged with
    /// the domain binding metadata.
    async fn create_intent(
        &self,
        amount: Money,
        metadata: IntentMetadata,
    ) -> Result<CreatedIntent, GatewayError>;

    /// Reads back the current status and metadata snapshot of an intent.
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;
}
