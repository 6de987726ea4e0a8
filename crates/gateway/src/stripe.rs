//! Live payment gateway backed by Stripe payment intents.

use async_trait::async_trait;
use common::Money;
use stripe::{
    Client, CreatePaymentIntent, Currency, PaymentIntent as StripePaymentIntent,
    PaymentIntentId, PaymentIntentStatus, StripeError,
};

use crate::error::GatewayError;
use crate::intent::{CreatedIntent, IntentMetadata, IntentStatus, PaymentIntent};
use crate::provider::PaymentGateway;

/// Stripe-backed payment gateway.
pub struct StripeGateway {
    client: Client,
}

impl StripeGateway {
    /// Creates a gateway from a provider secret key.
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount: Money,
        metadata: IntentMetadata,
    ) -> Result<CreatedIntent, GatewayError> {
        let description = format!("Course purchase: {}", metadata.course_name);

        let mut params = CreatePaymentIntent::new(amount.cents(), Currency::USD);
        params.metadata = Some(metadata.to_map());
        params.description = Some(&description);

        let intent = StripePaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| provider_unavailable("payment intent creation failed", &e))?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            GatewayError::ProviderUnavailable("provider returned no client secret".to_string())
        })?;

        Ok(CreatedIntent {
            intent_id: intent.id.to_string(),
            client_secret,
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let id: PaymentIntentId = intent_id
            .parse()
            .map_err(|_| GatewayError::IntentNotFound(intent_id.to_string()))?;

        let intent = StripePaymentIntent::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| retrieve_error(intent_id, &e))?;

        Ok(PaymentIntent {
            id: intent.id.to_string(),
            amount: Money::from_cents(intent.amount),
            currency: intent.currency.to_string(),
            status: map_status(intent.status),
            metadata: IntentMetadata::from_map(&intent.metadata),
        })
    }
}

/// Maps the provider's intent status onto the five-status contract.
///
/// In-flight provider states (processing, requires_action,
/// requires_capture) collapse to `requires_confirmation`: the payment is
/// underway but must not be treated as a success.
fn map_status(status: PaymentIntentStatus) -> IntentStatus {
    match status {
        PaymentIntentStatus::Succeeded => IntentStatus::Succeeded,
        PaymentIntentStatus::Canceled => IntentStatus::Canceled,
        PaymentIntentStatus::RequiresPaymentMethod => IntentStatus::RequiresPaymentMethod,
        PaymentIntentStatus::RequiresConfirmation
        | PaymentIntentStatus::RequiresAction
        | PaymentIntentStatus::RequiresCapture
        | PaymentIntentStatus::Processing => IntentStatus::RequiresConfirmation,
    }
}

fn provider_unavailable(context: &str, err: &StripeError) -> GatewayError {
    tracing::error!(error = %err, "{context}");
    GatewayError::ProviderUnavailable(context.to_string())
}

fn retrieve_error(intent_id: &str, err: &StripeError) -> GatewayError {
    if let StripeError::Stripe(request_err) = err
        && request_err.http_status == 404
    {
        return GatewayError::IntentNotFound(intent_id.to_string());
    }
    provider_unavailable("payment intent retrieval failed", err)
}
