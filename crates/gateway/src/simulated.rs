//! Deterministic in-process payment simulation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use common::Money;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::intent::{CreatedIntent, IntentMetadata, IntentStatus, PaymentIntent};
use crate::provider::PaymentGateway;

/// In-process payment gateway used when no live provider credential is
/// configured.
///
/// Fabricated intent IDs are prefixed and time-based with an atomic
/// sequence number for local uniqueness. Retrieval always reports
/// `succeeded` and echoes back exactly the metadata supplied at
/// creation, so downstream logic sees the same shapes as the live path.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    intents: Arc<RwLock<HashMap<String, PaymentIntent>>>,
    seq: Arc<AtomicU64>,
}

impl SimulatedGateway {
    /// Creates a new simulated gateway with no issued intents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of intents issued so far.
    pub fn intent_count(&self) -> usize {
        self.intents.read().unwrap().len()
    }

    fn next_intent_id(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("pi_sim_{}_{:04}", Utc::now().timestamp_millis(), seq)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn create_intent(
        &self,
        amount: Money,
        metadata: IntentMetadata,
    ) -> Result<CreatedIntent, GatewayError> {
        let intent_id = self.next_intent_id();
        let client_secret = format!("{intent_id}_secret_{}", Uuid::new_v4().simple());

        tracing::debug!(%intent_id, amount = amount.cents(), "issuing simulated payment intent");

        self.intents.write().unwrap().insert(
            intent_id.clone(),
            PaymentIntent {
                id: intent_id.clone(),
                amount,
                currency: "usd".to_string(),
                status: IntentStatus::RequiresPaymentMethod,
                metadata: Some(metadata),
            },
        );

        Ok(CreatedIntent {
            intent_id,
            client_secret,
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let intents = self.intents.read().unwrap();
        let stored = intents
            .get(intent_id)
            .ok_or_else(|| GatewayError::IntentNotFound(intent_id.to_string()))?;

        // The simulated buyer always completes payment.
        Ok(PaymentIntent {
            status: IntentStatus::Succeeded,
            ..stored.clone()
        })
    }
}
