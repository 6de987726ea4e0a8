//! Gateway mode selection.

use std::sync::Arc;

use crate::provider::PaymentGateway;
use crate::simulated::SimulatedGateway;
use crate::stripe::StripeGateway;

/// Payment provider configuration, read once at startup.
///
/// With no credential configured every gateway call routes through the
/// deterministic simulation; downstream checkout logic is never
/// mode-aware.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub stripe_secret_key: Option<String>,
}

impl GatewayConfig {
    /// Loads the provider credential from `STRIPE_SECRET_KEY`.
    ///
    /// An unset or empty variable selects simulated mode.
    pub fn from_env() -> Self {
        Self {
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
        }
    }

    /// Configuration for the live provider.
    pub fn live(secret_key: impl Into<String>) -> Self {
        Self {
            stripe_secret_key: Some(secret_key.into()),
        }
    }

    /// Configuration for the in-process simulation.
    pub fn simulated() -> Self {
        Self {
            stripe_secret_key: None,
        }
    }

    /// Returns true when a live provider credential is configured.
    pub fn is_live(&self) -> bool {
        self.stripe_secret_key.is_some()
    }

    /// Selects the gateway implementation for this configuration.
    pub fn select(&self) -> Arc<dyn PaymentGateway> {
        match &self.stripe_secret_key {
            Some(key) => {
                tracing::info!("routing payments through the live provider");
                Arc::new(StripeGateway::new(key))
            }
            None => {
                tracing::warn!(
                    "no payment provider credential configured; using the simulated gateway"
                );
                Arc::new(SimulatedGateway::new())
            }
        }
    }
}
