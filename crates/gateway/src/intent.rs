//! Provider-side payment intent types.

use std::collections::HashMap;

use common::{CourseId, Money, UserId};
use serde::{Deserialize, Serialize};

const METADATA_USER_ID: &str = "user_id";
const METADATA_COURSE_ID: &str = "course_id";
const METADATA_COURSE_NAME: &str = "course_name";

/// Lifecycle status of a provider-side payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    Succeeded,
    Failed,
    Canceled,
}

impl IntentStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Failed => "failed",
            IntentStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain binding stamped into an intent at creation time and never
/// mutated afterward.
///
/// This metadata is the sole link between a provider-side transaction
/// and the user/course pair it authorizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMetadata {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub course_name: String,
}

impl IntentMetadata {
    /// Creates the binding for a checkout attempt.
    pub fn new(user_id: UserId, course_id: CourseId, course_name: impl Into<String>) -> Self {
        Self {
            user_id,
            course_id,
            course_name: course_name.into(),
        }
    }

    /// Renders the binding as the provider's string-to-string metadata map.
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            (METADATA_USER_ID.to_string(), self.user_id.to_string()),
            (METADATA_COURSE_ID.to_string(), self.course_id.to_string()),
            (METADATA_COURSE_NAME.to_string(), self.course_name.clone()),
        ])
    }

    /// Parses the binding back out of a provider metadata map.
    ///
    /// Returns `None` when the identifying keys are missing or garbled;
    /// callers must treat that as a binding failure, not a pass.
    pub fn from_map(map: &HashMap<String, String>) -> Option<Self> {
        let user_id = map.get(METADATA_USER_ID)?.parse().ok().map(UserId::from_uuid)?;
        let course_id = map
            .get(METADATA_COURSE_ID)?
            .parse()
            .ok()
            .map(CourseId::from_uuid)?;
        let course_name = map.get(METADATA_COURSE_NAME).cloned().unwrap_or_default();
        Some(Self {
            user_id,
            course_id,
            course_name,
        })
    }

    /// Returns true if the binding matches the caller-asserted identities.
    pub fn binds(&self, user_id: UserId, course_id: CourseId) -> bool {
        self.user_id == user_id && self.course_id == course_id
    }
}

/// Handle returned from intent creation.
///
/// The client secret is what the buyer's client needs to complete the
/// payment against the provider directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// Snapshot of a provider-side intent as read back from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider identity of the intent.
    pub id: String,
    /// Charged amount in minor units.
    pub amount: Money,
    /// ISO currency code, lowercase.
    pub currency: String,
    /// Current lifecycle status.
    pub status: IntentStatus,
    /// Domain binding, `None` when the provider record carries no usable
    /// metadata.
    pub metadata: Option<IntentMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_map_roundtrip() {
        let metadata = IntentMetadata::new(UserId::new(), CourseId::new(), "Intro to Rust");
        let parsed = IntentMetadata::from_map(&metadata.to_map()).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn metadata_missing_keys_is_none() {
        let mut map = IntentMetadata::new(UserId::new(), CourseId::new(), "x").to_map();
        map.remove("course_id");
        assert!(IntentMetadata::from_map(&map).is_none());
    }

    #[test]
    fn metadata_garbled_uuid_is_none() {
        let mut map = IntentMetadata::new(UserId::new(), CourseId::new(), "x").to_map();
        map.insert("user_id".to_string(), "not-a-uuid".to_string());
        assert!(IntentMetadata::from_map(&map).is_none());
    }

    #[test]
    fn binds_requires_both_identities() {
        let user_id = UserId::new();
        let course_id = CourseId::new();
        let metadata = IntentMetadata::new(user_id, course_id, "x");

        assert!(metadata.binds(user_id, course_id));
        assert!(!metadata.binds(UserId::new(), course_id));
        assert!(!metadata.binds(user_id, CourseId::new()));
    }

    #[test]
    fn status_uses_provider_wire_names() {
        assert_eq!(IntentStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(
            IntentStatus::RequiresPaymentMethod.to_string(),
            "requires_payment_method"
        );
        assert_eq!(
            serde_json::to_string(&IntentStatus::Canceled).unwrap(),
            "\"canceled\""
        );
    }
}
