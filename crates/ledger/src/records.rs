//! Persisted enrollment records.

use chrono::{DateTime, Utc};
use common::{CourseId, LectureId, Money, PaymentId, ProgressId, UserId};
use serde::{Deserialize, Serialize};

/// A confirmed payment, created exactly once per provider intent and
/// immutable afterward.
///
/// The provider intent identity is globally unique across records and
/// serves as the idempotency key for confirmation retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    /// Provider-side intent identity (unique).
    pub intent_id: String,
    /// Amount in minor units as charged by the provider.
    pub amount: Money,
    pub currency: String,
    /// Provider status snapshot at confirmation time.
    pub status: String,
    pub course_id: CourseId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Creates a payment record with a fresh ID and current timestamp.
    pub fn new(
        intent_id: impl Into<String>,
        amount: Money,
        currency: impl Into<String>,
        status: impl Into<String>,
        course_id: CourseId,
        user_id: UserId,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            intent_id: intent_id.into(),
            amount,
            currency: currency.into(),
            status: status.into(),
            course_id,
            user_id,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the snapshot recorded a succeeded payment.
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// Lecture completion tracking for one enrollment.
///
/// Created exactly once per (user, course) pair with an empty lecture
/// list; lectures are appended at most once each, in completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: ProgressId,
    pub course_id: CourseId,
    pub user_id: UserId,
    pub completed_lectures: Vec<LectureId>,
}

impl ProgressRecord {
    /// Creates an empty progress record for a fresh enrollment.
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            id: ProgressId::new(),
            course_id,
            user_id,
            completed_lectures: Vec::new(),
        }
    }

    /// Marks a lecture complete, keeping the list duplicate-free.
    ///
    /// Returns `true` when the lecture was newly recorded.
    pub fn complete(&mut self, lecture_id: LectureId) -> bool {
        if self.completed_lectures.contains(&lecture_id) {
            return false;
        }
        self.completed_lectures.push(lecture_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_record_snapshots_status() {
        let record = PaymentRecord::new(
            "pi_123",
            Money::from_cents(4999),
            "usd",
            "succeeded",
            CourseId::new(),
            UserId::new(),
        );
        assert!(record.is_succeeded());
        assert_eq!(record.amount.cents(), 4999);
    }

    #[test]
    fn progress_starts_empty_and_dedups_lectures() {
        let mut progress = ProgressRecord::new(UserId::new(), CourseId::new());
        assert!(progress.completed_lectures.is_empty());

        let lecture = LectureId::new();
        assert!(progress.complete(lecture));
        assert!(!progress.complete(lecture));
        assert_eq!(progress.completed_lectures.len(), 1);
    }

    #[test]
    fn progress_preserves_completion_order() {
        let mut progress = ProgressRecord::new(UserId::new(), CourseId::new());
        let first = LectureId::new();
        let second = LectureId::new();
        progress.complete(first);
        progress.complete(second);
        assert_eq!(progress.completed_lectures, vec![first, second]);
    }
}
