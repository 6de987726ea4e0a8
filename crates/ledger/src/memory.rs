use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CourseId, LectureId, UserId};
use tokio::sync::RwLock;

use crate::error::LedgerError;
use crate::records::{PaymentRecord, ProgressRecord};
use crate::store::EnrollmentStore;
use crate::Result;

#[derive(Debug, Default)]
struct State {
    payments: HashMap<String, PaymentRecord>,
    progress: HashMap<(UserId, CourseId), ProgressRecord>,
}

/// In-memory enrollment store for tests and simulated deployments.
///
/// A single writer lock serializes commits: every uniqueness check runs
/// under the same lock as its write, which stands in for the unique
/// constraints the PostgreSQL implementation enforces.
#[derive(Clone, Default)]
pub struct InMemoryEnrollmentStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryEnrollmentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of payment records stored.
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }

    /// Returns the total number of progress records stored.
    pub async fn progress_count(&self) -> usize {
        self.state.read().await.progress.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.payments.clear();
        state.progress.clear();
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn insert_payment(&self, record: PaymentRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.payments.contains_key(&record.intent_id) {
            return Err(LedgerError::DuplicateIntent {
                intent_id: record.intent_id,
            });
        }
        state.payments.insert(record.intent_id.clone(), record);
        Ok(())
    }

    async fn payment_by_intent(&self, intent_id: &str) -> Result<Option<PaymentRecord>> {
        Ok(self.state.read().await.payments.get(intent_id).cloned())
    }

    async fn succeeded_payments(&self) -> Result<Vec<PaymentRecord>> {
        let state = self.state.read().await;
        let mut payments: Vec<_> = state
            .payments
            .values()
            .filter(|p| p.is_succeeded())
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn insert_progress_if_absent(&self, record: ProgressRecord) -> Result<bool> {
        let mut state = self.state.write().await;
        let key = (record.user_id, record.course_id);
        if state.progress.contains_key(&key) {
            return Ok(false);
        }
        state.progress.insert(key, record);
        Ok(true)
    }

    async fn progress_for(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>> {
        Ok(self
            .state
            .read()
            .await
            .progress
            .get(&(user_id, course_id))
            .cloned())
    }

    async fn complete_lecture(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lecture_id: LectureId,
    ) -> Result<ProgressRecord> {
        let mut state = self.state.write().await;
        let record = state
            .progress
            .get_mut(&(user_id, course_id))
            .ok_or(LedgerError::ProgressNotFound { user_id, course_id })?;
        record.complete(lecture_id);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn payment(intent_id: &str, user_id: UserId, course_id: CourseId) -> PaymentRecord {
        PaymentRecord::new(
            intent_id,
            Money::from_cents(4999),
            "usd",
            "succeeded",
            course_id,
            user_id,
        )
    }

    #[tokio::test]
    async fn test_duplicate_intent_rejected() {
        let store = InMemoryEnrollmentStore::new();
        let user_id = UserId::new();
        let course_id = CourseId::new();

        store
            .insert_payment(payment("pi_1", user_id, course_id))
            .await
            .unwrap();
        let result = store
            .insert_payment(payment("pi_1", user_id, course_id))
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::DuplicateIntent { intent_id }) if intent_id == "pi_1"
        ));
        assert_eq!(store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_intents_for_same_pair_both_persist() {
        let store = InMemoryEnrollmentStore::new();
        let user_id = UserId::new();
        let course_id = CourseId::new();

        store
            .insert_payment(payment("pi_1", user_id, course_id))
            .await
            .unwrap();
        store
            .insert_payment(payment("pi_2", user_id, course_id))
            .await
            .unwrap();

        assert_eq!(store.payment_count().await, 2);
    }

    #[tokio::test]
    async fn test_progress_unique_per_user_course() {
        let store = InMemoryEnrollmentStore::new();
        let user_id = UserId::new();
        let course_id = CourseId::new();

        assert!(store
            .insert_progress_if_absent(ProgressRecord::new(user_id, course_id))
            .await
            .unwrap());
        assert!(!store
            .insert_progress_if_absent(ProgressRecord::new(user_id, course_id))
            .await
            .unwrap());
        assert_eq!(store.progress_count().await, 1);
    }

    #[tokio::test]
    async fn test_complete_lecture_requires_enrollment() {
        let store = InMemoryEnrollmentStore::new();
        let result = store
            .complete_lecture(UserId::new(), CourseId::new(), LectureId::new())
            .await;
        assert!(matches!(result, Err(LedgerError::ProgressNotFound { .. })));
    }

    #[tokio::test]
    async fn test_complete_lecture_is_idempotent() {
        let store = InMemoryEnrollmentStore::new();
        let user_id = UserId::new();
        let course_id = CourseId::new();
        let lecture_id = LectureId::new();

        store
            .insert_progress_if_absent(ProgressRecord::new(user_id, course_id))
            .await
            .unwrap();

        let first = store
            .complete_lecture(user_id, course_id, lecture_id)
            .await
            .unwrap();
        let second = store
            .complete_lecture(user_id, course_id, lecture_id)
            .await
            .unwrap();

        assert_eq!(first.completed_lectures, vec![lecture_id]);
        assert_eq!(second.completed_lectures, vec![lecture_id]);
    }

    #[tokio::test]
    async fn test_succeeded_payments_filters_status() {
        let store = InMemoryEnrollmentStore::new();
        let user_id = UserId::new();
        let course_id = CourseId::new();

        store
            .insert_payment(payment("pi_1", user_id, course_id))
            .await
            .unwrap();
        let mut canceled = payment("pi_2", user_id, course_id);
        canceled.status = "canceled".to_string();
        store.insert_payment(canceled).await.unwrap();

        let succeeded = store.succeeded_payments().await.unwrap();
        assert_eq!(succeeded.len(), 1);
        assert_eq!(succeeded[0].intent_id, "pi_1");
    }
}
