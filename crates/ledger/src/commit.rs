//! The three-step enrollment commit.

use catalog::UserStore;
use common::{CourseId, Money, UserId};

use crate::error::LedgerError;
use crate::records::{PaymentRecord, ProgressRecord};
use crate::store::EnrollmentStore;
use crate::Result;

/// Input for one enrollment commit.
#[derive(Debug, Clone)]
pub struct EnrollmentRequest {
    pub user_id: UserId,
    pub course_id: CourseId,
    /// Provider intent identity, the idempotency key.
    pub intent_id: String,
    /// Amount in minor units as charged.
    pub amount: Money,
    pub currency: String,
    /// Provider status snapshot at confirmation time.
    pub status: String,
}

/// Result of an enrollment commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// All three records were written by this call.
    Committed,
    /// A payment record already existed for the intent; the grant was
    /// already achieved by a prior attempt. `repaired` is set when this
    /// call had to re-apply a missing subscription or progress write.
    AlreadyCommitted { repaired: bool },
}

/// Commits enrollments against a storage backend and the user store.
///
/// The payment insert goes first and is the write-ahead marker: its
/// unique intent key is the authoritative idempotency guard. The
/// subscription and progress writes are guarded by "only if absent" and
/// can therefore be re-applied safely, both on a duplicate confirmation
/// and by the reconciliation pass.
#[derive(Clone)]
pub struct EnrollmentLedger<S, U> {
    store: S,
    users: U,
}

impl<S, U> EnrollmentLedger<S, U>
where
    S: EnrollmentStore,
    U: UserStore,
{
    /// Creates a ledger over the given backends.
    pub fn new(store: S, users: U) -> Self {
        Self { store, users }
    }

    /// Returns a reference to the storage backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Commits an enrollment as one logical unit.
    ///
    /// A duplicate intent identity is a benign outcome, not an error:
    /// the other two writes are re-applied idempotently so a partial
    /// prior commit heals on retry.
    #[tracing::instrument(skip(self, req), fields(user_id = %req.user_id, course_id = %req.course_id, intent_id = %req.intent_id))]
    pub async fn commit_enrollment(&self, req: EnrollmentRequest) -> Result<EnrollmentOutcome> {
        let record = PaymentRecord::new(
            req.intent_id.clone(),
            req.amount,
            req.currency.clone(),
            req.status.clone(),
            req.course_id,
            req.user_id,
        );

        match self.store.insert_payment(record).await {
            Ok(()) => {
                self.users
                    .append_subscription(req.user_id, req.course_id)
                    .await?;
                self.store
                    .insert_progress_if_absent(ProgressRecord::new(req.user_id, req.course_id))
                    .await?;

                metrics::counter!("checkout_enrollments_total").increment(1);
                tracing::info!("enrollment committed");
                Ok(EnrollmentOutcome::Committed)
            }
            Err(LedgerError::DuplicateIntent { intent_id }) => {
                let repaired = self.ensure_granted(req.user_id, req.course_id).await?;
                if repaired {
                    metrics::counter!("enrollment_repairs_total").increment(1);
                    tracing::warn!(%intent_id, "repaired partial enrollment on duplicate confirmation");
                } else {
                    tracing::info!(%intent_id, "duplicate confirmation, enrollment already complete");
                }
                metrics::counter!("checkout_duplicate_confirms_total").increment(1);
                Ok(EnrollmentOutcome::AlreadyCommitted { repaired })
            }
            Err(e) => Err(e),
        }
    }

    /// Re-applies the subscription and progress writes for an existing
    /// payment. Returns `true` when either side was missing.
    pub(crate) async fn ensure_granted(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool> {
        let appended = self.users.append_subscription(user_id, course_id).await?;
        let created = self
            .store
            .insert_progress_if_absent(ProgressRecord::new(user_id, course_id))
            .await?;
        Ok(appended || created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{InMemoryUserStore, User};
    use crate::memory::InMemoryEnrollmentStore;

    fn request(user_id: UserId, course_id: CourseId, intent_id: &str) -> EnrollmentRequest {
        EnrollmentRequest {
            user_id,
            course_id,
            intent_id: intent_id.to_string(),
            amount: Money::from_cents(4999),
            currency: "usd".to_string(),
            status: "succeeded".to_string(),
        }
    }

    fn setup() -> (
        EnrollmentLedger<InMemoryEnrollmentStore, InMemoryUserStore>,
        InMemoryEnrollmentStore,
        InMemoryUserStore,
        UserId,
    ) {
        let store = InMemoryEnrollmentStore::new();
        let users = InMemoryUserStore::new();
        let user_id = users.add_user(User::new("learner@example.com"));
        let ledger = EnrollmentLedger::new(store.clone(), users.clone());
        (ledger, store, users, user_id)
    }

    #[tokio::test]
    async fn test_commit_writes_all_three_records() {
        let (ledger, store, users, user_id) = setup();
        let course_id = CourseId::new();

        let outcome = ledger
            .commit_enrollment(request(user_id, course_id, "pi_1"))
            .await
            .unwrap();

        assert_eq!(outcome, EnrollmentOutcome::Committed);
        assert!(store.payment_by_intent("pi_1").await.unwrap().is_some());
        assert_eq!(users.subscription_count(user_id), 1);
        let progress = store.progress_for(user_id, course_id).await.unwrap().unwrap();
        assert!(progress.completed_lectures.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_commit_is_benign() {
        let (ledger, store, users, user_id) = setup();
        let course_id = CourseId::new();

        ledger
            .commit_enrollment(request(user_id, course_id, "pi_1"))
            .await
            .unwrap();
        let outcome = ledger
            .commit_enrollment(request(user_id, course_id, "pi_1"))
            .await
            .unwrap();

        assert_eq!(outcome, EnrollmentOutcome::AlreadyCommitted { repaired: false });
        assert_eq!(store.payment_count().await, 1);
        assert_eq!(store.progress_count().await, 1);
        assert_eq!(users.subscription_count(user_id), 1);
    }

    #[tokio::test]
    async fn test_duplicate_commit_repairs_partial_grant() {
        let (ledger, store, users, user_id) = setup();
        let course_id = CourseId::new();

        // First attempt dies between the payment insert and the
        // subscription append.
        users.set_fail_on_append(true);
        let result = ledger
            .commit_enrollment(request(user_id, course_id, "pi_1"))
            .await;
        assert!(result.is_err());
        assert_eq!(store.payment_count().await, 1);
        assert_eq!(users.subscription_count(user_id), 0);

        // The retry with the same intent heals the missing writes.
        users.set_fail_on_append(false);
        let outcome = ledger
            .commit_enrollment(request(user_id, course_id, "pi_1"))
            .await
            .unwrap();

        assert_eq!(outcome, EnrollmentOutcome::AlreadyCommitted { repaired: true });
        assert_eq!(users.subscription_count(user_id), 1);
        assert!(store.progress_for(user_id, course_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_commits_for_distinct_intents_grant_once() {
        let (ledger, store, users, user_id) = setup();
        let course_id = CourseId::new();
        let ledger = std::sync::Arc::new(ledger);

        let a = {
            let ledger = ledger.clone();
            let req = request(user_id, course_id, "pi_1");
            tokio::spawn(async move { ledger.commit_enrollment(req).await })
        };
        let b = {
            let ledger = ledger.clone();
            let req = request(user_id, course_id, "pi_2");
            tokio::spawn(async move { ledger.commit_enrollment(req).await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Both purchase events persist, but the enrollment state is single.
        assert_eq!(store.payment_count().await, 2);
        assert_eq!(store.progress_count().await, 1);
        assert_eq!(users.subscription_count(user_id), 1);
    }

    #[tokio::test]
    async fn test_commit_for_unknown_user_fails() {
        let store = InMemoryEnrollmentStore::new();
        let users = InMemoryUserStore::new();
        let ledger = EnrollmentLedger::new(store, users);

        let result = ledger
            .commit_enrollment(request(UserId::new(), CourseId::new(), "pi_1"))
            .await;
        assert!(matches!(result, Err(LedgerError::UserStore(_))));
    }
}
