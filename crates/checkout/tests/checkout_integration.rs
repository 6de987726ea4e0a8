//! Integration tests for the full checkout flow.

use std::sync::Arc;

use async_trait::async_trait;
use catalog::{Course, InMemoryCatalog, InMemoryUserStore, User};
use checkout::{CheckoutError, CheckoutOrchestrator, ConfirmOutcome};
use common::{CourseId, Money, UserId};
use gateway::{
    CreatedIntent, GatewayError, IntentMetadata, IntentStatus, PaymentGateway, PaymentIntent,
    SimulatedGateway,
};
use ledger::{EnrollmentStore, InMemoryEnrollmentStore, Reconciler};
use rust_decimal_macros::dec;

type TestOrchestrator =
    CheckoutOrchestrator<InMemoryEnrollmentStore, InMemoryCatalog, InMemoryUserStore>;

struct TestRig {
    orchestrator: Arc<TestOrchestrator>,
    users: InMemoryUserStore,
    store: InMemoryEnrollmentStore,
    user_id: UserId,
    course_id: CourseId,
}

fn setup_with_gateway(gateway: Arc<dyn PaymentGateway>) -> TestRig {
    let catalog = InMemoryCatalog::new();
    let users = InMemoryUserStore::new();
    let store = InMemoryEnrollmentStore::new();

    let course_id = catalog.add_course(Course::new("Intro to Rust", dec!(49.99), "instructor-1"));
    let user_id = users.add_user(User::new("learner@example.com"));

    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        gateway,
        catalog,
        users.clone(),
        store.clone(),
    ));

    TestRig {
        orchestrator,
        users,
        store,
        user_id,
        course_id,
    }
}

fn setup() -> TestRig {
    setup_with_gateway(Arc::new(SimulatedGateway::new()))
}

/// Gateway stub that reports a fixed status on retrieval, for the
/// states the simulation never produces.
struct FixedStatusGateway {
    inner: SimulatedGateway,
    status: IntentStatus,
}

#[async_trait]
impl PaymentGateway for FixedStatusGateway {
    async fn create_intent(
        &self,
        amount: Money,
        metadata: IntentMetadata,
    ) -> Result<CreatedIntent, GatewayError> {
        self.inner.create_intent(amount, metadata).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        let intent = self.inner.retrieve_intent(intent_id).await?;
        Ok(PaymentIntent {
            status: self.status,
            ..intent
        })
    }
}

#[tokio::test]
async fn test_unfinished_payment_cannot_confirm() {
    let rig = setup_with_gateway(Arc::new(FixedStatusGateway {
        inner: SimulatedGateway::new(),
        status: IntentStatus::RequiresPaymentMethod,
    }));

    let session = rig
        .orchestrator
        .start_checkout(rig.user_id, rig.course_id)
        .await
        .unwrap();

    let result = rig
        .orchestrator
        .confirm_checkout(rig.user_id, rig.course_id, &session.intent_id)
        .await;

    assert!(matches!(
        result,
        Err(CheckoutError::PaymentNotSucceeded {
            status: IntentStatus::RequiresPaymentMethod
        })
    ));
    assert_eq!(rig.store.payment_count().await, 0);
    assert_eq!(rig.users.subscription_count(rig.user_id), 0);
}

#[tokio::test]
async fn test_canceled_payment_cannot_confirm() {
    let rig = setup_with_gateway(Arc::new(FixedStatusGateway {
        inner: SimulatedGateway::new(),
        status: IntentStatus::Canceled,
    }));

    let session = rig
        .orchestrator
        .start_checkout(rig.user_id, rig.course_id)
        .await
        .unwrap();

    let result = rig
        .orchestrator
        .confirm_checkout(rig.user_id, rig.course_id, &session.intent_id)
        .await;
    assert!(matches!(
        result,
        Err(CheckoutError::PaymentNotSucceeded { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_confirms_of_distinct_intents_enroll_once() {
    let rig = setup();

    // Two near-simultaneous starts leave two live intents for the same
    // (user, course) pair.
    let first = rig
        .orchestrator
        .start_checkout(rig.user_id, rig.course_id)
        .await
        .unwrap();
    let second = rig
        .orchestrator
        .start_checkout(rig.user_id, rig.course_id)
        .await
        .unwrap();
    assert_ne!(first.intent_id, second.intent_id);

    let a = {
        let orchestrator = rig.orchestrator.clone();
        let (user_id, course_id) = (rig.user_id, rig.course_id);
        let intent_id = first.intent_id.clone();
        tokio::spawn(
            async move { orchestrator.confirm_checkout(user_id, course_id, &intent_id).await },
        )
    };
    let b = {
        let orchestrator = rig.orchestrator.clone();
        let (user_id, course_id) = (rig.user_id, rig.course_id);
        let intent_id = second.intent_id.clone();
        tokio::spawn(
            async move { orchestrator.confirm_checkout(user_id, course_id, &intent_id).await },
        )
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // One purchase recorded twice is acceptable; double enrollment
    // state is not.
    assert_eq!(rig.store.payment_count().await, 2);
    assert_eq!(rig.store.progress_count().await, 1);
    assert_eq!(rig.users.subscription_count(rig.user_id), 1);
}

#[tokio::test]
async fn test_partial_commit_is_repaired_by_reconciliation() {
    let rig = setup();

    let session = rig
        .orchestrator
        .start_checkout(rig.user_id, rig.course_id)
        .await
        .unwrap();

    // The user store dies between the payment insert and the grant.
    rig.users.set_fail_on_append(true);
    let result = rig
        .orchestrator
        .confirm_checkout(rig.user_id, rig.course_id, &session.intent_id)
        .await;
    assert!(result.is_err());
    assert_eq!(rig.store.payment_count().await, 1);
    assert_eq!(rig.users.subscription_count(rig.user_id), 0);

    // The reconciliation pass detects the payment without its grant and
    // repairs both missing writes.
    rig.users.set_fail_on_append(false);
    let report = Reconciler::new(rig.store.clone(), rig.users.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.subscriptions_repaired, 1);
    assert_eq!(report.progress_repaired, 1);
    assert_eq!(rig.users.subscription_count(rig.user_id), 1);
    assert!(rig
        .store
        .progress_for(rig.user_id, rig.course_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_duplicate_confirm_after_partial_commit_self_heals() {
    let rig = setup();

    let session = rig
        .orchestrator
        .start_checkout(rig.user_id, rig.course_id)
        .await
        .unwrap();

    rig.users.set_fail_on_append(true);
    let _ = rig
        .orchestrator
        .confirm_checkout(rig.user_id, rig.course_id, &session.intent_id)
        .await;
    rig.users.set_fail_on_append(false);

    // Retrying the confirmation itself also heals the gap.
    let outcome = rig
        .orchestrator
        .confirm_checkout(rig.user_id, rig.course_id, &session.intent_id)
        .await
        .unwrap();

    assert_eq!(outcome, ConfirmOutcome::AlreadyEnrolled);
    assert_eq!(rig.store.payment_count().await, 1);
    assert_eq!(rig.users.subscription_count(rig.user_id), 1);
    assert_eq!(rig.store.progress_count().await, 1);
}

#[tokio::test]
async fn test_eligibility_closes_after_enrollment() {
    let rig = setup();

    let session = rig
        .orchestrator
        .start_checkout(rig.user_id, rig.course_id)
        .await
        .unwrap();
    rig.orchestrator
        .confirm_checkout(rig.user_id, rig.course_id, &session.intent_id)
        .await
        .unwrap();

    // A second checkout for the now-owned course is rejected up front.
    let result = rig
        .orchestrator
        .start_checkout(rig.user_id, rig.course_id)
        .await;
    assert!(matches!(result, Err(CheckoutError::Ineligible(_))));
}
