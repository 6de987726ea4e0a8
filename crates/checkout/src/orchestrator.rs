//! The checkout orchestrator.

use std::sync::Arc;

use catalog::{Catalog, UserStore};
use common::{CourseId, LectureId, Money, UserId};
use gateway::{IntentMetadata, IntentStatus, PaymentGateway};
use ledger::{
    EnrollmentLedger, EnrollmentOutcome, EnrollmentRequest, EnrollmentStore, ProgressRecord,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{CheckoutError, IneligibleReason};
use crate::state::CheckoutState;

/// Course fields echoed back to the buyer when checkout starts.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub price: Decimal,
}

/// Result of starting a checkout: everything the buyer's client needs
/// to complete payment against the provider.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub intent_id: String,
    pub client_secret: String,
    pub state: CheckoutState,
    pub course: CourseSummary,
}

/// Result of a confirmation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// This call committed the enrollment.
    Enrolled,
    /// A prior confirmation already committed it; this retry is benign.
    AlreadyEnrolled,
}

impl ConfirmOutcome {
    /// Terminal state of the attempt. A duplicate confirm still lands
    /// on `Enrolled`; the caller sees success either way.
    pub fn state(&self) -> CheckoutState {
        CheckoutState::Enrolled
    }

    /// Human-readable outcome message.
    pub fn message(&self) -> &'static str {
        match self {
            ConfirmOutcome::Enrolled => "Payment confirmed and course purchased successfully",
            ConfirmOutcome::AlreadyEnrolled => "Payment was already processed; course is yours",
        }
    }
}

/// Read-only view of a provider intent for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusView {
    pub status: IntentStatus,
    /// Amount in major units.
    pub amount: Decimal,
    pub currency: String,
}

/// Orchestrates the purchase-and-enrollment flow.
///
/// Serves concurrent checkout attempts with no shared mutable state
/// beyond the persisted records: nothing is held across the external
/// payment round trip between [`start_checkout`](Self::start_checkout)
/// and [`confirm_checkout`](Self::confirm_checkout).
pub struct CheckoutOrchestrator<S, C, U>
where
    S: EnrollmentStore,
    C: Catalog,
    U: UserStore,
{
    gateway: Arc<dyn PaymentGateway>,
    catalog: C,
    users: U,
    ledger: EnrollmentLedger<S, U>,
}

impl<S, C, U> CheckoutOrchestrator<S, C, U>
where
    S: EnrollmentStore,
    C: Catalog,
    U: UserStore + Clone,
{
    /// Creates a new orchestrator over the given collaborators.
    pub fn new(gateway: Arc<dyn PaymentGateway>, catalog: C, users: U, store: S) -> Self {
        let ledger = EnrollmentLedger::new(store, users.clone());
        Self {
            gateway,
            catalog,
            users,
            ledger,
        }
    }

    /// Returns a reference to the underlying ledger.
    pub fn ledger(&self) -> &EnrollmentLedger<S, U> {
        &self.ledger
    }

    /// Starts a checkout attempt.
    ///
    /// Validates eligibility, converts the course price to minor units
    /// and asks the gateway for an intent bound to this (user, course)
    /// pair. Nothing is persisted: a retried start re-runs eligibility
    /// and mints a fresh intent.
    #[tracing::instrument(skip(self))]
    pub async fn start_checkout(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CheckoutSession, CheckoutError> {
        metrics::counter!("checkout_started_total").increment(1);

        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(CheckoutError::UserNotFound(user_id))?;
        let course = self
            .catalog
            .get_course(course_id)
            .await?
            .ok_or(CheckoutError::CourseNotFound(course_id))?;

        if course.price <= Decimal::ZERO {
            return Err(CheckoutError::Ineligible(IneligibleReason::InvalidPrice));
        }
        // Point-in-time check; the ledger's storage guards close the
        // race this leaves open across the payment round trip.
        if user.owns(course_id) {
            return Err(CheckoutError::Ineligible(IneligibleReason::AlreadyOwned));
        }

        let amount = Money::from_decimal(course.price)
            .filter(Money::is_positive)
            .ok_or(CheckoutError::Ineligible(IneligibleReason::InvalidPrice))?;

        let created = self
            .gateway
            .create_intent(
                amount,
                IntentMetadata::new(user_id, course_id, course.title.clone()),
            )
            .await?;

        tracing::info!(
            intent_id = %created.intent_id,
            amount_cents = amount.cents(),
            "checkout intent created"
        );

        Ok(CheckoutSession {
            intent_id: created.intent_id,
            client_secret: created.client_secret,
            state: CheckoutState::IntentCreated,
            course: CourseSummary {
                id: course.id,
                title: course.title,
                price: course.price,
            },
        })
    }

    /// Confirms a checkout after the buyer completed payment.
    ///
    /// Reads the intent back from the gateway, gates on status and on
    /// the metadata binding, then commits the enrollment through the
    /// ledger. A duplicate confirmation for an already-recorded intent
    /// is a benign success, never a duplicate grant.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_checkout(
        &self,
        user_id: UserId,
        course_id: CourseId,
        intent_id: &str,
    ) -> Result<ConfirmOutcome, CheckoutError> {
        let confirm_start = std::time::Instant::now();

        let intent = self.gateway.retrieve_intent(intent_id).await?;

        if intent.status != IntentStatus::Succeeded {
            metrics::counter!("checkout_failures_total").increment(1);
            return Err(CheckoutError::PaymentNotSucceeded {
                status: intent.status,
            });
        }

        // The metadata stamped at creation is the only binding between
        // the provider transaction and the grant it authorizes. Absent
        // or mismatched metadata means this confirmation is asserting
        // someone else's payment.
        let bound = intent
            .metadata
            .as_ref()
            .is_some_and(|m| m.binds(user_id, course_id));
        if !bound {
            metrics::counter!("checkout_failures_total").increment(1);
            tracing::error!(
                intent_id = %intent.id,
                %user_id,
                %course_id,
                "intent metadata does not match caller-asserted identities; possible replay"
            );
            return Err(CheckoutError::IntentMismatch {
                intent_id: intent.id,
            });
        }

        let outcome = self
            .ledger
            .commit_enrollment(EnrollmentRequest {
                user_id,
                course_id,
                intent_id: intent.id,
                amount: intent.amount,
                currency: intent.currency,
                status: intent.status.to_string(),
            })
            .await?;

        metrics::histogram!("checkout_confirm_duration_seconds")
            .record(confirm_start.elapsed().as_secs_f64());

        Ok(match outcome {
            EnrollmentOutcome::Committed => ConfirmOutcome::Enrolled,
            EnrollmentOutcome::AlreadyCommitted { .. } => ConfirmOutcome::AlreadyEnrolled,
        })
    }

    /// Read-only passthrough of a provider intent's status.
    #[tracing::instrument(skip(self))]
    pub async fn payment_status(
        &self,
        intent_id: &str,
    ) -> Result<PaymentStatusView, CheckoutError> {
        let intent = self.gateway.retrieve_intent(intent_id).await?;
        Ok(PaymentStatusView {
            status: intent.status,
            amount: intent.amount.as_decimal(),
            currency: intent.currency,
        })
    }

    /// Fetches the caller's progress record for an owned course.
    #[tracing::instrument(skip(self))]
    pub async fn course_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<ProgressRecord, CheckoutError> {
        self.ensure_enrolled(user_id, course_id).await?;
        self.ledger
            .store()
            .progress_for(user_id, course_id)
            .await?
            .ok_or(CheckoutError::ProgressNotFound { user_id, course_id })
    }

    /// Marks a lecture complete on the caller's progress record,
    /// idempotently.
    #[tracing::instrument(skip(self))]
    pub async fn complete_lecture(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lecture_id: LectureId,
    ) -> Result<ProgressRecord, CheckoutError> {
        self.ensure_enrolled(user_id, course_id).await?;
        let progress = self
            .ledger
            .store()
            .complete_lecture(user_id, course_id, lecture_id)
            .await?;
        Ok(progress)
    }

    async fn ensure_enrolled(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<(), CheckoutError> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(CheckoutError::UserNotFound(user_id))?;
        if !user.owns(course_id) {
            return Err(CheckoutError::NotEnrolled { user_id, course_id });
        }
        Ok(())
    }
}
