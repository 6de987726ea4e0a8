//! Reconciliation of partial commits.
//!
//! A crash between the payment insert and the two grant writes leaves a
//! succeeded payment with no matching subscription membership or
//! progress record. This pass detects and repairs that state; it is an
//! operational safeguard, run at startup and available to operators.

use catalog::{CatalogError, UserStore};
use serde::Serialize;

use crate::records::ProgressRecord;
use crate::store::EnrollmentStore;
use crate::Result;

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Succeeded payment records examined.
    pub payments_checked: usize,
    /// Subscription memberships that were missing and re-applied.
    pub subscriptions_repaired: usize,
    /// Progress records that were missing and re-created.
    pub progress_repaired: usize,
    /// Payments whose user no longer exists; left for manual review.
    pub orphaned_payments: usize,
}

impl ReconcileReport {
    /// Returns true when the run found nothing to repair.
    pub fn is_clean(&self) -> bool {
        self.subscriptions_repaired == 0 && self.progress_repaired == 0 && self.orphaned_payments == 0
    }
}

/// Compares succeeded payments against subscription membership and
/// progress existence, repairing the missing side.
pub struct Reconciler<S, U> {
    store: S,
    users: U,
}

impl<S, U> Reconciler<S, U>
where
    S: EnrollmentStore,
    U: UserStore,
{
    /// Creates a reconciler over the given backends.
    pub fn new(store: S, users: U) -> Self {
        Self { store, users }
    }

    /// Runs one reconciliation pass.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for payment in self.store.succeeded_payments().await? {
            report.payments_checked += 1;

            match self
                .users
                .append_subscription(payment.user_id, payment.course_id)
                .await
            {
                Ok(true) => {
                    report.subscriptions_repaired += 1;
                    tracing::warn!(
                        intent_id = %payment.intent_id,
                        user_id = %payment.user_id,
                        course_id = %payment.course_id,
                        "repaired missing subscription for recorded payment"
                    );
                }
                Ok(false) => {}
                Err(CatalogError::UserNotFound(user_id)) => {
                    report.orphaned_payments += 1;
                    tracing::warn!(
                        intent_id = %payment.intent_id,
                        %user_id,
                        "payment references a missing user; skipping"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            if self
                .store
                .insert_progress_if_absent(ProgressRecord::new(payment.user_id, payment.course_id))
                .await?
            {
                report.progress_repaired += 1;
                tracing::warn!(
                    intent_id = %payment.intent_id,
                    user_id = %payment.user_id,
                    course_id = %payment.course_id,
                    "recreated missing progress record for recorded payment"
                );
            }
        }

        if report.is_clean() {
            tracing::info!(checked = report.payments_checked, "reconciliation clean");
        } else {
            metrics::counter!("enrollment_repairs_total")
                .increment((report.subscriptions_repaired + report.progress_repaired) as u64);
            tracing::warn!(?report, "reconciliation repaired partial enrollments");
        }

        Ok(report)
    }
}
