//! Enrollment storage trait.

use async_trait::async_trait;
use common::{CourseId, LectureId, UserId};

use crate::Result;
use crate::records::{PaymentRecord, ProgressRecord};

/// Storage backend for payment and progress records.
///
/// Implementations enforce the two uniqueness invariants at the storage
/// layer: one payment record per intent identity and one progress
/// record per (user, course) pair. The optimistic checks upstream are
/// advisory; these are authoritative.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Inserts a payment record, rejecting a duplicate intent identity
    /// with [`LedgerError::DuplicateIntent`](crate::LedgerError::DuplicateIntent).
    async fn insert_payment(&self, record: PaymentRecord) -> Result<()>;

    /// Fetches the payment record for a provider intent, if any.
    async fn payment_by_intent(&self, intent_id: &str) -> Result<Option<PaymentRecord>>;

    /// Returns all payment records whose snapshot recorded success, for
    /// reconciliation.
    async fn succeeded_payments(&self) -> Result<Vec<PaymentRecord>>;

    /// Inserts a progress record unless one already exists for the
    /// (user, course) pair. Returns `true` when a record was created.
    async fn insert_progress_if_absent(&self, record: ProgressRecord) -> Result<bool>;

    /// Fetches the progress record for a (user, course) pair, if any.
    async fn progress_for(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>>;

    /// Marks a lecture complete on an existing progress record,
    /// idempotently, and returns the updated record.
    async fn complete_lecture(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lecture_id: LectureId,
    ) -> Result<ProgressRecord>;
}
