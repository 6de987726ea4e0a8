//! Enrollment ledger.
//!
//! Persists the three records that together make a purchase: the
//! payment record (keyed by the provider intent identity, the
//! idempotency anchor), the user's subscription membership, and the
//! progress record. The ledger commits them as one logical unit with
//! the payment insert first, so any partial commit is detectable and
//! repairable by the [`Reconciler`].

pub mod commit;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod reconcile;
pub mod records;
pub mod store;

pub use commit::{EnrollmentLedger, EnrollmentOutcome, EnrollmentRequest};
pub use error::LedgerError;
pub use memory::InMemoryEnrollmentStore;
pub use postgres::PostgresEnrollmentStore;
pub use reconcile::{ReconcileReport, Reconciler};
pub use records::{PaymentRecord, ProgressRecord};
pub use store::EnrollmentStore;

/// Convenience type alias for ledger results.
pub type Result<T> = std::result::Result<T, LedgerError>;
