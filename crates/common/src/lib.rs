//! Shared types for the course storefront: typed identifiers and money.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CourseId, LectureId, PaymentId, ProgressId, UserId};
