//! Course catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::CourseId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A course as seen by the checkout flow.
///
/// Owned by the catalog subsystem; the core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Course identity.
    pub id: CourseId,
    /// Display title, also stamped into payment intent metadata.
    pub title: String,
    /// Price in major currency units (single-currency storefront).
    pub price: Decimal,
    /// Reference to the creating instructor.
    pub creator: String,
}

impl Course {
    /// Creates a course with a fresh ID.
    pub fn new(title: impl Into<String>, price: Decimal, creator: impl Into<String>) -> Self {
        Self {
            id: CourseId::new(),
            title: title.into(),
            price,
            creator: creator.into(),
        }
    }
}

/// Trait for course lookups.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetches a course by ID, or `None` if the catalog has no such course.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, CatalogError>;
}

/// In-memory catalog for tests and simulated deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    courses: Arc<RwLock<HashMap<CourseId, Course>>>,
}

impl InMemoryCatalog {
    /// Creates a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a course, returning its ID.
    pub fn add_course(&self, course: Course) -> CourseId {
        let id = course.id;
        self.courses.write().unwrap().insert(id, course);
        id
    }

    /// Returns the number of courses in the catalog.
    pub fn course_count(&self) -> usize {
        self.courses.read().unwrap().len()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, CatalogError> {
        Ok(self.courses.read().unwrap().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_add_and_get_course() {
        let catalog = InMemoryCatalog::new();
        let id = catalog.add_course(Course::new("Intro to Rust", dec!(49.99), "instructor-1"));

        let course = catalog.get_course(id).await.unwrap().unwrap();
        assert_eq!(course.title, "Intro to Rust");
        assert_eq!(course.price, dec!(49.99));
    }

    #[tokio::test]
    async fn test_missing_course_is_none() {
        let catalog = InMemoryCatalog::new();
        let result = catalog.get_course(CourseId::new()).await.unwrap();
        assert!(result.is_none());
    }
}
