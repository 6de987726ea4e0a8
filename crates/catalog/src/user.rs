//! User store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CourseId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A user account as seen by the checkout flow.
///
/// The subscription set holds the courses the user owns. The core only
/// ever appends to it; removal belongs to account administration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User identity.
    pub id: UserId,
    /// Contact address, forwarded to the payment provider where needed.
    pub email: String,
    /// Owned course IDs, each appearing at most once.
    pub subscription: Vec<CourseId>,
}

impl User {
    /// Creates a user with a fresh ID and an empty subscription set.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            subscription: Vec::new(),
        }
    }

    /// Returns true if the user already owns the course.
    pub fn owns(&self, course_id: CourseId) -> bool {
        self.subscription.contains(&course_id)
    }
}

/// Trait for user lookups and subscription grants.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetches a user by ID, or `None` if no such user exists.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, CatalogError>;

    /// Appends a course to the user's subscription set, guarded by
    /// "only if not already present".
    ///
    /// Returns `true` when the course was appended, `false` when the user
    /// already owned it. Fails with [`CatalogError::UserNotFound`] for an
    /// unknown user.
    async fn append_subscription(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, CatalogError>;
}

#[derive(Debug, Default)]
struct InMemoryUserState {
    users: HashMap<UserId, User>,
    fail_on_append: bool,
}

/// In-memory user store for tests and simulated deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    state: Arc<RwLock<InMemoryUserState>>,
}

impl InMemoryUserStore {
    /// Creates a new empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, returning their ID.
    pub fn add_user(&self, user: User) -> UserId {
        let id = user.id;
        self.state.write().unwrap().users.insert(id, user);
        id
    }

    /// Configures the store to fail on the next subscription append.
    pub fn set_fail_on_append(&self, fail: bool) {
        self.state.write().unwrap().fail_on_append = fail;
    }

    /// Returns the number of courses in a user's subscription set.
    pub fn subscription_count(&self, user_id: UserId) -> usize {
        self.state
            .read()
            .unwrap()
            .users
            .get(&user_id)
            .map(|u| u.subscription.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, CatalogError> {
        Ok(self.state.read().unwrap().users.get(&id).cloned())
    }

    async fn append_subscription(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, CatalogError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_append {
            return Err(CatalogError::Unavailable(
                "user store rejected the write".to_string(),
            ));
        }

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(CatalogError::UserNotFound(user_id))?;

        if user.subscription.contains(&course_id) {
            return Ok(false);
        }
        user.subscription.push(course_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_subscription_once() {
        let store = InMemoryUserStore::new();
        let user_id = store.add_user(User::new("learner@example.com"));
        let course_id = CourseId::new();

        assert!(store.append_subscription(user_id, course_id).await.unwrap());
        assert!(!store.append_subscription(user_id, course_id).await.unwrap());
        assert_eq!(store.subscription_count(user_id), 1);
    }

    #[tokio::test]
    async fn test_append_for_unknown_user_fails() {
        let store = InMemoryUserStore::new();
        let result = store
            .append_subscription(UserId::new(), CourseId::new())
            .await;
        assert!(matches!(result, Err(CatalogError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_fail_on_append() {
        let store = InMemoryUserStore::new();
        let user_id = store.add_user(User::new("learner@example.com"));
        store.set_fail_on_append(true);

        let result = store.append_subscription(user_id, CourseId::new()).await;
        assert!(matches!(result, Err(CatalogError::Unavailable(_))));
        assert_eq!(store.subscription_count(user_id), 0);
    }

    #[tokio::test]
    async fn test_owns_reflects_subscription() {
        let store = InMemoryUserStore::new();
        let user_id = store.add_user(User::new("learner@example.com"));
        let course_id = CourseId::new();
        store.append_subscription(user_id, course_id).await.unwrap();

        let user = store.get_user(user_id).await.unwrap().unwrap();
        assert!(user.owns(course_id));
        assert!(!user.owns(CourseId::new()));
    }
}
