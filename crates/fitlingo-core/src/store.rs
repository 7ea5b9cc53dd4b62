//! The `UserStore` trait and its PostgreSQL implementation.
//!
//! Handlers and the registration flow depend on the trait so tests can
//! swap in an in-memory store.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use fitlingo_db::StoreError;
use fitlingo_db::models::{NewUser, UpdateOutcome, User};
use fitlingo_db::queries::users;

/// Persistence of user profiles, plans and completion state.
///
/// Day and workout numbers are 1-indexed.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError>;

    /// Remove a user. Returns whether one was removed.
    async fn delete_user(&self, username: &str) -> Result<bool, StoreError>;

    async fn set_user_plan(&self, username: &str, plan: &Value)
    -> Result<UpdateOutcome, StoreError>;

    async fn mark_day_completed(
        &self,
        username: &str,
        day_no: u32,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn mark_workout_completed(
        &self,
        username: &str,
        day_no: u32,
        workout_no: u32,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Case-insensitive username substring search, ordered by lowercased
    /// username with ties broken by code point.
    async fn search_users(&self, pattern: &str) -> Result<Vec<User>, StoreError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn UserStore) {}
};

/// [`UserStore`] backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        users::get_user(&self.pool, username).await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        users::insert_user(&self.pool, user).await
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        users::delete_user(&self.pool, username).await
    }

    async fn set_user_plan(
        &self,
        username: &str,
        plan: &Value,
    ) -> Result<UpdateOutcome, StoreError> {
        users::set_user_plan(&self.pool, username, plan).await
    }

    async fn mark_day_completed(
        &self,
        username: &str,
        day_no: u32,
    ) -> Result<UpdateOutcome, StoreError> {
        users::mark_day_completed(&self.pool, username, day_no).await
    }

    async fn mark_workout_completed(
        &self,
        username: &str,
        day_no: u32,
        workout_no: u32,
    ) -> Result<UpdateOutcome, StoreError> {
        users::mark_workout_completed(&self.pool, username, day_no, workout_no).await
    }

    async fn search_users(&self, pattern: &str) -> Result<Vec<User>, StoreError> {
        users::search_users(&self.pool, pattern).await
    }
}
