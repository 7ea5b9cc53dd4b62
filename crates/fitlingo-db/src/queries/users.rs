//! Database query functions for the `users` table.
//!
//! Plans live in the `plan` JSONB column. Day and workout numbers are
//! 1-indexed at this interface and converted to 0-indexed JSON array
//! positions before they reach SQL. Plans are stored as generated, so a
//! day or workout slot only counts as present when it is a JSON object.

use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{NewUser, UpdateOutcome, User};

/// Insert a new user. Fails with [`StoreError::AlreadyExists`] when the
/// username is taken.
pub async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<User, StoreError> {
    let result = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, first_name, last_name, age, weight, sex, height, \
                            weight_goal, health_conditions, machine_access, dumbbells_access, \
                            frequency, days, intensity, skill_level) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         RETURNING *",
    )
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.age)
    .bind(user.weight)
    .bind(&user.sex)
    .bind(user.height)
    .bind(Json(&user.weight_goal))
    .bind(&user.health_conditions)
    .bind(user.machine_access)
    .bind(user.dumbbells_access)
    .bind(user.frequency)
    .bind(user.days)
    .bind(&user.intensity)
    .bind(&user.skill_level)
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => Ok(row),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(StoreError::AlreadyExists(user.username.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Fetch a user by username.
pub async fn get_user(pool: &PgPool, username: &str) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Case-insensitive substring search on usernames.
///
/// Ordered by lowercased username, ties broken by code point, independent
/// of the database collation.
pub async fn search_users(pool: &PgPool, pattern: &str) -> Result<Vec<User>, StoreError> {
    // strpos avoids having to escape LIKE wildcards in the pattern.
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users \
         WHERE strpos(lower(username), lower($1)) > 0 \
         ORDER BY lower(username) COLLATE \"C\", username COLLATE \"C\"",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Delete a user. Returns whether a row was removed.
pub async fn delete_user(pool: &PgPool, username: &str) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Replace the user's plan wholesale.
pub async fn set_user_plan(
    pool: &PgPool,
    username: &str,
    plan: &Value,
) -> Result<UpdateOutcome, StoreError> {
    let updated = sqlx::query_scalar::<_, String>(
        "UPDATE users SET plan = $2 \
         WHERE username = $1 AND plan IS DISTINCT FROM $2 \
         RETURNING username",
    )
    .bind(username)
    .bind(plan)
    .fetch_optional(pool)
    .await?;

    if updated.is_some() {
        debug!(username, "plan stored");
        return Ok(UpdateOutcome::Updated);
    }

    // Distinguish between "not found" and "same plan already stored".
    match get_user(pool, username).await? {
        Some(_) => Ok(UpdateOutcome::Unchanged),
        None => Err(StoreError::NotFound(format!("no user by name {username}"))),
    }
}

/// Stamp `date-completed` on day `day_no` (1-indexed) of the user's plan.
///
/// The day slot must exist and be an object. Every call writes a fresh timestamp, so a
/// matched row always reports [`UpdateOutcome::Updated`].
pub async fn mark_day_completed(
    pool: &PgPool,
    username: &str,
    day_no: u32,
) -> Result<UpdateOutcome, StoreError> {
    let not_found =
        || StoreError::NotFound(format!("no user '{username}' with day {day_no} in their plan"));
    let day_index = json_index(day_no).ok_or_else(not_found)?;
    let path = vec![
        "days".to_owned(),
        day_index.to_string(),
        "date-completed".to_owned(),
    ];

    let updated = sqlx::query_scalar::<_, String>(
        "UPDATE users \
         SET plan = jsonb_set(plan, $3::text[], to_jsonb(now()), true) \
         WHERE username = $1 \
           AND jsonb_typeof(plan -> 'days' -> $2::int) = 'object' \
         RETURNING username",
    )
    .bind(username)
    .bind(day_index)
    .bind(&path)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(_) => Ok(UpdateOutcome::Updated),
        None => Err(not_found()),
    }
}

/// Set `completed: true` (and stamp `date-completed`) on workout
/// `workout_no` of day `day_no`, both 1-indexed.
///
/// Both slots must exist and the workout slot must be an object. A workout that is already completed is left
/// untouched and reported as [`UpdateOutcome::Unchanged`].
pub async fn mark_workout_completed(
    pool: &PgPool,
    username: &str,
    day_no: u32,
    workout_no: u32,
) -> Result<UpdateOutcome, StoreError> {
    let not_found = || {
        StoreError::NotFound(format!(
            "no user '{username}' with day {day_no} workout {workout_no} in their plan"
        ))
    };
    let day_index = json_index(day_no).ok_or_else(not_found)?;
    let workout_index = json_index(workout_no).ok_or_else(not_found)?;

    let workout_path = |key: &str| {
        vec![
            "days".to_owned(),
            day_index.to_string(),
            "workouts".to_owned(),
            workout_index.to_string(),
            key.to_owned(),
        ]
    };
    let completed_path = workout_path("completed");
    let date_path = workout_path("date-completed");

    let updated = sqlx::query_scalar::<_, String>(
        "UPDATE users \
         SET plan = jsonb_set( \
                 jsonb_set(plan, $4::text[], 'true'::jsonb, true), \
                 $5::text[], to_jsonb(now()), true) \
         WHERE username = $1 \
           AND jsonb_typeof(plan -> 'days' -> $2::int -> 'workouts' -> $3::int) = 'object' \
           AND (plan #> $4::text[]) IS DISTINCT FROM 'true'::jsonb \
         RETURNING username",
    )
    .bind(username)
    .bind(day_index)
    .bind(workout_index)
    .bind(&completed_path)
    .bind(&date_path)
    .fetch_optional(pool)
    .await?;

    if updated.is_some() {
        return Ok(UpdateOutcome::Updated);
    }

    let slot_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS( \
             SELECT 1 FROM users \
             WHERE username = $1 \
               AND jsonb_typeof(plan -> 'days' -> $2::int -> 'workouts' -> $3::int) = 'object')",
    )
    .bind(username)
    .bind(day_index)
    .bind(workout_index)
    .fetch_one(pool)
    .await?;

    if slot_exists {
        Ok(UpdateOutcome::Unchanged)
    } else {
        Err(not_found())
    }
}

/// Total number of registered users.
pub async fn count_users(pool: &PgPool) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Convert a 1-indexed position into a 0-indexed JSON array index.
fn json_index(position: u32) -> Option<i32> {
    position
        .checked_sub(1)
        .and_then(|index| i32::try_from(index).ok())
}
