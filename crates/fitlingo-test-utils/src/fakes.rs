use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use fitlingo_core::UserStore;
use fitlingo_core::generator::{Generator, GeneratorError};
use fitlingo_db::StoreError;
use fitlingo_db::models::{NewUser, UpdateOutcome, User};

/// Envelope shaped like a Gemini response carrying `text`.
pub fn text_envelope(text: &str) -> Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
}

// ---------------------------------------------------------------------------
// Generator double
// ---------------------------------------------------------------------------

/// Generator that answers every call with the same envelope, or the same
/// API error, and records the prompts it received.
pub struct ScriptedGenerator {
    reply: Result<Value, (u16, String)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(envelope: Value) -> Self {
        Self {
            reply: Ok(envelope),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `text` wrapped in a Gemini-shaped envelope.
    pub fn replying_text(text: &str) -> Self {
        Self::replying(text_envelope(text))
    }

    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self {
            reply: Err((status, body.into())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_content(&self, _model: &str, prompt: &str) -> Result<Value, GeneratorError> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_owned());
        match &self.reply {
            Ok(envelope) => Ok(envelope.clone()),
            Err((status, body)) => Err(GeneratorError::Api {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Store double
// ---------------------------------------------------------------------------

/// [`UserStore`] over a map, mirroring the PostgreSQL store's semantics.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<BTreeMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored user.
    pub fn get(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .expect("user map poisoned")
            .get(username)
            .cloned()
    }

    fn with_slot<F>(
        &self,
        username: &str,
        path: &[usize],
        not_found: String,
        update: F,
    ) -> Result<UpdateOutcome, StoreError>
    where
        F: FnOnce(&mut serde_json::Map<String, Value>) -> UpdateOutcome,
    {
        let mut users = self.users.lock().expect("user map poisoned");
        let slot = users
            .get_mut(username)
            .and_then(|user| user.plan.as_mut())
            .and_then(|plan| {
                let day = plan.get_mut("days")?.get_mut(path[0])?;
                let node = match path.get(1) {
                    Some(&workout) => day.get_mut("workouts")?.get_mut(workout)?,
                    None => day,
                };
                node.as_object_mut()
            });
        match slot {
            Some(object) => Ok(update(object)),
            None => Err(StoreError::NotFound(not_found)),
        }
    }
}

fn user_from(new: &NewUser) -> User {
    User {
        id: Uuid::new_v4(),
        username: new.username.clone(),
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        age: new.age,
        weight: new.weight,
        sex: new.sex.clone(),
        height: new.height,
        weight_goal: new.weight_goal.clone(),
        health_conditions: new.health_conditions.clone(),
        machine_access: new.machine_access,
        dumbbells_access: new.dumbbells_access,
        frequency: new.frequency,
        days: new.days,
        intensity: new.intensity.clone(),
        skill_level: new.skill_level.clone(),
        plan: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.get(username))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().expect("user map poisoned");
        if users.contains_key(&user.username) {
            return Err(StoreError::AlreadyExists(user.username.clone()));
        }
        let row = user_from(user);
        users.insert(row.username.clone(), row.clone());
        Ok(row)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().expect("user map poisoned");
        Ok(users.remove(username).is_some())
    }

    async fn set_user_plan(
        &self,
        username: &str,
        plan: &Value,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut users = self.users.lock().expect("user map poisoned");
        let user = users
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(format!("no user by name {username}")))?;
        if user.plan.as_ref() == Some(plan) {
            return Ok(UpdateOutcome::Unchanged);
        }
        user.plan = Some(plan.clone());
        Ok(UpdateOutcome::Updated)
    }

    async fn mark_day_completed(
        &self,
        username: &str,
        day_no: u32,
    ) -> Result<UpdateOutcome, StoreError> {
        let not_found = format!("no user '{username}' with day {day_no} in their plan");
        let Some(day) = (day_no as usize).checked_sub(1) else {
            return Err(StoreError::NotFound(not_found));
        };
        self.with_slot(username, &[day], not_found, |day| {
            day.insert("date-completed".into(), json!(Utc::now().to_rfc3339()));
            UpdateOutcome::Updated
        })
    }

    async fn mark_workout_completed(
        &self,
        username: &str,
        day_no: u32,
        workout_no: u32,
    ) -> Result<UpdateOutcome, StoreError> {
        let not_found = format!(
            "no user '{username}' with day {day_no} workout {workout_no} in their plan"
        );
        let (Some(day), Some(workout)) = (
            (day_no as usize).checked_sub(1),
            (workout_no as usize).checked_sub(1),
        ) else {
            return Err(StoreError::NotFound(not_found));
        };
        self.with_slot(username, &[day, workout], not_found, |workout| {
            if workout.get("completed") == Some(&Value::Bool(true)) {
                return UpdateOutcome::Unchanged;
            }
            workout.insert("completed".into(), Value::Bool(true));
            workout.insert("date-completed".into(), json!(Utc::now().to_rfc3339()));
            UpdateOutcome::Updated
        })
    }

    async fn search_users(&self, pattern: &str) -> Result<Vec<User>, StoreError> {
        let needle = pattern.to_lowercase();
        let users = self.users.lock().expect("user map poisoned");
        let mut found: Vec<User> = users
            .values()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.username
                .to_lowercase()
                .cmp(&b.username.to_lowercase())
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(found)
    }
}
