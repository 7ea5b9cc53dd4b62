use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Profile fields
// ---------------------------------------------------------------------------

/// Fields every registration document must carry, in their wire spelling.
pub const REQUIRED_USER_FIELDS: [&str; 12] = [
    "username",
    "first-name",
    "last-name",
    "age",
    "weight",
    "sex",
    "height",
    "weight-goal",
    "health-conditions",
    "machine-access",
    "frequency",
    "days",
];

/// Weight goal as `[direction, kilograms]`, e.g. `["lose", 5]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGoal(pub String, pub f64);

impl WeightGoal {
    pub fn direction(&self) -> &str {
        &self.0
    }

    pub fn amount(&self) -> f64 {
        self.1
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A row from the `users` table.
///
/// Serializes to the hyphenated document shape clients already consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    #[serde(skip_serializing)]
    #[serde(default)]
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub weight: f64,
    pub sex: String,
    pub height: f64,
    #[sqlx(json)]
    pub weight_goal: WeightGoal,
    pub health_conditions: Vec<String>,
    pub machine_access: bool,
    pub dumbbells_access: bool,
    pub frequency: i32,
    pub days: i32,
    pub intensity: Option<String>,
    pub skill_level: Option<String>,
    /// The generated plan, `None` until generation succeeds.
    pub plan: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for inserting a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub weight: f64,
    pub sex: String,
    pub height: f64,
    pub weight_goal: WeightGoal,
    pub health_conditions: Vec<String>,
    pub machine_access: bool,
    #[serde(default, alias = "dumbells-access")]
    pub dumbbells_access: bool,
    pub frequency: i32,
    pub days: i32,
    #[serde(default)]
    pub intensity: Option<String>,
    #[serde(default)]
    pub skill_level: Option<String>,
}

/// Why a registration document was rejected.
#[derive(Debug, thiserror::Error)]
pub enum UserValidationError {
    #[error("user data must be a JSON object")]
    NotAnObject,

    #[error("missing username")]
    MissingUsername,

    #[error("missing the following data for user: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("invalid user data: {0}")]
    InvalidField(#[source] serde_json::Error),
}

impl NewUser {
    /// Validate a raw registration document and convert it.
    ///
    /// A missing or blank username is reported on its own; any other absent
    /// required fields are reported together, sorted by name. Unknown keys
    /// are ignored.
    pub fn from_document(document: &Value) -> Result<Self, UserValidationError> {
        let map = document
            .as_object()
            .ok_or(UserValidationError::NotAnObject)?;

        let has_username = map
            .get("username")
            .and_then(Value::as_str)
            .is_some_and(|u| !u.trim().is_empty());
        if !has_username {
            return Err(UserValidationError::MissingUsername);
        }

        let mut missing: Vec<String> = REQUIRED_USER_FIELDS
            .iter()
            .filter(|key| map.get(**key).is_none_or(Value::is_null))
            .map(|key| (*key).to_owned())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(UserValidationError::MissingFields(missing));
        }

        serde_json::from_value(document.clone()).map_err(UserValidationError::InvalidField)
    }
}

// ---------------------------------------------------------------------------
// Update outcomes
// ---------------------------------------------------------------------------

/// Result of an update that matched a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The row was modified.
    Updated,
    /// The row matched but already held the requested value.
    Unchanged,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_document() -> Value {
        json!({
            "username": "tomcat",
            "first-name": "Tom",
            "last-name": "Cat",
            "age": 20,
            "weight": 50,
            "sex": "m",
            "height": 140,
            "weight-goal": ["lose", 2],
            "health-conditions": ["na"],
            "machine-access": true,
            "dumbells-access": true,
            "frequency": 5,
            "days": 5
        })
    }

    #[test]
    fn from_document_accepts_complete_profile() {
        let user = NewUser::from_document(&full_document()).unwrap();
        assert_eq!(user.username, "tomcat");
        assert_eq!(user.weight, 50.0);
        assert_eq!(user.weight_goal, WeightGoal("lose".into(), 2.0));
        assert!(user.dumbbells_access, "legacy key should be accepted");
        assert!(user.intensity.is_none());
    }

    #[test]
    fn from_document_reports_missing_username_first() {
        let mut doc = full_document();
        doc.as_object_mut().unwrap().remove("username");
        doc.as_object_mut().unwrap().remove("age");
        let err = NewUser::from_document(&doc).unwrap_err();
        assert!(matches!(err, UserValidationError::MissingUsername));
        assert_eq!(err.to_string(), "missing username");
    }

    #[test]
    fn from_document_lists_missing_fields_sorted() {
        let mut doc = full_document();
        let map = doc.as_object_mut().unwrap();
        map.remove("weight");
        map.remove("days");
        map.insert("sex".into(), Value::Null);

        match NewUser::from_document(&doc).unwrap_err() {
            UserValidationError::MissingFields(fields) => {
                assert_eq!(fields, vec!["days", "sex", "weight"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn from_document_rejects_wrong_types() {
        let mut doc = full_document();
        doc["age"] = json!("twenty");
        let err = NewUser::from_document(&doc).unwrap_err();
        assert!(matches!(err, UserValidationError::InvalidField(_)));
    }

    #[test]
    fn from_document_rejects_non_object() {
        let err = NewUser::from_document(&json!(["tomcat"])).unwrap_err();
        assert!(matches!(err, UserValidationError::NotAnObject));
    }

    #[test]
    fn user_serializes_with_hyphenated_keys() {
        let user = User {
            id: Uuid::nil(),
            username: "tomcat".into(),
            first_name: "Tom".into(),
            last_name: "Cat".into(),
            age: 25,
            weight: 70.0,
            sex: "m".into(),
            height: 175.0,
            weight_goal: WeightGoal("lose".into(), 5.0),
            health_conditions: vec!["asthma".into()],
            machine_access: true,
            dumbbells_access: false,
            frequency: 3,
            days: 3,
            intensity: None,
            skill_level: None,
            plan: Some(json!({"days": []})),
            created_at: Utc::now(),
        };

        let doc = serde_json::to_value(&user).unwrap();
        assert_eq!(doc["first-name"], "Tom");
        assert_eq!(doc["weight-goal"], json!(["lose", 5.0]));
        assert_eq!(doc["machine-access"], true);
        assert_eq!(doc["plan"], json!({"days": []}));
        assert!(doc.get("id").is_none(), "internal id should not be exposed");
    }
}
