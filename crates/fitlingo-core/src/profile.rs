//! The subset of a user's attributes that personalizes a plan.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fitlingo_db::models::NewUser;

/// Profile fed to the prompt builder. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserProfile {
    /// Plan duration in days.
    pub days: Option<u32>,
    pub age: Option<u32>,
    pub sex: Option<String>,
    /// Kilograms.
    pub weight: Option<f64>,
    /// Centimetres.
    pub height: Option<f64>,
    pub weight_goal: Option<WeightTarget>,
    pub health_conditions: Vec<String>,
    pub machine_access: bool,
    #[serde(alias = "dumbells-access")]
    pub dumbbells_access: bool,
    /// Desired sessions per week.
    pub frequency: Option<u32>,
    pub intensity: Option<String>,
    pub skill_level: Option<String>,
}

/// Weight goal whose parts may each be missing, read from a JSON array
/// such as `["lose", 5]` or `["maintain"]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Value>", into = "Vec<Value>")]
pub struct WeightTarget {
    pub direction: Option<String>,
    pub amount: Option<f64>,
}

impl From<Vec<Value>> for WeightTarget {
    fn from(parts: Vec<Value>) -> Self {
        Self {
            direction: parts.first().and_then(Value::as_str).map(str::to_owned),
            amount: parts.get(1).and_then(Value::as_f64),
        }
    }
}

impl From<WeightTarget> for Vec<Value> {
    fn from(target: WeightTarget) -> Self {
        let mut parts = vec![target.direction.map_or(Value::Null, Value::from)];
        if let Some(amount) = target.amount {
            parts.push(Value::from(amount));
        }
        parts
    }
}

impl From<&NewUser> for UserProfile {
    fn from(user: &NewUser) -> Self {
        Self {
            days: u32::try_from(user.days).ok(),
            age: u32::try_from(user.age).ok(),
            sex: Some(user.sex.clone()),
            weight: Some(user.weight),
            height: Some(user.height),
            weight_goal: Some(WeightTarget {
                direction: Some(user.weight_goal.direction().to_owned()),
                amount: Some(user.weight_goal.amount()),
            }),
            health_conditions: user.health_conditions.clone(),
            machine_access: user.machine_access,
            dumbbells_access: user.dumbbells_access,
            frequency: u32::try_from(user.frequency).ok(),
            intensity: user.intensity.clone(),
            skill_level: user.skill_level.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_partial_profile() {
        let profile: UserProfile = serde_json::from_value(json!({
            "age": 25,
            "weight-goal": ["gain"],
            "dumbells-access": true
        }))
        .unwrap();

        assert_eq!(profile.age, Some(25));
        assert!(profile.days.is_none());
        assert!(profile.dumbbells_access);
        assert!(!profile.machine_access);
        assert_eq!(
            profile.weight_goal,
            Some(WeightTarget {
                direction: Some("gain".into()),
                amount: None,
            })
        );
    }

    #[test]
    fn weight_target_tolerates_odd_arrays() {
        let empty = WeightTarget::from(vec![]);
        assert_eq!(empty, WeightTarget::default());

        let swapped = WeightTarget::from(vec![json!(5), json!("lose")]);
        assert!(swapped.direction.is_none());
        assert!(swapped.amount.is_none());
    }
}
