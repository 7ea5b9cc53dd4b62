//! Typed view of a generated plan, and progress counting over stored plans.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A day-by-day workout schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    #[serde(default)]
    pub days: Vec<PlanDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlanDay {
    #[serde(default)]
    pub day_name: String,
    #[serde(default)]
    pub day_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_workout_time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_calorie_intake: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<String>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Workout {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sets: Value,
    #[serde(default)]
    pub reps: Value,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<String>,
}

impl WorkoutPlan {
    /// Interpret a stored plan. Fails only when the JSON cannot be read as
    /// a plan at all (for instance `days` is not an array).
    pub fn from_value(plan: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(plan)
    }

    /// Whether `day` is a rest day by the placeholder convention.
    pub fn is_rest_day(day: &PlanDay) -> bool {
        day.workouts.len() == 1 && day.workouts[0].name.eq_ignore_ascii_case("rest")
    }
}

/// Completion counts for a stored plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanProgress {
    pub total_days: usize,
    pub completed_days: usize,
    pub total_workouts: usize,
    pub completed_workouts: usize,
}

impl PlanProgress {
    /// Count days and workouts in `plan`, skipping anything that does not
    /// have the expected shape instead of failing.
    pub fn from_plan(plan: &Value) -> Self {
        let mut progress = Self::default();
        let Some(days) = plan.get("days").and_then(Value::as_array) else {
            return progress;
        };

        for day in days {
            progress.total_days += 1;
            if day.get("date-completed").is_some_and(|d| !d.is_null()) {
                progress.completed_days += 1;
            }
            let Some(workouts) = day.get("workouts").and_then(Value::as_array) else {
                continue;
            };
            for workout in workouts {
                progress.total_workouts += 1;
                if workout.get("completed").and_then(Value::as_bool) == Some(true) {
                    progress.completed_workouts += 1;
                }
            }
        }
        progress
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_plan() -> Value {
        json!({
            "days": [
                {
                    "day-name": "push",
                    "day-number": 1,
                    "estimated-workout-time": "45-60 minutes",
                    "suggested-calorie-intake": 1800,
                    "date-completed": "2026-01-01T10:00:00Z",
                    "workouts": [
                        {"name": "bench", "sets": 3, "reps": 10, "instructions": "press",
                         "completed": true},
                        {"name": "dips", "sets": "3", "reps": "to failure", "instructions": "dip"}
                    ]
                },
                {
                    "day-name": "rest",
                    "day-number": 2,
                    "workouts": [
                        {"name": "rest", "sets": 1, "reps": 1, "instructions": "rest today"}
                    ]
                }
            ]
        })
    }

    #[test]
    fn typed_plan_reads_loose_values() {
        let plan = WorkoutPlan::from_value(&sample_plan()).unwrap();
        assert_eq!(plan.days.len(), 2);
        assert_eq!(plan.days[0].day_name, "push");
        assert_eq!(plan.days[0].workouts[1].reps, json!("to failure"));
        assert!(plan.days[0].workouts[0].completed);
        assert!(!WorkoutPlan::is_rest_day(&plan.days[0]));
        assert!(WorkoutPlan::is_rest_day(&plan.days[1]));
    }

    #[test]
    fn typed_plan_rejects_non_array_days() {
        assert!(WorkoutPlan::from_value(&json!({"days": "soon"})).is_err());
    }

    #[test]
    fn progress_counts_completion() {
        let progress = PlanProgress::from_plan(&sample_plan());
        assert_eq!(
            progress,
            PlanProgress {
                total_days: 2,
                completed_days: 1,
                total_workouts: 3,
                completed_workouts: 1,
            }
        );
    }

    #[test]
    fn progress_tolerates_malformed_plans() {
        assert_eq!(PlanProgress::from_plan(&json!(null)), PlanProgress::default());
        assert_eq!(
            PlanProgress::from_plan(&json!({"days": "many"})),
            PlanProgress::default()
        );

        let odd = json!({"days": [42, {"workouts": "none"}, {"workouts": [{"completed": "yes"}]}]});
        let progress = PlanProgress::from_plan(&odd);
        assert_eq!(progress.total_days, 3);
        assert_eq!(progress.total_workouts, 1);
        assert_eq!(progress.completed_workouts, 0);
    }
}
