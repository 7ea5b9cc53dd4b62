//! Prompt construction for plan generation.
//!
//! Turns a [`UserProfile`] into a single instruction string that asks the
//! generator for a JSON workout plan. Pure and deterministic: missing
//! profile fields fall back to fixed defaults and never cause an error.

use std::fmt::Write as _;

use crate::profile::UserProfile;

/// Plan length used when the profile does not specify one.
pub const DEFAULT_PLAN_DAYS: u32 = 30;

/// Rendered in place of any absent profile value.
pub const PLACEHOLDER: &str = "N/A";

pub const DEFAULT_INTENSITY: &str = "moderate";
pub const DEFAULT_SKILL_LEVEL: &str = "beginner";

/// Output contract appended to every prompt.
const OUTPUT_FORMAT: &str = r#"{
    "days": [
        {
            "day-name": "push/pull/legs/cardio/rest",
            "day-number": 1,
            "estimated-workout-time": "45-60 minutes",
            "suggested-calorie-intake": "1800-2000 kcal",
            "workouts": [
                {
                    "name": "workout name",
                    "sets": 3,
                    "reps": 12,
                    "instructions": "how to perform the exercise"
                }
            ]
        }
    ]
}"#;

const REST_DAY_RULE: &str = r#"Rest days must still contain exactly one workout entry: {"name": "rest", "sets": 1, "reps": 1, "instructions": "rest today"}."#;

/// Build the generation prompt for `profile`.
pub fn build_prompt(profile: &UserProfile) -> String {
    let mut prompt = String::with_capacity(1536);

    let days = profile.days.unwrap_or(DEFAULT_PLAN_DAYS);
    let (direction, amount) = match &profile.weight_goal {
        Some(goal) => (
            goal.direction.as_deref().unwrap_or(PLACEHOLDER).to_owned(),
            goal.amount.map(format_number).unwrap_or_else(|| PLACEHOLDER.to_owned()),
        ),
        None => (PLACEHOLDER.to_owned(), PLACEHOLDER.to_owned()),
    };

    // Writing to a String cannot fail.
    let _ = writeln!(prompt, "Create a {days} day workout plan for the following user:");
    let _ = writeln!(prompt, "- Age: {}", or_placeholder(profile.age));
    let _ = writeln!(prompt, "- Sex: {}", profile.sex.as_deref().unwrap_or(PLACEHOLDER));
    let _ = writeln!(prompt, "- Weight: {} kg", or_placeholder(profile.weight.map(format_number)));
    let _ = writeln!(prompt, "- Height: {} cm", or_placeholder(profile.height.map(format_number)));
    let _ = writeln!(prompt, "- Weight goal: {direction} {amount} kg");
    let _ = writeln!(prompt, "- Health conditions: {}", profile.health_conditions.join(", "));
    let _ = writeln!(prompt, "- Machine access: {}", yes_no(profile.machine_access));
    let _ = writeln!(prompt, "- Dumbbells access: {}", yes_no(profile.dumbbells_access));
    let _ = writeln!(prompt, "- Frequency: {} days per week", or_placeholder(profile.frequency));
    let _ = writeln!(
        prompt,
        "- Intensity: {}",
        profile.intensity.as_deref().unwrap_or(DEFAULT_INTENSITY)
    );
    let _ = writeln!(
        prompt,
        "- Skill level: {}",
        profile.skill_level.as_deref().unwrap_or(DEFAULT_SKILL_LEVEL)
    );

    prompt.push_str(
        "\nPlease generate a detailed workout plan that effectively helps the user reach \
         their goals. Take into account their health conditions, weight goal, skill level \
         and intensity, and include rest days. Output the plan as JSON in exactly the \
         following format:\n",
    );
    prompt.push_str(OUTPUT_FORMAT);
    prompt.push('\n');
    prompt.push_str(REST_DAY_RULE);
    prompt.push('\n');

    prompt
}

fn or_placeholder<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_owned(), |v| v.to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// `70.0` renders as `70`, `70.5` as `70.5`.
fn format_number(value: f64) -> String {
    format!("{value}")
}
