//! `fitlingo generate`: build a plan for a profile file without touching
//! the database.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use fitlingo_core::generator::GeminiClient;
use fitlingo_core::plan::{PlanProgress, WorkoutPlan, build_prompt};
use fitlingo_core::{PlanGenerator, UserProfile};

use crate::config::FitlingoConfig;

/// Read a profile document from `path`.
pub fn load_profile(path: &Path) -> Result<UserProfile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse profile file {}", path.display()))
}

pub async fn run_generate(config: &FitlingoConfig, file: &Path, prompt_only: bool) -> Result<()> {
    let profile = load_profile(file)?;

    if prompt_only {
        print!("{}", build_prompt(&profile));
        return Ok(());
    }

    let client = GeminiClient::new(config.gemini_config()?);
    let planner = PlanGenerator::with_model(Arc::new(client), &config.model);
    tracing::info!(model = planner.model(), "generating plan");

    match planner.generate(&profile).await {
        Ok(plan) => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            eprint!("{}", summarize(&plan));
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e)?);
            anyhow::bail!("plan generation failed: {}", e.error)
        }
    }
}

/// One line per day plus totals, for a human reading the terminal.
fn summarize(plan: &Value) -> String {
    let mut out = String::new();

    match WorkoutPlan::from_value(plan) {
        Ok(typed) => {
            for day in &typed.days {
                if WorkoutPlan::is_rest_day(day) {
                    let _ = writeln!(out, "  day {:>2}  {} (rest)", day.day_number, day.day_name);
                } else {
                    let _ = writeln!(
                        out,
                        "  day {:>2}  {} ({} workouts)",
                        day.day_number,
                        day.day_name,
                        day.workouts.len()
                    );
                }
            }
        }
        Err(e) => {
            let _ = writeln!(out, "  plan does not have the expected shape: {e}");
        }
    }

    let progress = PlanProgress::from_plan(plan);
    let _ = writeln!(
        out,
        "{} days, {} workouts",
        progress.total_days, progress.total_workouts
    );
    out
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn load_profile_reads_kebab_case_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"days": 3, "age": 25, "weight-goal": ["lose", 5], "machine-access": true}}"#
        )
        .unwrap();

        let profile = load_profile(file.path()).unwrap();
        assert_eq!(profile.days, Some(3));
        assert_eq!(profile.age, Some(25));
        assert!(profile.machine_access);

        let prompt = build_prompt(&profile);
        assert!(prompt.contains("3 day workout plan"));
        assert!(prompt.contains("lose 5 kg"));
    }

    #[test]
    fn load_profile_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"days\": ").unwrap();

        let msg = format!("{:#}", load_profile(file.path()).unwrap_err());
        assert!(msg.contains("failed to parse profile file"), "{msg}");
    }

    #[test]
    fn load_profile_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_profile(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read profile file"));
    }

    #[test]
    fn summarize_lists_days_and_totals() {
        let plan = json!({"days": [
            {"day-name": "push", "day-number": 1, "workouts": [
                {"name": "bench press", "sets": 3, "reps": 8, "instructions": "press"},
                {"name": "dips", "sets": 3, "reps": 10, "instructions": "dip"}]},
            {"day-name": "recovery", "day-number": 2, "workouts": [
                {"name": "Rest", "sets": 0, "reps": 0, "instructions": "rest"}]}
        ]});

        let summary = summarize(&plan);
        assert!(summary.contains("day  1  push (2 workouts)"), "{summary}");
        assert!(summary.contains("day  2  recovery (rest)"), "{summary}");
        assert!(summary.ends_with("2 days, 3 workouts\n"), "{summary}");
    }

    #[test]
    fn summarize_tolerates_unexpected_shape() {
        let summary = summarize(&json!({"days": "soon"}));
        assert!(summary.contains("plan does not have the expected shape"));
        assert!(summary.ends_with("0 days, 0 workouts\n"));
    }
}
