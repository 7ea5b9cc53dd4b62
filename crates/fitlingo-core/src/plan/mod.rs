//! Plan handling: prompt construction, response extraction, typed model.

pub mod extract;
pub mod model;
pub mod prompt;

pub use extract::{ExtractionFailure, ExtractionResult, extract_plan, strip_fences};
pub use model::{PlanDay, PlanProgress, Workout, WorkoutPlan};
pub use prompt::build_prompt;
