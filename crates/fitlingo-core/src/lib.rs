//! Core logic for fitlingo: profile-driven prompt construction, defensive
//! extraction of generated plans, the generation pipeline, and the
//! registration flow on top of a pluggable user store.

pub mod generator;
pub mod plan;
pub mod planner;
pub mod profile;
pub mod service;
pub mod store;

pub use planner::{GenerationError, PlanGenerator};
pub use profile::UserProfile;
pub use store::{PgUserStore, UserStore};
