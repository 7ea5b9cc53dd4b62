//! PostgreSQL persistence for fitlingo users and their plans.

pub mod config;
pub mod error;
pub mod models;
pub mod pool;
pub mod queries;

pub use error::StoreError;
