//! BDD step definitions for craftwatch

pub mod names_steps;
pub mod reconciliation_steps;
pub mod scheduler_steps;
