//! Core domain types and logic.

pub mod daily;
pub mod indicator;
pub mod enrich;
pub mod momentum;
pub mod tier;
pub mod signal;
pub mod universe;
pub mod scan;
pub mod config_validation;
pub mod error;
