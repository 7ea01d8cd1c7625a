//! Helpers shared across checks and filtering

pub mod glob;
pub mod text;
