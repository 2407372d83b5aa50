//! Rental lifecycle and penalty resolution engine for tool rental operations.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
