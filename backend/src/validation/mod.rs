//! Unified validation framework for request payloads.
//!
//! Rule functions live in [`rules`] so the telemetry store adapter can apply
//! the same checks point by point.

pub mod rules;

pub use validator::Validate;
