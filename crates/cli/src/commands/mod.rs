//! CLI Commands

pub mod analyze;
pub mod pattern;
pub mod queue;
