//! CLI command implementations.

pub mod offsets;
pub mod run;
