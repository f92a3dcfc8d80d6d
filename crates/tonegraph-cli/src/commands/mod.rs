//! CLI command implementations.

pub mod analyze;
pub mod harmonics;
pub mod nodes;
pub mod render;
