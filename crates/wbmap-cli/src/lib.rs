//! CLI library components for the workbench auto-mapper.

pub mod input;
pub mod logging;
