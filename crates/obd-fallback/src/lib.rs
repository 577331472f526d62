//! Fallback Telemetry Generator
//!
//! Produces plausible synthetic telemetry and a demo DTC list when no
//! adapter transport could be opened, through the same update channel the
//! live session uses. Callers cannot tell the two apart, which is the
//! point: the client degrades to a functional demo instead of failing.

mod generator;

pub use generator::{FallbackConfig, FallbackGenerator};
