//! Value types re-exported from cadence-api-core so downstream crates need a single import.

pub use cadence_api_core::{add, lerp, sub, Value, ValueError, ValueKind};
