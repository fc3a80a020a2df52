//! cadence-api-core: the value set shared by every cadence crate (engine-agnostic)

pub mod ops;
pub mod value;

pub use ops::{add, lerp, sub, ValueError, ValueOp};
pub use value::{Value, ValueKind};
