//! Value arithmetic over the closed numeric set:
//! - add / sub (offset chaining)
//! - lerp (component-wise blend)
//!
//! Both operands must share a numeric kind. Anything else is rejected with
//! [`ValueError::UnsupportedKind`]; there is no implicit broadcasting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{Value, ValueKind};

/// Operation names reported in errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOp {
    Add,
    Sub,
    Lerp,
}

impl std::fmt::Display for ValueOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueOp::Add => "add",
            ValueOp::Sub => "sub",
            ValueOp::Lerp => "lerp",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("unsupported value kinds for {op}: {left:?} and {right:?}")]
    UnsupportedKind {
        op: ValueOp,
        left: ValueKind,
        right: ValueKind,
    },
}

#[inline]
fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn zip_with<const N: usize>(a: [f32; N], b: [f32; N], f: impl Fn(f32, f32) -> f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = f(a[i], b[i]);
    }
    out
}

fn combine(
    op: ValueOp,
    a: &Value,
    b: &Value,
    f: impl Fn(f32, f32) -> f32,
) -> Result<Value, ValueError> {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(f(*x, *y))),
        (Value::Vec2(x), Value::Vec2(y)) => Ok(Value::Vec2(zip_with(*x, *y, f))),
        (Value::Vec3(x), Value::Vec3(y)) => Ok(Value::Vec3(zip_with(*x, *y, f))),
        (Value::ColorRgba(x), Value::ColorRgba(y)) => Ok(Value::ColorRgba(zip_with(*x, *y, f))),
        _ => Err(ValueError::UnsupportedKind {
            op,
            left: a.kind(),
            right: b.kind(),
        }),
    }
}

/// `a + b`, component-wise.
pub fn add(a: &Value, b: &Value) -> Result<Value, ValueError> {
    combine(ValueOp::Add, a, b, |x, y| x + y)
}

/// `a - b`, component-wise.
pub fn sub(a: &Value, b: &Value) -> Result<Value, ValueError> {
    combine(ValueOp::Sub, a, b, |x, y| x - y)
}

/// Linear blend from `a` (t = 0) to `b` (t = 1). `t` is not clamped so eased
/// curves that overshoot extrapolate naturally.
pub fn lerp(a: &Value, b: &Value, t: f32) -> Result<Value, ValueError> {
    combine(ValueOp::Lerp, a, b, |x, y| lerp_f32(x, y, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_sub_are_component_wise() {
        let a = Value::vec3(1.0, 2.0, 3.0);
        let b = Value::vec3(0.5, -2.0, 1.0);
        assert_eq!(add(&a, &b).unwrap(), Value::vec3(1.5, 0.0, 4.0));
        assert_eq!(sub(&a, &b).unwrap(), Value::vec3(0.5, 4.0, 2.0));
    }

    #[test]
    fn lerp_scalar_and_color() {
        assert_eq!(lerp(&Value::f(0.0), &Value::f(10.0), 0.25).unwrap(), Value::f(2.5));
        let c = lerp(
            &Value::rgba(0.0, 0.0, 0.0, 1.0),
            &Value::rgba(1.0, 0.5, 0.0, 0.0),
            0.5,
        )
        .unwrap();
        assert_eq!(c, Value::rgba(0.5, 0.25, 0.0, 0.5));
    }

    #[test]
    fn lerp_extrapolates_outside_unit_range() {
        assert_eq!(lerp(&Value::f(0.0), &Value::f(10.0), 1.5).unwrap(), Value::f(15.0));
    }

    #[test]
    fn mismatched_or_non_numeric_kinds_fail() {
        let err = add(&Value::f(1.0), &Value::vec2(1.0, 1.0)).unwrap_err();
        assert_eq!(
            err,
            ValueError::UnsupportedKind {
                op: ValueOp::Add,
                left: ValueKind::Float,
                right: ValueKind::Vec2,
            }
        );
        assert!(lerp(&Value::Bool(true), &Value::Bool(false), 0.5).is_err());
        assert!(sub(&Value::Text("a".into()), &Value::Text("b".into())).is_err());
    }
}
