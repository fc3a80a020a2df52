//! Value: runtime instances animated by tracks.
//! All numeric types use f32.

use serde::{Deserialize, Serialize};

/// Coarse kind of a [`Value`], used for dispatch and error reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Float,
    Vec2,
    Vec3,
    ColorRgba,
    Bool,
    Text,
}

impl ValueKind {
    /// Whether arithmetic (add/sub/lerp) is defined for this kind.
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueKind::Float | ValueKind::Vec2 | ValueKind::Vec3 | ValueKind::ColorRgba
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// RGBA color (linear by convention)
    ColorRgba([f32; 4]),

    /// Boolean; carried through but never interpolated
    Bool(bool),

    /// Text; carried through but never interpolated
    Text(String),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::ColorRgba(_) => ValueKind::ColorRgba,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec2(x: f32, y: f32) -> Self {
        Value::Vec2([x, y])
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Value::ColorRgba([r, g, b, a])
    }

    /// The additive identity of the same kind, or `None` for non-numeric kinds.
    pub fn zero_like(&self) -> Option<Value> {
        match self {
            Value::Float(_) => Some(Value::Float(0.0)),
            Value::Vec2(_) => Some(Value::Vec2([0.0; 2])),
            Value::Vec3(_) => Some(Value::Vec3([0.0; 3])),
            Value::ColorRgba(_) => Some(Value::ColorRgba([0.0; 4])),
            Value::Bool(_) | Value::Text(_) => None,
        }
    }

    /// Numeric components as a slice; empty for non-numeric kinds.
    pub fn components(&self) -> &[f32] {
        match self {
            Value::Float(v) => std::slice::from_ref(v),
            Value::Vec2(v) => &v[..],
            Value::Vec3(v) => &v[..],
            Value::ColorRgba(v) => &v[..],
            Value::Bool(_) | Value::Text(_) => &[],
        }
    }

    /// Component-wise comparison within `eps`. Values of different kinds are never equal;
    /// non-numeric kinds compare exactly.
    pub fn approx_eq(&self, other: &Value, eps: f32) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => self
                .components()
                .iter()
                .zip(other.components())
                .all(|(a, b)| (a - b).abs() <= eps),
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<[f32; 2]> {
        match self {
            Value::Vec2(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Value::Vec2(v)
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Value::Vec3(v)
    }
}
