//! Property adapters: what a track reads and writes on its target.
//!
//! Variants:
//! - [`IndexedProperty`]: direct state addressed by path
//! - [`RelativePositionProperty`]: position expressed as a fraction of the target's size
//! - [`CallbackProperty`]: pure callback, never touches the target
//!
//! Each adapter declares the capability tags it needs once; compatibility is
//! checked against the target's tags at play time.

use std::fmt;
use std::sync::Arc;

use crate::error::{AnimationError, Result};
use crate::target::{Animatable, Capabilities};
use crate::value::Value;

pub trait Property<T: Animatable>: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Capability tags a target must report.
    fn required(&self) -> Capabilities {
        Capabilities::NONE
    }

    fn get(&self, target: &T) -> Result<Value>;

    /// Write a value; returns false when the target rejected it.
    fn set(&self, target: &mut T, value: &Value) -> bool;

    fn is_compatible(&self, target: &T) -> bool {
        target.capabilities().contains(self.required())
    }

    /// Properties that never read or write the target are driven through
    /// [`Property::set_detached`] and skip compatibility checks.
    fn ignores_target(&self) -> bool {
        false
    }

    fn set_detached(&self, _value: &Value) -> bool {
        false
    }
}

fn incompatible(name: &str) -> AnimationError {
    AnimationError::IncompatibleProperty {
        property: name.to_string(),
    }
}

/// State addressed directly by path.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedProperty {
    path: String,
    required: Capabilities,
}

impl IndexedProperty {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            required: Capabilities::NONE,
        }
    }

    pub fn requires(mut self, caps: Capabilities) -> Self {
        self.required = self.required | caps;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn shared<T: Animatable>(self) -> Arc<dyn Property<T>> {
        Arc::new(self)
    }
}

impl<T: Animatable> Property<T> for IndexedProperty {
    fn name(&self) -> &str {
        &self.path
    }

    fn required(&self) -> Capabilities {
        self.required
    }

    fn get(&self, target: &T) -> Result<Value> {
        target
            .get_indexed(&self.path)
            .ok_or_else(|| incompatible(&self.path))
    }

    fn set(&self, target: &mut T, value: &Value) -> bool {
        target.set_indexed(&self.path, value)
    }

    fn is_compatible(&self, target: &T) -> bool {
        target.capabilities().contains(self.required) && target.get_indexed(&self.path).is_some()
    }
}

/// Position expressed as a fraction of the target's own size: `(1, 0)` is one
/// full width to the right of the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct RelativePositionProperty {
    name: String,
    position_path: String,
    size_path: String,
}

impl RelativePositionProperty {
    pub fn new(position_path: impl Into<String>, size_path: impl Into<String>) -> Self {
        let position_path = position_path.into();
        Self {
            name: format!("{position_path}%"),
            position_path,
            size_path: size_path.into(),
        }
    }

    fn size_of<T: Animatable>(&self, target: &T) -> Option<[f32; 2]> {
        target.get_indexed(&self.size_path)?.as_vec2()
    }
}

impl Default for RelativePositionProperty {
    fn default() -> Self {
        Self::new("position", "size")
    }
}

impl<T: Animatable> Property<T> for RelativePositionProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn required(&self) -> Capabilities {
        Capabilities::LAYOUT
    }

    fn get(&self, target: &T) -> Result<Value> {
        let size = self
            .size_of(target)
            .ok_or_else(|| incompatible(&self.name))?;
        let pos = target
            .get_indexed(&self.position_path)
            .and_then(|v| v.as_vec2())
            .ok_or_else(|| incompatible(&self.name))?;
        let frac = |p: f32, s: f32| if s == 0.0 { 0.0 } else { p / s };
        Ok(Value::vec2(frac(pos[0], size[0]), frac(pos[1], size[1])))
    }

    fn set(&self, target: &mut T, value: &Value) -> bool {
        let (Some(size), Some(frac)) = (self.size_of(target), value.as_vec2()) else {
            return false;
        };
        let pos = Value::vec2(frac[0] * size[0], frac[1] * size[1]);
        target.set_indexed(&self.position_path, &pos)
    }

    fn is_compatible(&self, target: &T) -> bool {
        target.capabilities().contains(Capabilities::LAYOUT)
            && self.size_of(target).is_some()
            && target
                .get_indexed(&self.position_path)
                .and_then(|v| v.as_vec2())
                .is_some()
    }
}

pub type ValueSinkFn = Arc<dyn Fn(&Value) + Send + Sync>;

/// Pure callback property: receives interpolated values, ignores the target.
#[derive(Clone)]
pub struct CallbackProperty {
    name: String,
    initial: Value,
    sink: ValueSinkFn,
}

impl CallbackProperty {
    /// `initial` is reported as the current value when a track has no explicit `from`.
    pub fn new(
        name: impl Into<String>,
        initial: Value,
        sink: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            initial,
            sink: Arc::new(sink),
        }
    }
}

impl fmt::Debug for CallbackProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackProperty")
            .field("name", &self.name)
            .field("initial", &self.initial)
            .finish()
    }
}

impl<T: Animatable> Property<T> for CallbackProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, _target: &T) -> Result<Value> {
        Ok(self.initial.clone())
    }

    fn set(&self, _target: &mut T, value: &Value) -> bool {
        (self.sink)(value);
        true
    }

    fn is_compatible(&self, _target: &T) -> bool {
        true
    }

    fn ignores_target(&self) -> bool {
        true
    }

    fn set_detached(&self, value: &Value) -> bool {
        (self.sink)(value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Panel {
        pos: [f32; 2],
        size: [f32; 2],
    }

    impl Animatable for Panel {
        fn capabilities(&self) -> Capabilities {
            Capabilities::LAYOUT
        }
        fn get_indexed(&self, path: &str) -> Option<Value> {
            match path {
                "position" => Some(Value::Vec2(self.pos)),
                "size" => Some(Value::Vec2(self.size)),
                _ => None,
            }
        }
        fn set_indexed(&mut self, path: &str, value: &Value) -> bool {
            match (path, value) {
                ("position", Value::Vec2(v)) => {
                    self.pos = *v;
                    true
                }
                _ => false,
            }
        }
    }

    #[test]
    fn indexed_property_checks_caps_and_path() {
        let panel = Panel {
            pos: [0.0, 0.0],
            size: [10.0, 10.0],
        };
        let ok = IndexedProperty::new("position").requires(Capabilities::LAYOUT);
        let wrong_caps = IndexedProperty::new("position").requires(Capabilities::SPATIAL_3D);
        let missing = IndexedProperty::new("rotation");
        assert!(Property::<Panel>::is_compatible(&ok, &panel));
        assert!(!Property::<Panel>::is_compatible(&wrong_caps, &panel));
        assert!(!Property::<Panel>::is_compatible(&missing, &panel));
        assert!(matches!(
            Property::<Panel>::get(&missing, &panel),
            Err(AnimationError::IncompatibleProperty { .. })
        ));
    }

    #[test]
    fn relative_position_scales_by_size() {
        let mut panel = Panel {
            pos: [50.0, 20.0],
            size: [100.0, 40.0],
        };
        let prop = RelativePositionProperty::default();
        assert_eq!(prop.get(&panel).unwrap(), Value::vec2(0.5, 0.5));
        assert!(prop.set(&mut panel, &Value::vec2(-1.0, 0.25)));
        assert_eq!(panel.pos, [-100.0, 10.0]);
    }

    #[test]
    fn callback_property_ignores_target() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let prop = CallbackProperty::new("counter", Value::f(3.0), move |v| {
            sink.lock().unwrap().push(v.clone());
        });
        assert!(Property::<Panel>::ignores_target(&prop));
        assert!(Property::<Panel>::set_detached(&prop, &Value::f(1.0)));
        assert_eq!(seen.lock().unwrap().as_slice(), &[Value::f(1.0)]);
    }
}
