//! Animatable targets, capability tags and liveness-checked references.
//!
//! Hosts share targets as [`Shared<T>`]. Everything the runtime keeps around after
//! scheduling holds a [`TargetRef<T>`] instead, so a target dropped by the host is
//! detected at the firing boundary and skipped rather than kept alive.

use std::fmt;
use std::ops::BitOr;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Small closed set of capability tags a target type reports once.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    /// Has a 2D position/rotation/scale.
    pub const SPATIAL_2D: Capabilities = Capabilities(1 << 0);
    /// Has a 3D position/rotation/scale.
    pub const SPATIAL_3D: Capabilities = Capabilities(1 << 1);
    /// Has a laid-out size (widgets, controls).
    pub const LAYOUT: Capabilities = Capabilities(1 << 2);
    /// Has color/opacity.
    pub const VISUAL: Capabilities = Capabilities(1 << 3);

    #[inline]
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parse a tag name as used in stored definitions.
    pub fn from_tag(tag: &str) -> Option<Capabilities> {
        match tag.to_ascii_lowercase().as_str() {
            "spatial_2d" | "2d" => Some(Self::SPATIAL_2D),
            "spatial_3d" | "3d" => Some(Self::SPATIAL_3D),
            "layout" => Some(Self::LAYOUT),
            "visual" => Some(Self::VISUAL),
            _ => None,
        }
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::SPATIAL_2D, "SPATIAL_2D"),
            (Self::SPATIAL_3D, "SPATIAL_3D"),
            (Self::LAYOUT, "LAYOUT"),
            (Self::VISUAL, "VISUAL"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(c, _)| !c.is_empty() && self.contains(*c))
            .map(|(_, n)| *n)
            .collect();
        write!(f, "Capabilities({})", set.join(" | "))
    }
}

/// Host object that tracks can drive.
///
/// `get_indexed`/`set_indexed` address state by property path (e.g. `"position"`,
/// `"modulate:a"`). Paths the target does not expose return `None` / `false`.
pub trait Animatable: Send + 'static {
    fn capabilities(&self) -> Capabilities;
    fn get_indexed(&self, path: &str) -> Option<Value>;
    fn set_indexed(&mut self, path: &str, value: &Value) -> bool;
}

/// Strong, host-owned handle to a target.
pub type Shared<T> = Arc<Mutex<T>>;

/// Wrap a target for animation.
pub fn shared<T>(target: T) -> Shared<T> {
    Arc::new(Mutex::new(target))
}

/// Lock a target, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(target: &Mutex<T>) -> MutexGuard<'_, T> {
    target.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Weak reference to a target, checked for liveness at every use.
pub struct TargetRef<T> {
    inner: Weak<Mutex<T>>,
}

impl<T> TargetRef<T> {
    pub fn new(target: &Shared<T>) -> Self {
        Self {
            inner: Arc::downgrade(target),
        }
    }

    /// A reference that never resolves.
    pub fn dangling() -> Self {
        Self { inner: Weak::new() }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn upgrade(&self) -> Option<Shared<T>> {
        self.inner.upgrade()
    }

    /// Run `f` against the live target; `None` when it has been dropped.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let strong = self.inner.upgrade()?;
        let mut guard = lock(&strong);
        Some(f(&mut guard))
    }

    /// Same target (pointer identity)?
    pub fn ptr_eq(&self, other: &TargetRef<T>) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<T> Clone for TargetRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for TargetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<T> From<&Shared<T>> for TargetRef<T> {
    fn from(target: &Shared<T>) -> Self {
        TargetRef::new(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_contain_subsets() {
        let caps = Capabilities::SPATIAL_2D | Capabilities::VISUAL;
        assert!(caps.contains(Capabilities::SPATIAL_2D));
        assert!(caps.contains(Capabilities::NONE));
        assert!(!caps.contains(Capabilities::LAYOUT));
        assert_eq!(Capabilities::from_tag("Layout"), Some(Capabilities::LAYOUT));
        assert_eq!(format!("{caps:?}"), "Capabilities(SPATIAL_2D | VISUAL)");
    }

    #[test]
    fn target_ref_detects_drop() {
        let target = shared(5u32);
        let weak = TargetRef::new(&target);
        assert_eq!(weak.with(|v| *v + 1), Some(6));
        drop(target);
        assert!(!weak.is_alive());
        assert_eq!(weak.with(|v| *v), None);
        assert!(!TargetRef::<u32>::dangling().is_alive());
    }
}
