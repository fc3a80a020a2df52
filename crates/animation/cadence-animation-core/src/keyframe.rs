//! Keyframe data model: one transition segment of a track.
//!
//! A keyframe is either a *step* (explicit duration) or a *percentage key*
//! (end time = percent × total duration). Its target is either absolute or an
//! offset added to the track's chaining base. Keyframes are immutable once added.

use std::fmt;
use std::sync::Arc;

use crate::easing::Ease;
use crate::value::Value;

/// Target-dependent value producer.
pub type ValueFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// Side effect run against the target.
pub type Effect<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyTiming {
    /// Segment lasts this many seconds.
    Step(f32),
    /// Segment ends at this fraction of the total duration.
    Percent(f32),
}

pub enum KeyValue<T> {
    /// Go to this value.
    Absolute(ValueFn<T>),
    /// Go to the chaining base plus this value.
    Offset(ValueFn<T>),
}

impl<T: 'static> KeyValue<T> {
    pub fn to(value: impl Into<Value>) -> Self {
        let value = value.into();
        KeyValue::Absolute(Arc::new(move |_: &T| value.clone()))
    }

    pub fn by(offset: impl Into<Value>) -> Self {
        let offset = offset.into();
        KeyValue::Offset(Arc::new(move |_: &T| offset.clone()))
    }

    pub fn to_fn(f: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        KeyValue::Absolute(Arc::new(f))
    }

    pub fn by_fn(f: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        KeyValue::Offset(Arc::new(f))
    }

    #[inline]
    pub fn is_offset(&self) -> bool {
        matches!(self, KeyValue::Offset(_))
    }

    pub fn eval(&self, target: &T) -> Value {
        match self {
            KeyValue::Absolute(f) | KeyValue::Offset(f) => f(target),
        }
    }
}

impl<T> Clone for KeyValue<T> {
    fn clone(&self) -> Self {
        match self {
            KeyValue::Absolute(f) => KeyValue::Absolute(Arc::clone(f)),
            KeyValue::Offset(f) => KeyValue::Offset(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for KeyValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyValue::Absolute(_) => "Absolute(..)",
            KeyValue::Offset(_) => "Offset(..)",
        })
    }
}

pub struct Keyframe<T> {
    pub timing: KeyTiming,
    pub value: KeyValue<T>,
    /// Overrides the track's default easing for this segment.
    pub ease: Option<Ease>,
    /// Fired at the segment's start time, even when the segment itself is elided.
    pub effect: Option<Effect<T>>,
}

impl<T> Keyframe<T> {
    pub fn step(duration: f32, value: KeyValue<T>) -> Self {
        Self {
            timing: KeyTiming::Step(duration),
            value,
            ease: None,
            effect: None,
        }
    }

    pub fn percent(percent: f32, value: KeyValue<T>) -> Self {
        Self {
            timing: KeyTiming::Percent(percent),
            value,
            ease: None,
            effect: None,
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = Some(ease);
        self
    }

    pub fn with_effect(mut self, effect: impl Fn(&mut T) + Send + Sync + 'static) -> Self {
        self.effect = Some(Arc::new(effect));
        self
    }

    #[inline]
    pub fn is_percent(&self) -> bool {
        matches!(self.timing, KeyTiming::Percent(_))
    }
}

impl<T> Clone for Keyframe<T> {
    fn clone(&self) -> Self {
        Self {
            timing: self.timing,
            value: self.value.clone(),
            ease: self.ease,
            effect: self.effect.clone(),
        }
    }
}

impl<T> fmt::Debug for Keyframe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyframe")
            .field("timing", &self.timing)
            .field("value", &self.value)
            .field("ease", &self.ease)
            .field("effect", &self.effect.is_some())
            .finish()
    }
}
