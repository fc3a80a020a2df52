//! Property tracks: ordered keyframes for one property, resolved into timed
//! interpolation segments.
//!
//! Resolution walks keyframes in insertion order keeping a running `from` value
//! and a running start time:
//! - step keys last their own duration
//! - percentage keys end at `percent * total`
//! - offset keys add to the running value or to the initial value, per [`OffsetMode`]
//! - the first key is always emitted; later zero-length or no-op segments are elided
//! - key effects fire at their segment start whether or not the segment is elided

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::easing::Ease;
use crate::error::{AnimationError, Result};
use crate::keyframe::{Effect, KeyTiming, KeyValue, Keyframe, ValueFn};
use crate::property::Property;
use crate::target::{Animatable, TargetRef};
use crate::timeline::{Interpolation, PlayableTimeline, ValueSink};
use crate::value::{add, Value, ValueKind};
use cadence_api_core::ValueOp;

/// What offset keyframes are added to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetMode {
    /// The value resolved by the previous keyframe.
    #[default]
    Running,
    /// The track's starting value.
    Initial,
}

/// Everything track resolution needs from its caller.
pub struct ScheduleCtx<'a> {
    pub timeline: &'a mut dyn PlayableTimeline,
    pub config: &'a Config,
    /// Total duration of the enclosing sequence, used by percentage keys when
    /// the track has none of its own.
    pub duration_hint: Option<f32>,
}

impl<'a> ScheduleCtx<'a> {
    pub fn new(timeline: &'a mut dyn PlayableTimeline, config: &'a Config) -> Self {
        Self {
            timeline,
            config,
            duration_hint: None,
        }
    }

    pub fn with_duration_hint(mut self, hint: Option<f32>) -> Self {
        self.duration_hint = hint;
        self
    }
}

/// Output of [`PropertyTween::resolve`].
pub struct Resolution<T> {
    /// Retained segments in keyframe order.
    pub segments: Vec<Interpolation>,
    /// Key effects with their absolute start times.
    pub effects: Vec<(f32, Effect<T>)>,
    /// Elapsed duration of the whole track.
    pub duration: f32,
}

impl<T> fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("segments", &self.segments)
            .field(
                "effects",
                &self.effects.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            )
            .field("duration", &self.duration)
            .finish()
    }
}

pub struct PropertyTween<T: Animatable> {
    property: Arc<dyn Property<T>>,
    keys: Vec<Keyframe<T>>,
    from: Option<ValueFn<T>>,
    offset_mode: OffsetMode,
    ease: Option<Ease>,
    duration: Option<f32>,
}

impl<T: Animatable> Clone for PropertyTween<T> {
    fn clone(&self) -> Self {
        Self {
            property: Arc::clone(&self.property),
            keys: self.keys.clone(),
            from: self.from.clone(),
            offset_mode: self.offset_mode,
            ease: self.ease,
            duration: self.duration,
        }
    }
}

impl<T: Animatable> fmt::Debug for PropertyTween<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTween")
            .field("property", &self.property.name())
            .field("keys", &self.keys)
            .field("from", &self.from.is_some())
            .field("offset_mode", &self.offset_mode)
            .field("ease", &self.ease)
            .field("duration", &self.duration)
            .finish()
    }
}

impl<T: Animatable> PropertyTween<T> {
    pub fn new(property: Arc<dyn Property<T>>) -> Self {
        Self {
            property,
            keys: Vec::new(),
            from: None,
            offset_mode: OffsetMode::Running,
            ease: None,
            duration: None,
        }
    }

    pub fn property(&self) -> &Arc<dyn Property<T>> {
        &self.property
    }

    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    pub fn own_duration(&self) -> Option<f32> {
        self.duration
    }

    /// Start from a fixed value instead of reading the property.
    pub fn from(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.from = Some(Arc::new(move |_: &T| value.clone()));
        self
    }

    pub fn from_fn(mut self, f: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        self.from = Some(Arc::new(f));
        self
    }

    pub fn offset_mode(mut self, mode: OffsetMode) -> Self {
        self.offset_mode = mode;
        self
    }

    pub fn relative_to_initial(self) -> Self {
        self.offset_mode(OffsetMode::Initial)
    }

    /// Easing for keys that do not name their own.
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = Some(ease);
        self
    }

    /// Total duration for percentage keys when the enclosing sequence sets none.
    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn key(mut self, key: Keyframe<T>) -> Self {
        self.keys.push(key);
        self
    }

    pub fn step(self, duration: f32, to: impl Into<Value>) -> Self {
        self.key(Keyframe::step(duration, KeyValue::to(to)))
    }

    pub fn step_by(self, duration: f32, offset: impl Into<Value>) -> Self {
        self.key(Keyframe::step(duration, KeyValue::by(offset)))
    }

    pub fn key_at(self, percent: f32, to: impl Into<Value>) -> Self {
        self.key(Keyframe::percent(percent, KeyValue::to(to)))
    }

    pub fn key_at_by(self, percent: f32, offset: impl Into<Value>) -> Self {
        self.key(Keyframe::percent(percent, KeyValue::by(offset)))
    }

    fn total_for_percent(&self, hint: Option<f32>) -> Result<Option<f32>> {
        if !self.keys.iter().any(Keyframe::is_percent) {
            return Ok(None);
        }
        let total = hint.or(self.duration).unwrap_or(0.0);
        if !(total > 0.0 && total.is_finite()) {
            return Err(AnimationError::InvalidDuration {
                what: self.property.name().to_string(),
                duration: total,
            });
        }
        Ok(Some(total))
    }

    /// Check the track can play against `target` without resolving values.
    pub fn validate(&self, target: &T, hint: Option<f32>) -> Result<()> {
        if self.keys.is_empty() {
            return Err(AnimationError::empty(format!(
                "track '{}' has no keyframes",
                self.property.name()
            )));
        }
        if !self.property.ignores_target() && !self.property.is_compatible(target) {
            return Err(AnimationError::IncompatibleProperty {
                property: self.property.name().to_string(),
            });
        }
        for key in &self.keys {
            let bad = match key.timing {
                KeyTiming::Step(d) => (!d.is_finite() || d < 0.0).then_some(d),
                KeyTiming::Percent(p) => (!(0.0..=1.0).contains(&p)).then_some(p),
            };
            if let Some(value) = bad {
                return Err(AnimationError::InvalidDuration {
                    what: self.property.name().to_string(),
                    duration: value,
                });
            }
        }
        self.total_for_percent(hint).map(|_| ())
    }

    /// Resolve keyframes against `target` into timed segments.
    pub fn resolve(
        &self,
        target: &T,
        config: &Config,
        hint: Option<f32>,
        initial_delay: f32,
    ) -> Result<Resolution<T>> {
        self.validate(target, hint)?;
        let total = self.total_for_percent(hint)?.unwrap_or(0.0);

        let initial = match &self.from {
            Some(f) => f(target),
            None => self.property.get(target)?,
        };
        let mut from = initial.clone();
        let mut start = 0.0f32;
        let mut segments = Vec::with_capacity(self.keys.len());
        let mut effects = Vec::new();

        for (i, key) in self.keys.iter().enumerate() {
            let (duration, end) = match key.timing {
                KeyTiming::Step(d) => (d, start + d),
                KeyTiming::Percent(p) => {
                    let end = p * total;
                    (end - start, end)
                }
            };
            let to = match &key.value {
                KeyValue::Absolute(f) => f(target),
                KeyValue::Offset(f) => {
                    let base = match self.offset_mode {
                        OffsetMode::Running => &from,
                        OffsetMode::Initial => &initial,
                    };
                    add(base, &f(target))?
                }
            };
            if to.kind() != from.kind() {
                return Err(mismatch(from.kind(), to.kind()));
            }

            let seg_start = start + initial_delay;
            if let Some(effect) = &key.effect {
                effects.push((seg_start, Arc::clone(effect)));
            }
            let ease = key.ease.or(self.ease).unwrap_or(config.default_ease);

            if i == 0 {
                let collapse = matches!(key.timing, KeyTiming::Percent(p) if p == 0.0);
                let (seg_from, seg_duration) = if collapse {
                    (to.clone(), 0.0)
                } else {
                    (from.clone(), duration.max(0.0))
                };
                segments.push(Interpolation {
                    from: seg_from,
                    to: to.clone(),
                    start: seg_start,
                    duration: seg_duration,
                    ease,
                });
            } else if duration <= 0.0 || from.approx_eq(&to, config.epsilon) {
                trace!(
                    "track '{}': eliding key {i} (duration {duration:.3})",
                    self.property.name()
                );
            } else {
                segments.push(Interpolation {
                    from: from.clone(),
                    to: to.clone(),
                    start: seg_start,
                    duration,
                    ease,
                });
            }

            from = to;
            start = start.max(end);
        }

        Ok(Resolution {
            segments,
            effects,
            duration: start,
        })
    }

    fn sink(&self, target: &TargetRef<T>) -> ValueSink {
        let property = Arc::clone(&self.property);
        if property.ignores_target() {
            return Box::new(move |value: &Value| {
                property.set_detached(value);
            });
        }
        let target = target.clone();
        Box::new(move |value: &Value| match target.with(|t| property.set(t, value)) {
            Some(true) => {}
            Some(false) => trace!("'{}' rejected {value:?}", property.name()),
            None => trace!("'{}': target dropped, skipping write", property.name()),
        })
    }

    /// Resolve and hand segments to the timeline; returns the track duration.
    ///
    /// A target that is already gone yields `Ok(0.0)` without scheduling.
    pub fn schedule(
        &self,
        ctx: &mut ScheduleCtx<'_>,
        target: &TargetRef<T>,
        initial_delay: f32,
    ) -> Result<f32> {
        let Some(resolution) =
            target.with(|t| self.resolve(t, ctx.config, ctx.duration_hint, initial_delay))
        else {
            trace!("track '{}' skipped: target dropped", self.property.name());
            return Ok(0.0);
        };
        let resolution = resolution?;

        for (start, effect) in resolution.effects {
            let target = target.clone();
            ctx.timeline.schedule_callback(
                start,
                Box::new(move || {
                    if target.with(|t| effect(t)).is_none() {
                        trace!("key effect skipped: target dropped");
                    }
                }),
            );
        }
        let count = resolution.segments.len();
        for segment in resolution.segments {
            ctx.timeline
                .schedule_interpolation(segment, self.sink(target));
        }
        debug!(
            "scheduled track '{}': {count} segment(s), {:.3}s from {initial_delay:.3}s",
            self.property.name(),
            resolution.duration
        );
        Ok(resolution.duration)
    }
}

fn mismatch(left: ValueKind, right: ValueKind) -> AnimationError {
    AnimationError::UnsupportedValueKind {
        op: ValueOp::Lerp,
        left,
        right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::IndexedProperty;
    use crate::target::Capabilities;

    struct Dot {
        x: f32,
    }

    impl Animatable for Dot {
        fn capabilities(&self) -> Capabilities {
            Capabilities::SPATIAL_2D
        }
        fn get_indexed(&self, path: &str) -> Option<Value> {
            (path == "x").then(|| Value::f(self.x))
        }
        fn set_indexed(&mut self, path: &str, value: &Value) -> bool {
            match (path, value) {
                ("x", Value::Float(v)) => {
                    self.x = *v;
                    true
                }
                _ => false,
            }
        }
    }

    fn x_track() -> PropertyTween<Dot> {
        PropertyTween::new(IndexedProperty::new("x").shared())
    }

    fn targets(r: &Resolution<Dot>) -> Vec<f32> {
        r.segments
            .iter()
            .map(|s| s.to.as_float().unwrap())
            .collect()
    }

    #[test]
    fn empty_track_fails() {
        let err = x_track()
            .resolve(&Dot { x: 0.0 }, &Config::default(), None, 0.0)
            .unwrap_err();
        assert!(matches!(err, AnimationError::EmptyAnimation { .. }));
    }

    #[test]
    fn percent_keys_need_duration() {
        let track = x_track().key_at(0.5, 1.0);
        let err = track
            .resolve(&Dot { x: 0.0 }, &Config::default(), None, 0.0)
            .unwrap_err();
        assert!(matches!(err, AnimationError::InvalidDuration { .. }));
        assert!(track
            .resolve(&Dot { x: 0.0 }, &Config::default(), Some(2.0), 0.0)
            .is_ok());
    }

    #[test]
    fn running_offsets_chain() {
        let track = x_track().step_by(1.0, 10.0).step_by(1.0, -5.0).step_by(1.0, 0.0);
        let r = track
            .resolve(&Dot { x: 3.0 }, &Config::default(), None, 0.0)
            .unwrap();
        // Trailing zero offset is a no-op and gets elided.
        assert_eq!(targets(&r), vec![13.0, 8.0]);
        assert_eq!(r.duration, 3.0);
    }

    #[test]
    fn initial_offsets_reset_to_start() {
        let track = x_track()
            .relative_to_initial()
            .step_by(1.0, 10.0)
            .step_by(1.0, -5.0)
            .step_by(1.0, 0.0);
        let r = track
            .resolve(&Dot { x: 3.0 }, &Config::default(), None, 0.0)
            .unwrap();
        assert_eq!(targets(&r), vec![13.0, -2.0, 3.0]);
    }

    #[test]
    fn zero_percent_first_key_is_a_hard_set() {
        let track = x_track().duration(2.0).key_at(0.0, 5.0).key_at(1.0, 7.0);
        let r = track
            .resolve(&Dot { x: 0.0 }, &Config::default(), None, 0.5)
            .unwrap();
        assert_eq!(r.segments[0].from, Value::f(5.0));
        assert_eq!(r.segments[0].duration, 0.0);
        assert_eq!(r.segments[1].start, 0.5);
        assert_eq!(r.segments[1].duration, 2.0);
    }

    #[test]
    fn ease_resolution_order() {
        let cfg = Config {
            default_ease: Ease::SineOut,
            ..Config::default()
        };
        let track = x_track()
            .ease(Ease::QuadIn)
            .key(Keyframe::step(1.0, KeyValue::to(1.0)).with_ease(Ease::CubicOut))
            .step(1.0, 2.0);
        let r = track.resolve(&Dot { x: 0.0 }, &cfg, None, 0.0).unwrap();
        assert_eq!(r.segments[0].ease, Ease::CubicOut);
        assert_eq!(r.segments[1].ease, Ease::QuadIn);
        let plain = x_track().step(1.0, 1.0);
        let r = plain.resolve(&Dot { x: 0.0 }, &cfg, None, 0.0).unwrap();
        assert_eq!(r.segments[0].ease, Ease::SineOut);
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let track = x_track().step(1.0, Value::vec2(1.0, 1.0));
        let err = track
            .resolve(&Dot { x: 0.0 }, &Config::default(), None, 0.0)
            .unwrap_err();
        assert!(matches!(err, AnimationError::UnsupportedValueKind { .. }));
    }

    #[test]
    fn incompatible_property_is_rejected() {
        let track = PropertyTween::<Dot>::new(IndexedProperty::new("y").shared()).step(1.0, 1.0);
        let err = track
            .resolve(&Dot { x: 0.0 }, &Config::default(), None, 0.0)
            .unwrap_err();
        assert!(matches!(err, AnimationError::IncompatibleProperty { .. }));
    }
}
