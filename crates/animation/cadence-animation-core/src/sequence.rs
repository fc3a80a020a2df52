//! Sequences: ordered parallel blocks of tweeners played against a target.
//!
//! Members of one block share a start offset; the block advances the cursor by
//! its longest member. Nested sequences repeat their own block walk `loops`
//! times inside the parent and must therefore loop a finite number of times.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::config::{Config, ProcessMode};
use crate::easing::Ease;
use crate::error::{AnimationError, Result};
use crate::keyframe::{Effect, Keyframe};
use crate::property::Property;
use crate::target::{Animatable, Shared, TargetRef};
use crate::timeline::PlayableTimeline;
use crate::track::{OffsetMode, PropertyTween, ScheduleCtx};
use crate::value::Value;

/// One member of a parallel block.
pub enum Tweener<T: Animatable> {
    Track(PropertyTween<T>),
    /// Fired against the target at the member's start.
    Callback(Effect<T>),
    /// Occupies time without doing anything.
    Pause(f32),
    Nested(Arc<Sequence<T>>),
}

impl<T: Animatable> Clone for Tweener<T> {
    fn clone(&self) -> Self {
        match self {
            Tweener::Track(t) => Tweener::Track(t.clone()),
            Tweener::Callback(f) => Tweener::Callback(Arc::clone(f)),
            Tweener::Pause(d) => Tweener::Pause(*d),
            Tweener::Nested(s) => Tweener::Nested(Arc::clone(s)),
        }
    }
}

impl<T: Animatable> fmt::Debug for Tweener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tweener::Track(t) => f.debug_tuple("Track").field(t).finish(),
            Tweener::Callback(_) => f.write_str("Callback(..)"),
            Tweener::Pause(d) => f.debug_tuple("Pause").field(d).finish(),
            Tweener::Nested(s) => f.debug_tuple("Nested").field(&s.name).finish(),
        }
    }
}

impl<T: Animatable> Tweener<T> {
    fn schedule(
        &self,
        ctx: &mut ScheduleCtx<'_>,
        target: &TargetRef<T>,
        start: f32,
    ) -> Result<f32> {
        match self {
            Tweener::Track(track) => track.schedule(ctx, target, start),
            Tweener::Callback(f) => {
                ctx.timeline
                    .schedule_callback(start, guarded(target, Arc::clone(f), "callback"));
                Ok(0.0)
            }
            Tweener::Pause(d) => Ok(d.max(0.0)),
            Tweener::Nested(seq) => seq.schedule_nested(ctx, target, start),
        }
    }
}

/// Wrap an effect so it only runs while the target is alive.
fn guarded<T: Animatable>(
    target: &TargetRef<T>,
    effect: Effect<T>,
    what: &'static str,
) -> Box<dyn FnMut() + Send> {
    let target = target.clone();
    Box::new(move || {
        if target.with(|t| effect(t)).is_none() {
            trace!("{what} skipped: target dropped");
        }
    })
}

pub struct Sequence<T: Animatable> {
    name: String,
    blocks: Vec<Vec<Tweener<T>>>,
    target: Option<TargetRef<T>>,
    duration: Option<f32>,
    loops: u32,
    speed: f32,
    process: ProcessMode,
    on_start: Option<Effect<T>>,
    join_next: bool,
}

impl<T: Animatable> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            blocks: self.blocks.clone(),
            target: self.target.clone(),
            duration: self.duration,
            loops: self.loops,
            speed: self.speed,
            process: self.process,
            on_start: self.on_start.clone(),
            join_next: self.join_next,
        }
    }
}

impl<T: Animatable> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field("blocks", &self.blocks)
            .field("target", &self.target)
            .field("duration", &self.duration)
            .field("loops", &self.loops)
            .field("speed", &self.speed)
            .field("process", &self.process)
            .field("on_start", &self.on_start.is_some())
            .finish()
    }
}

impl<T: Animatable> Sequence<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            target: None,
            duration: None,
            loops: 1,
            speed: 1.0,
            process: ProcessMode::Idle,
            on_start: None,
            join_next: false,
        }
    }

    // --- accessors ---

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[Vec<Tweener<T>>] {
        &self.blocks
    }

    pub fn loop_count(&self) -> u32 {
        self.loops
    }

    pub fn speed_scale(&self) -> f32 {
        self.speed
    }

    pub fn process(&self) -> ProcessMode {
        self.process
    }

    pub fn total_duration(&self) -> Option<f32> {
        self.duration
    }

    // --- configuration ---

    /// Target used when `play` is not given one.
    pub fn target(&mut self, target: &Shared<T>) -> &mut Self {
        self.target = Some(TargetRef::new(target));
        self
    }

    /// Total duration shared by percentage-keyed tracks; wins over a track's own.
    pub fn duration(&mut self, seconds: f32) -> &mut Self {
        self.duration = Some(seconds);
        self
    }

    /// `1` plays once, `0` loops forever.
    pub fn loops(&mut self, loops: u32) -> &mut Self {
        self.loops = loops;
        self
    }

    pub fn speed(&mut self, speed: f32) -> &mut Self {
        self.speed = speed;
        self
    }

    pub fn process_mode(&mut self, mode: ProcessMode) -> &mut Self {
        self.process = mode;
        self
    }

    /// Run once against each target before its blocks are scheduled.
    pub fn on_start(&mut self, f: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.on_start = Some(Arc::new(f));
        self
    }

    // --- composition ---

    /// The next tweener joins the current block instead of starting a new one.
    pub fn parallel(&mut self) -> &mut Self {
        self.join_next = true;
        self
    }

    /// The next tweener starts a new block (default).
    pub fn chain(&mut self) -> &mut Self {
        self.join_next = false;
        self
    }

    fn push(&mut self, tweener: Tweener<T>) -> &mut Self {
        match self.blocks.last_mut() {
            Some(block) if self.join_next => block.push(tweener),
            _ => self.blocks.push(vec![tweener]),
        }
        self.join_next = false;
        self
    }

    /// Start a track on `property`; `done()` commits it.
    pub fn animate(&mut self, property: Arc<dyn Property<T>>) -> TrackBuilder<'_, T> {
        TrackBuilder {
            owner: self,
            track: PropertyTween::new(property),
        }
    }

    pub fn add_track(&mut self, track: PropertyTween<T>) -> &mut Self {
        self.push(Tweener::Track(track))
    }

    pub fn wait(&mut self, seconds: f32) -> &mut Self {
        self.push(Tweener::Pause(seconds))
    }

    pub fn callback(&mut self, f: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.push(Tweener::Callback(Arc::new(f)))
    }

    pub fn sequence(&mut self, nested: impl Into<Arc<Sequence<T>>>) -> &mut Self {
        self.push(Tweener::Nested(nested.into()))
    }

    // --- playback ---

    /// Structural checks that need no target.
    pub fn validate(&self) -> Result<()> {
        if self.blocks.is_empty() {
            return Err(AnimationError::empty(format!(
                "sequence '{}' has no blocks",
                self.name
            )));
        }
        for tweener in self.blocks.iter().flatten() {
            if let Tweener::Nested(nested) = tweener {
                if nested.loops == 0 {
                    return Err(AnimationError::NestedInfiniteLoop {
                        name: nested.name.clone(),
                    });
                }
                nested.validate()?;
            }
        }
        Ok(())
    }

    fn resolve_target(&self, explicit: Option<&Shared<T>>) -> Result<TargetRef<T>> {
        explicit
            .map(TargetRef::new)
            .or_else(|| self.target.clone())
            .ok_or(AnimationError::NoTarget)
    }

    fn walk(&self, ctx: &mut ScheduleCtx<'_>, target: &TargetRef<T>, delay: f32) -> Result<f32> {
        let parent_hint = ctx.duration_hint;
        ctx.duration_hint = self.duration.or(parent_hint);
        let mut accumulated = 0.0f32;
        let mut walked = Ok(());
        for block in &self.blocks {
            let mut longest = 0.0f32;
            for tweener in block {
                match tweener.schedule(ctx, target, accumulated + delay) {
                    Ok(d) => longest = longest.max(d),
                    Err(e) => {
                        walked = Err(e);
                        break;
                    }
                }
            }
            if walked.is_err() {
                break;
            }
            accumulated += longest;
        }
        ctx.duration_hint = parent_hint;
        walked.map(|()| accumulated)
    }

    fn schedule_nested(
        &self,
        ctx: &mut ScheduleCtx<'_>,
        target: &TargetRef<T>,
        start: f32,
    ) -> Result<f32> {
        if self.loops == 0 {
            return Err(AnimationError::NestedInfiniteLoop {
                name: self.name.clone(),
            });
        }
        if let Some(f) = &self.on_start {
            ctx.timeline
                .schedule_callback(start, guarded(target, Arc::clone(f), "on_start"));
        }
        let mut total = 0.0f32;
        for _ in 0..self.loops {
            total += self.walk(ctx, target, start + total)?;
        }
        trace!(
            "nested '{}' scheduled: {} loop(s), {total:.3}s",
            self.name,
            self.loops
        );
        Ok(total)
    }

    fn apply_settings(&self, timeline: &mut dyn PlayableTimeline) {
        timeline.set_loops(self.loops);
        timeline.set_speed_scale(self.speed);
        timeline.set_process_mode(self.process);
    }

    /// Schedule onto `timeline` against `target` (or the default target).
    ///
    /// Returns the length of one iteration. A dropped target is logged and
    /// yields `Ok(0.0)` with nothing scheduled.
    pub fn schedule(
        &self,
        timeline: &mut dyn PlayableTimeline,
        config: &Config,
        target: Option<&Shared<T>>,
    ) -> Result<f32> {
        self.validate()?;
        let target = self.resolve_target(target)?;
        if !target.is_alive() {
            warn!("sequence '{}': target dropped before play", self.name);
            return Ok(0.0);
        }
        if let Some(f) = &self.on_start {
            target.with(|t| f(t));
        }
        let mut ctx = ScheduleCtx::new(timeline, config);
        let duration = self.walk(&mut ctx, &target, 0.0)?;
        self.apply_settings(timeline);
        debug!(
            "sequence '{}' scheduled: {} block(s), {duration:.3}s, loops={}, speed={}",
            self.name,
            self.blocks.len(),
            self.loops,
            self.speed
        );
        Ok(duration)
    }

    /// Same blocks against every target, target `i` starting `i * delay` later.
    ///
    /// When `(n - 1) * delay` exceeds `max_total_spread` the delay shrinks to
    /// `max_total_spread / (n - 1)`. Dropped targets are skipped. Returns the
    /// end of the latest target's run.
    pub fn schedule_many(
        &self,
        timeline: &mut dyn PlayableTimeline,
        config: &Config,
        targets: &[TargetRef<T>],
        delay_per_target: f32,
        max_total_spread: Option<f32>,
    ) -> Result<f32> {
        self.validate()?;
        if targets.is_empty() {
            return Err(AnimationError::NoTarget);
        }
        let delay = stagger_delay(targets.len(), delay_per_target, max_total_spread);
        let mut ctx = ScheduleCtx::new(timeline, config);
        let mut end = 0.0f32;
        let mut played = 0usize;
        for (i, target) in targets.iter().enumerate() {
            if !target.is_alive() {
                warn!("sequence '{}': skipping dropped target #{i}", self.name);
                continue;
            }
            if let Some(f) = &self.on_start {
                target.with(|t| f(t));
            }
            let offset = i as f32 * delay;
            end = end.max(offset + self.walk(&mut ctx, target, offset)?);
            played += 1;
        }
        self.apply_settings(timeline);
        debug!(
            "sequence '{}' scheduled on {played}/{} target(s), stagger {delay:.3}s, {end:.3}s",
            self.name,
            targets.len()
        );
        Ok(end)
    }
}

/// Per-target delay after applying the optional spread cap.
pub fn stagger_delay(count: usize, delay_per_target: f32, max_total_spread: Option<f32>) -> f32 {
    let delay = delay_per_target.max(0.0);
    if count < 2 {
        return delay;
    }
    let gaps = (count - 1) as f32;
    match max_total_spread {
        Some(cap) if gaps * delay > cap => cap.max(0.0) / gaps,
        _ => delay,
    }
}

/// Track under construction, borrowing the sequence that will own it.
pub struct TrackBuilder<'a, T: Animatable> {
    owner: &'a mut Sequence<T>,
    track: PropertyTween<T>,
}

impl<'a, T: Animatable> TrackBuilder<'a, T> {
    fn map(self, f: impl FnOnce(PropertyTween<T>) -> PropertyTween<T>) -> Self {
        Self {
            owner: self.owner,
            track: f(self.track),
        }
    }

    pub fn from(self, value: impl Into<Value>) -> Self {
        self.map(|t| t.from(value))
    }

    pub fn from_fn(self, f: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        self.map(|t| t.from_fn(f))
    }

    pub fn offset_mode(self, mode: OffsetMode) -> Self {
        self.map(|t| t.offset_mode(mode))
    }

    pub fn relative_to_initial(self) -> Self {
        self.map(PropertyTween::relative_to_initial)
    }

    pub fn ease(self, ease: Ease) -> Self {
        self.map(|t| t.ease(ease))
    }

    pub fn duration(self, seconds: f32) -> Self {
        self.map(|t| t.duration(seconds))
    }

    pub fn key(self, key: Keyframe<T>) -> Self {
        self.map(|t| t.key(key))
    }

    pub fn step(self, duration: f32, to: impl Into<Value>) -> Self {
        self.map(|t| t.step(duration, to))
    }

    pub fn step_by(self, duration: f32, offset: impl Into<Value>) -> Self {
        self.map(|t| t.step_by(duration, offset))
    }

    pub fn key_at(self, percent: f32, to: impl Into<Value>) -> Self {
        self.map(|t| t.key_at(percent, to))
    }

    pub fn key_at_by(self, percent: f32, offset: impl Into<Value>) -> Self {
        self.map(|t| t.key_at_by(percent, offset))
    }

    /// Commit the track to its sequence.
    pub fn done(self) -> &'a mut Sequence<T> {
        self.owner.add_track(self.track)
    }
}
