//! Playable timeline: the primitive that actually advances interpolations.
//!
//! Track and sequence resolution only talk to [`PlayableTimeline`]. [`Timeline`] is
//! the in-crate implementation, advanced by `tick(dt)` from a host update loop:
//! - the cursor moves by `dt * speed`
//! - interpolations are sampled with their easing and delivered to their sink
//! - callbacks fire once per iteration when the cursor reaches their start
//! - on loop wrap every segment is first driven to its final value

use std::fmt;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{Config, ProcessMode};
use crate::easing::Ease;
use crate::value::{lerp, Value};

/// Receives each interpolated value.
pub type ValueSink = Box<dyn FnMut(&Value) + Send>;

/// Fired once per iteration at its start time.
pub type Callback = Box<dyn FnMut() + Send>;

/// One resolved segment handed to the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interpolation {
    pub from: Value,
    pub to: Value,
    /// Seconds from timeline start.
    pub start: f32,
    /// Seconds; zero means "hard set `to` at `start`".
    pub duration: f32,
    pub ease: Ease,
}

impl Interpolation {
    #[inline]
    pub fn end(&self) -> f32 {
        self.start + self.duration.max(0.0)
    }

    /// Value at absolute timeline time `t` (clamped to the segment).
    pub fn sample(&self, t: f32) -> Value {
        let u = if self.duration <= 0.0 {
            1.0
        } else {
            ((t - self.start) / self.duration).clamp(0.0, 1.0)
        };
        self.sample_progress(u)
    }

    fn sample_progress(&self, u: f32) -> Value {
        if !self.from.kind().is_numeric() {
            // Step semantics for non-numeric kinds: hold until the end.
            return if u >= 1.0 { self.to.clone() } else { self.from.clone() };
        }
        lerp(&self.from, &self.to, self.ease.apply(u)).unwrap_or_else(|err| {
            warn!("interpolation fell back to target value: {err}");
            self.to.clone()
        })
    }
}

/// Host-facing timeline contract consumed by track and sequence resolution.
pub trait PlayableTimeline {
    fn schedule_interpolation(&mut self, segment: Interpolation, on_value: ValueSink);
    fn schedule_callback(&mut self, start: f32, callback: Callback);
    /// `0` loops forever, `n` plays n times.
    fn set_loops(&mut self, loops: u32);
    fn set_speed_scale(&mut self, speed: f32);
    fn set_process_mode(&mut self, mode: ProcessMode);
    fn play(&mut self);
    /// Halt and rewind; a later `play` starts over.
    fn stop(&mut self);
    /// Halt and discard everything scheduled; idempotent.
    fn kill(&mut self);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineState {
    /// Built but never played.
    Pending,
    Playing,
    Stopped,
    Finished,
    Killed,
}

enum Entry {
    Tween {
        segment: Interpolation,
        sink: ValueSink,
        done: bool,
    },
    Call {
        start: f32,
        callback: Callback,
        fired: bool,
    },
}

impl Entry {
    fn end(&self) -> f32 {
        match self {
            Entry::Tween { segment, .. } => segment.end(),
            Entry::Call { start, .. } => *start,
        }
    }

    fn rewind(&mut self) {
        match self {
            Entry::Tween { done, .. } => *done = false,
            Entry::Call { fired, .. } => *fired = false,
        }
    }
}

pub struct Timeline {
    entries: Vec<Entry>,
    loops: u32,
    speed: f32,
    mode: ProcessMode,
    state: TimelineState,
    time: f32,
    completed_loops: u32,
    max_wraps: u32,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("entries", &self.entries.len())
            .field("loops", &self.loops)
            .field("speed", &self.speed)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("time", &self.time)
            .finish()
    }
}

impl Timeline {
    pub fn new(cfg: &Config) -> Self {
        Self {
            entries: Vec::new(),
            loops: 1,
            speed: 1.0,
            mode: ProcessMode::Idle,
            state: TimelineState::Pending,
            time: 0.0,
            completed_loops: 0,
            max_wraps: cfg.max_wraps_per_tick.max(1),
        }
    }

    /// Length of one iteration: the latest end among scheduled entries.
    pub fn duration(&self) -> f32 {
        self.entries.iter().map(Entry::end).fold(0.0, f32::max)
    }

    #[inline]
    pub fn state(&self) -> TimelineState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == TimelineState::Playing
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn loops(&self) -> u32 {
        self.loops
    }

    #[inline]
    pub fn speed_scale(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn process_mode(&self) -> ProcessMode {
        self.mode
    }

    #[inline]
    pub fn completed_loops(&self) -> u32 {
        self.completed_loops
    }

    /// Scheduled interpolations in insertion order.
    pub fn segments(&self) -> Vec<&Interpolation> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Tween { segment, .. } => Some(segment),
                Entry::Call { .. } => None,
            })
            .collect()
    }

    /// Start times of scheduled callbacks in insertion order.
    pub fn callback_starts(&self) -> Vec<f32> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Call { start, .. } => Some(*start),
                Entry::Tween { .. } => None,
            })
            .collect()
    }

    fn rewind(&mut self) {
        self.time = 0.0;
        self.completed_loops = 0;
        self.entries.iter_mut().for_each(Entry::rewind);
    }

    fn apply_until(&mut self, t: f32) {
        for entry in &mut self.entries {
            match entry {
                Entry::Call {
                    start,
                    callback,
                    fired,
                } => {
                    if !*fired && t >= *start {
                        *fired = true;
                        callback();
                    }
                }
                Entry::Tween {
                    segment,
                    sink,
                    done,
                } => {
                    if *done || t < segment.start {
                        continue;
                    }
                    let u = if segment.duration <= 0.0 {
                        1.0
                    } else {
                        ((t - segment.start) / segment.duration).min(1.0)
                    };
                    sink(&segment.sample_progress(u));
                    if u >= 1.0 {
                        *done = true;
                    }
                }
            }
        }
    }

    fn finish(&mut self, end: f32) {
        self.time = end;
        self.state = TimelineState::Finished;
        debug!(
            "timeline finished after {} loop(s) of {end:.3}s",
            self.completed_loops
        );
    }

    /// Advance by `dt` seconds of host time.
    pub fn tick(&mut self, dt: f32) -> TimelineState {
        if self.state != TimelineState::Playing {
            return self.state;
        }
        self.time += dt.max(0.0) * self.speed;
        let end = self.duration();
        let infinite = self.loops == 0;
        let mut wraps = 0u32;

        loop {
            self.apply_until(self.time.min(end));
            if self.time < end {
                break;
            }
            self.completed_loops = self.completed_loops.saturating_add(1);
            if end <= 0.0 {
                if infinite {
                    warn!("zero-length timeline set to loop forever; finishing after one pass");
                }
                self.finish(end);
                break;
            }
            if !infinite && self.completed_loops >= self.loops {
                self.finish(end);
                break;
            }

            self.time -= end;
            self.entries.iter_mut().for_each(Entry::rewind);
            wraps += 1;

            if wraps >= self.max_wraps && self.time >= end {
                // Skip whole iterations instead of replaying each one.
                let skipped = (self.time / end).floor() as u32;
                trace!("timeline skipping {skipped} iteration(s) in one tick");
                self.time -= skipped as f32 * end;
                self.completed_loops = self.completed_loops.saturating_add(skipped);
                if !infinite && self.completed_loops >= self.loops {
                    self.completed_loops = self.loops;
                    self.apply_until(end);
                    self.finish(end);
                    break;
                }
            }
        }
        self.state
    }
}

impl PlayableTimeline for Timeline {
    fn schedule_interpolation(&mut self, segment: Interpolation, on_value: ValueSink) {
        self.entries.push(Entry::Tween {
            segment,
            sink: on_value,
            done: false,
        });
    }

    fn schedule_callback(&mut self, start: f32, callback: Callback) {
        self.entries.push(Entry::Call {
            start: start.max(0.0),
            callback,
            fired: false,
        });
    }

    fn set_loops(&mut self, loops: u32) {
        self.loops = loops;
    }

    fn set_speed_scale(&mut self, speed: f32) {
        self.speed = if speed.is_finite() { speed.max(0.0) } else { 1.0 };
    }

    fn set_process_mode(&mut self, mode: ProcessMode) {
        self.mode = mode;
    }

    fn play(&mut self) {
        match self.state {
            TimelineState::Playing | TimelineState::Killed => {}
            TimelineState::Finished => {
                self.rewind();
                self.state = TimelineState::Playing;
            }
            TimelineState::Pending | TimelineState::Stopped => {
                self.state = TimelineState::Playing;
            }
        }
    }

    fn stop(&mut self) {
        if self.state == TimelineState::Killed {
            return;
        }
        self.rewind();
        self.state = TimelineState::Stopped;
    }

    fn kill(&mut self) {
        self.entries.clear();
        self.state = TimelineState::Killed;
    }
}
