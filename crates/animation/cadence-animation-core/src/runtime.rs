//! Runtime: owns playing timelines behind generation-counted handles.

use log::{debug, trace};
use slotmap::{new_key_type, SlotMap};

use crate::config::{Config, ProcessMode};
use crate::error::Result;
use crate::sequence::Sequence;
use crate::target::{Animatable, Shared, TargetRef};
use crate::timeline::{PlayableTimeline, Timeline, TimelineState};

new_key_type! {
    /// Handle to a timeline owned by a [`Runtime`]. Stale handles never alias.
    pub struct TimelineId;
}

#[derive(Debug, Default)]
pub struct Runtime {
    config: Config,
    timelines: SlotMap<TimelineId, Timeline>,
    finished: Vec<TimelineId>,
}

impl Runtime {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            timelines: SlotMap::with_key(),
            finished: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Add an empty timeline; schedule onto it through [`Runtime::timeline_mut`].
    pub fn spawn(&mut self) -> TimelineId {
        self.timelines.insert(Timeline::new(&self.config))
    }

    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(id)
    }

    pub fn timeline_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
        self.timelines.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    /// Schedule `sequence` on a fresh timeline and start it.
    ///
    /// Nothing is kept when scheduling fails.
    pub fn play<T: Animatable>(
        &mut self,
        sequence: &Sequence<T>,
        target: Option<&Shared<T>>,
    ) -> Result<TimelineId> {
        let mut timeline = Timeline::new(&self.config);
        sequence.schedule(&mut timeline, &self.config, target)?;
        timeline.play();
        let id = self.timelines.insert(timeline);
        debug!("playing '{}' as {id:?}", sequence.name());
        Ok(id)
    }

    /// Multi-target variant of [`Runtime::play`]; see [`Sequence::schedule_many`].
    pub fn play_many<T: Animatable>(
        &mut self,
        sequence: &Sequence<T>,
        targets: &[TargetRef<T>],
        delay_per_target: f32,
        max_total_spread: Option<f32>,
    ) -> Result<TimelineId> {
        let mut timeline = Timeline::new(&self.config);
        sequence.schedule_many(
            &mut timeline,
            &self.config,
            targets,
            delay_per_target,
            max_total_spread,
        )?;
        timeline.play();
        let id = self.timelines.insert(timeline);
        debug!(
            "playing '{}' on {} target(s) as {id:?}",
            sequence.name(),
            targets.len()
        );
        Ok(id)
    }

    /// Advance every playing timeline driven by `mode`.
    pub fn tick(&mut self, mode: ProcessMode, dt: f32) {
        for (id, timeline) in self.timelines.iter_mut() {
            if timeline.process_mode() != mode || !timeline.is_playing() {
                continue;
            }
            if timeline.tick(dt) == TimelineState::Finished {
                self.finished.push(id);
            }
        }
    }

    pub fn play_id(&mut self, id: TimelineId) -> bool {
        match self.timelines.get_mut(id) {
            Some(timeline) => {
                timeline.play();
                true
            }
            None => false,
        }
    }

    /// Halt and rewind; `false` for stale handles.
    pub fn stop(&mut self, id: TimelineId) -> bool {
        match self.timelines.get_mut(id) {
            Some(timeline) => {
                timeline.stop();
                true
            }
            None => {
                trace!("stop on stale timeline {id:?}");
                false
            }
        }
    }

    /// Kill and release; repeated kills return `false`.
    pub fn kill(&mut self, id: TimelineId) -> bool {
        match self.timelines.remove(id) {
            Some(mut timeline) => {
                timeline.kill();
                true
            }
            None => {
                trace!("kill on stale timeline {id:?}");
                false
            }
        }
    }

    pub fn is_active(&self, id: TimelineId) -> bool {
        self.timelines.get(id).is_some_and(Timeline::is_playing)
    }

    /// Timelines that finished since the last call, oldest first.
    ///
    /// Hosts drain this once per frame; ids accumulate until then.
    pub fn take_finished(&mut self) -> Vec<TimelineId> {
        std::mem::take(&mut self.finished)
    }

    /// Drop finished and stopped timelines, along with any undrained
    /// finish notifications for handles that no longer resolve.
    pub fn prune(&mut self) -> usize {
        let before = self.timelines.len();
        self.timelines.retain(|_, t| {
            !matches!(
                t.state(),
                TimelineState::Finished | TimelineState::Killed | TimelineState::Stopped
            )
        });
        let timelines = &self.timelines;
        self.finished.retain(|id| timelines.contains_key(*id));
        before - self.timelines.len()
    }
}
