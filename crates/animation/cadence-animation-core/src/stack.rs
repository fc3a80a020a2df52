//! Play-state stack: at most one loop and one one-shot per owner.
//!
//! | state          | loop(L)                 | once(O)                          | once finished        |
//! |----------------|-------------------------|----------------------------------|----------------------|
//! | `Idle`         | start L → LoopPlaying   | start O → OncePlaying            | ignored              |
//! | `LoopPlaying`  | swap loops              | stop loop, start O → OnceOverLoop| ignored              |
//! | `OncePlaying`  | L pending → OnceOverLoop| replace if allowed, else reject  | → Idle               |
//! | `OnceOverLoop` | replace pending loop    | replace if allowed, else reject  | start loop → LoopPlaying |
//!
//! A one-shot may replace the active one only when the active one is
//! interruptible or the request forces a kill. The stack never touches a
//! runtime; it returns [`StackCommand`]s for the host to apply.

use std::fmt::Debug;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackState {
    Idle,
    LoopPlaying,
    OncePlaying,
    /// A one-shot is playing; the current loop resumes when it finishes.
    OnceOverLoop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackCommand<A> {
    Start(A),
    Stop(A),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OnceOptions {
    /// A later one-shot may replace this one.
    pub interruptible: bool,
    /// Replace the active one-shot even if it is not interruptible.
    pub force_kill: bool,
}

impl OnceOptions {
    pub fn interruptible() -> Self {
        Self {
            interruptible: true,
            force_kill: false,
        }
    }

    pub fn forced() -> Self {
        Self {
            interruptible: false,
            force_kill: true,
        }
    }
}

#[derive(Clone, Debug)]
struct ActiveOnce<A> {
    anim: A,
    interruptible: bool,
}

#[derive(Clone, Debug)]
pub struct AnimationStack<A> {
    looping: Option<A>,
    once: Option<ActiveOnce<A>>,
}

impl<A> Default for AnimationStack<A> {
    fn default() -> Self {
        Self {
            looping: None,
            once: None,
        }
    }
}

impl<A: Clone + PartialEq + Debug> AnimationStack<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StackState {
        match (&self.looping, &self.once) {
            (None, None) => StackState::Idle,
            (Some(_), None) => StackState::LoopPlaying,
            (None, Some(_)) => StackState::OncePlaying,
            (Some(_), Some(_)) => StackState::OnceOverLoop,
        }
    }

    /// The current loop, playing or pending.
    pub fn current_loop(&self) -> Option<&A> {
        self.looping.as_ref()
    }

    pub fn current_once(&self) -> Option<&A> {
        self.once.as_ref().map(|o| &o.anim)
    }

    pub fn play_loop(&mut self, anim: A) -> Vec<StackCommand<A>> {
        let mut cmds = Vec::new();
        match self.state() {
            StackState::Idle => cmds.push(StackCommand::Start(anim.clone())),
            StackState::LoopPlaying => {
                if self.looping.as_ref() == Some(&anim) {
                    trace!("loop {anim:?} already playing");
                    return cmds;
                }
                if let Some(old) = self.looping.take() {
                    cmds.push(StackCommand::Stop(old));
                }
                cmds.push(StackCommand::Start(anim.clone()));
            }
            StackState::OncePlaying | StackState::OnceOverLoop => {
                debug!("loop {anim:?} pending until one-shot finishes");
            }
        }
        self.looping = Some(anim);
        cmds
    }

    /// Request a one-shot. Returns no commands when the request is rejected.
    pub fn play_once(&mut self, anim: A, opts: OnceOptions) -> Vec<StackCommand<A>> {
        let mut cmds = Vec::new();
        match self.state() {
            StackState::Idle => {}
            StackState::LoopPlaying => {
                if let Some(l) = &self.looping {
                    cmds.push(StackCommand::Stop(l.clone()));
                }
            }
            StackState::OncePlaying | StackState::OnceOverLoop => {
                let Some(active) = &self.once else {
                    return cmds;
                };
                if !(active.interruptible || opts.force_kill) {
                    info!(
                        "one-shot {anim:?} rejected: {:?} is not interruptible",
                        active.anim
                    );
                    return cmds;
                }
                cmds.push(StackCommand::Stop(active.anim.clone()));
            }
        }
        cmds.push(StackCommand::Start(anim.clone()));
        self.once = Some(ActiveOnce {
            anim,
            interruptible: opts.interruptible,
        });
        cmds
    }

    /// The host reports that one-shot `anim` completed.
    ///
    /// Notifications for anything but the active one-shot are ignored.
    pub fn once_finished(&mut self, anim: &A) -> Vec<StackCommand<A>> {
        let mut cmds = Vec::new();
        match &self.once {
            Some(active) if active.anim == *anim => {}
            _ => {
                trace!("ignoring finish of inactive one-shot {anim:?}");
                return cmds;
            }
        }
        self.once = None;
        if let Some(l) = &self.looping {
            debug!("one-shot {anim:?} done, resuming loop {l:?}");
            cmds.push(StackCommand::Start(l.clone()));
        }
        cmds
    }

    /// Drop the current loop; stops it only if it is actually playing.
    pub fn stop_loop(&mut self) -> Vec<StackCommand<A>> {
        let playing = self.once.is_none();
        match self.looping.take() {
            Some(l) if playing => vec![StackCommand::Stop(l)],
            _ => Vec::new(),
        }
    }

    pub fn stop_all(&mut self) -> Vec<StackCommand<A>> {
        let mut cmds = Vec::new();
        match self.once.take() {
            Some(active) => {
                cmds.push(StackCommand::Stop(active.anim));
                self.looping = None;
            }
            None => {
                if let Some(l) = self.looping.take() {
                    cmds.push(StackCommand::Stop(l));
                }
            }
        }
        cmds
    }
}
