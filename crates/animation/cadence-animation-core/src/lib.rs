//! Cadence Animation Core (engine-agnostic)
//!
//! Declarative property animation compiled onto a playable timeline:
//! easing curves, property adapters, keyframed tracks, sequence/parallel
//! composition, a named template registry, a loop/one-shot play-state stack,
//! and a frame-driven reference runtime.

pub mod config;
pub mod easing;
pub mod error;
pub mod keyframe;
pub mod presets;
pub mod property;
pub mod runtime;
pub mod sequence;
pub mod stack;
pub mod stored_sequence;
pub mod target;
pub mod templates;
pub mod timeline;
pub mod track;
pub mod value;

// Re-exports for consumers (hosts)
pub use config::{Config, ProcessMode};
pub use easing::Ease;
pub use error::{AnimationError, Result};
pub use keyframe::{Effect, KeyTiming, KeyValue, Keyframe, ValueFn};
pub use property::{CallbackProperty, IndexedProperty, Property, RelativePositionProperty};
pub use runtime::{Runtime, TimelineId};
pub use sequence::{stagger_delay, Sequence, TrackBuilder, Tweener};
pub use stack::{AnimationStack, OnceOptions, StackCommand, StackState};
pub use stored_sequence::parse_stored_sequence_json;
pub use target::{shared, Animatable, Capabilities, Shared, TargetRef};
pub use templates::TemplateRegistry;
pub use timeline::{Interpolation, PlayableTimeline, Timeline, TimelineState};
pub use track::{OffsetMode, PropertyTween, Resolution, ScheduleCtx};
pub use cadence_api_core::{Value, ValueKind};
