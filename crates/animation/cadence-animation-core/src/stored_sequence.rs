use serde::Deserialize;

use crate::config::ProcessMode;
use crate::easing::Ease;
use crate::error::{AnimationError, Result};
use crate::keyframe::{KeyValue, Keyframe};
use crate::property::IndexedProperty;
use crate::sequence::Sequence;
use crate::target::{Animatable, Capabilities};
use crate::track::{OffsetMode, PropertyTween};
use crate::value::Value;

/// Public API: parse stored sequence JSON (see fixtures/sequences/*.json) into a
/// [`Sequence`] whose tracks bind by path through [`IndexedProperty`].
///
/// Notes:
/// - Durations are seconds.
/// - Values use the tagged form `{ "type": "vec2", "data": [x, y] }`.
/// - Easing is given by name (`"quad_out"`, `"ease-in"`, `"cubic-bezier(...)"`).
/// - Each key holds exactly one of `step` / `percent` and one of `to` / `offset`.
pub fn parse_stored_sequence_json<T: Animatable>(s: &str) -> Result<Sequence<T>> {
    let stored: StoredSequence = serde_json::from_str(s)?;
    if stored.blocks.iter().all(Vec::is_empty) {
        return Err(AnimationError::empty(format!(
            "stored sequence '{}' has no tracks",
            stored.name
        )));
    }

    let mut seq = Sequence::new(stored.name.clone());
    seq.loops(stored.loops)
        .speed(stored.speed)
        .process_mode(stored.process);
    if let Some(d) = stored.duration {
        seq.duration(d);
    }

    for block in stored.blocks {
        for (i, st) in block.into_iter().enumerate() {
            let track = to_track::<T>(&stored.name, st)?;
            if i > 0 {
                seq.parallel();
            }
            seq.add_track(track);
        }
    }
    Ok(seq)
}

fn to_track<T: Animatable>(seq_name: &str, st: StoredTrack) -> Result<PropertyTween<T>> {
    let mut required = Capabilities::NONE;
    for tag in &st.required {
        required = required
            | Capabilities::from_tag(tag).ok_or_else(|| {
                AnimationError::stored(format!("{seq_name}: unknown capability tag '{tag}'"))
            })?;
    }

    let property = IndexedProperty::new(st.property.clone()).requires(required);
    let mut track = PropertyTween::new(property.shared());
    if let Some(from) = st.from {
        track = track.from(from);
    }
    if let Some(mode) = st.relative {
        track = track.offset_mode(mode);
    }
    if let Some(ease) = st.ease {
        track = track.ease(ease);
    }
    if let Some(d) = st.duration {
        track = track.duration(d);
    }
    for (i, sk) in st.keys.into_iter().enumerate() {
        track = track.key(to_key(seq_name, &st.property, i, sk)?);
    }
    Ok(track)
}

fn to_key<T: Animatable>(
    seq_name: &str,
    property: &str,
    index: usize,
    sk: StoredKey,
) -> Result<Keyframe<T>> {
    let at = || format!("{seq_name}/{property} key {index}");
    let value = match (sk.to, sk.offset) {
        (Some(to), None) => KeyValue::to(to),
        (None, Some(offset)) => KeyValue::by(offset),
        _ => {
            return Err(AnimationError::stored(format!(
                "{}: expected exactly one of 'to' or 'offset'",
                at()
            )))
        }
    };
    let key = match (sk.step, sk.percent) {
        (Some(d), None) => Keyframe::step(d, value),
        (None, Some(p)) => Keyframe::percent(p, value),
        _ => {
            return Err(AnimationError::stored(format!(
                "{}: expected exactly one of 'step' or 'percent'",
                at()
            )))
        }
    };
    Ok(match sk.ease {
        Some(ease) => key.with_ease(ease),
        None => key,
    })
}

fn one() -> u32 {
    1
}

fn unit_speed() -> f32 {
    1.0
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredSequence {
    pub name: String,
    #[serde(default)]
    pub duration: Option<f32>,
    #[serde(default = "one")]
    pub loops: u32,
    #[serde(default = "unit_speed")]
    pub speed: f32,
    #[serde(default)]
    pub process: ProcessMode,
    pub blocks: Vec<Vec<StoredTrack>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredTrack {
    pub property: String,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub from: Option<Value>,
    /// "running" or "initial"
    #[serde(default)]
    pub relative: Option<OffsetMode>,
    #[serde(default)]
    pub ease: Option<Ease>,
    #[serde(default)]
    pub duration: Option<f32>,
    pub keys: Vec<StoredKey>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredKey {
    #[serde(default)]
    pub step: Option<f32>,
    #[serde(default)]
    pub percent: Option<f32>,
    #[serde(default)]
    pub to: Option<Value>,
    #[serde(default)]
    pub offset: Option<Value>,
    #[serde(default)]
    pub ease: Option<Ease>,
}
