//! Stock templates, built procedurally in one place.
//!
//! Presets drive targets through these indexed paths:
//! - [`OPACITY`]: float in `[0, 1]`
//! - [`SCALE`]: vec2
//! - [`POSITION`]: vec2
//! - [`ROTATION`]: float, radians

use std::f32::consts::TAU;
use std::sync::Arc;

use crate::easing::Ease;
use crate::keyframe::{KeyValue, Keyframe};
use crate::property::{IndexedProperty, Property};
use crate::sequence::Sequence;
use crate::target::{Animatable, Capabilities};
use crate::templates::TemplateRegistry;
use crate::value::Value;

pub const OPACITY: &str = "modulate:a";
pub const SCALE: &str = "scale";
pub const POSITION: &str = "position";
pub const ROTATION: &str = "rotation";

pub const FADE: &str = "fade";
pub const ATTENTION: &str = "attention";
pub const MOTION: &str = "motion";

fn opacity<T: Animatable>() -> Arc<dyn Property<T>> {
    IndexedProperty::new(OPACITY)
        .requires(Capabilities::VISUAL)
        .shared()
}

fn indexed<T: Animatable>(path: &str) -> Arc<dyn Property<T>> {
    IndexedProperty::new(path).shared()
}

fn fade<T: Animatable>(name: &str, from: f32, to: f32) -> Sequence<T> {
    let mut seq = Sequence::new(name);
    seq.animate(opacity())
        .from(from)
        .ease(Ease::SineOut)
        .step(0.3, to)
        .done();
    seq
}

fn pop<T: Animatable>(name: &str, from: f32, overshoot: f32, to: f32) -> Sequence<T> {
    let mut seq = Sequence::new(name);
    seq.animate(indexed(SCALE))
        .from(Value::vec2(from, from))
        .step(0.18, Value::vec2(overshoot, overshoot))
        .key(Keyframe::step(0.12, KeyValue::to(Value::vec2(to, to))).with_ease(Ease::QuadIn))
        .ease(Ease::QuadOut)
        .done();
    seq
}

fn pulse<T: Animatable>() -> Sequence<T> {
    let mut seq = Sequence::new("pulse");
    seq.duration(0.6)
        .animate(indexed(SCALE))
        .ease(Ease::SineInOut)
        .key_at(0.5, Value::vec2(1.1, 1.1))
        .key_at(1.0, Value::vec2(1.0, 1.0))
        .done();
    seq
}

fn bounce<T: Animatable>() -> Sequence<T> {
    let mut seq = Sequence::new("bounce");
    seq.animate(indexed(POSITION))
        .ease(Ease::QuadOut)
        .step_by(0.15, Value::vec2(0.0, -20.0))
        .key(Keyframe::step(0.15, KeyValue::by(Value::vec2(0.0, 20.0))).with_ease(Ease::QuadIn))
        .step_by(0.1, Value::vec2(0.0, -8.0))
        .key(Keyframe::step(0.1, KeyValue::by(Value::vec2(0.0, 8.0))).with_ease(Ease::QuadIn))
        .done();
    seq
}

fn spin<T: Animatable>() -> Sequence<T> {
    let mut seq = Sequence::new("spin");
    seq.animate(indexed(ROTATION))
        .ease(Ease::CubicInOut)
        .step_by(1.0, TAU)
        .done();
    seq
}

fn shake<T: Animatable>(px: f32) -> Sequence<T> {
    let mut seq = Sequence::new("shake");
    seq.animate(indexed(POSITION))
        .step_by(0.05, Value::vec2(px, 0.0))
        .step_by(0.1, Value::vec2(-2.0 * px, 0.0))
        .step_by(0.1, Value::vec2(2.0 * px, 0.0))
        .step_by(0.05, Value::vec2(-px, 0.0))
        .done();
    seq
}

/// Hard-set the target `offset` away from where it is, then ease back.
fn slide_in<T: Animatable>(name: &str, offset: Value) -> Sequence<T> {
    let mut seq = Sequence::new(name);
    seq.animate(indexed(POSITION))
        .relative_to_initial()
        .ease(Ease::CubicOut)
        .step_by(0.0, offset.clone())
        .step_by(0.4, offset.zero_like().unwrap_or(Value::vec2(0.0, 0.0)))
        .done();
    seq
}

fn float<T: Animatable>(px: f32) -> Sequence<T> {
    let mut seq = Sequence::new("float");
    seq.loops(0)
        .animate(indexed(POSITION))
        .ease(Ease::SineInOut)
        .step_by(1.0, Value::vec2(0.0, -px))
        .step_by(1.0, Value::vec2(0.0, px))
        .done();
    seq
}

/// Register every stock template into `registry`.
pub fn register_builtin<T: Animatable>(registry: &TemplateRegistry<T>) {
    registry.register(FADE, "fade_in", || fade("fade_in", 0.0, 1.0));
    registry.register(FADE, "fade_out", || fade("fade_out", 1.0, 0.0));
    registry.register(ATTENTION, "pop_in", || pop("pop_in", 0.0, 1.1, 1.0));
    registry.register(ATTENTION, "pop_out", || pop("pop_out", 1.0, 1.1, 0.0));
    registry.register(ATTENTION, "pulse", pulse::<T>);
    registry.register(ATTENTION, "bounce", bounce::<T>);
    registry.register(ATTENTION, "spin", spin::<T>);

    registry.register_param(ATTENTION, "shake", shake::<T>);
    registry.register_param(MOTION, "slide_in_left", |px| {
        slide_in("slide_in_left", Value::vec2(-px, 0.0))
    });
    registry.register_param(MOTION, "slide_in_right", |px| {
        slide_in("slide_in_right", Value::vec2(px, 0.0))
    });
    registry.register_param(MOTION, "slide_up", |px| {
        slide_in("slide_up", Value::vec2(0.0, px))
    });
    registry.register_param(MOTION, "float", float::<T>);
}
