use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cadence_animation_core::{
    shared, AnimationError, Animatable, Capabilities, Config, Ease, IndexedProperty, KeyValue,
    Keyframe, ProcessMode, PropertyTween, Runtime, Sequence, Timeline, Value,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

#[derive(Default)]
struct Node {
    x: f32,
}

impl Animatable for Node {
    fn capabilities(&self) -> Capabilities {
        Capabilities::SPATIAL_2D
    }
    fn get_indexed(&self, path: &str) -> Option<Value> {
        (path == "x").then(|| Value::f(self.x))
    }
    fn set_indexed(&mut self, path: &str, value: &Value) -> bool {
        match (path, value.as_float()) {
            ("x", Some(v)) => {
                self.x = v;
                true
            }
            _ => false,
        }
    }
}

fn x_track() -> PropertyTween<Node> {
    PropertyTween::new(IndexedProperty::new("x").shared())
}

/// It should fire the first key's effect even when its segment is a zero-length no-op.
#[test]
fn first_key_effect_always_fires() {
    let node = shared(Node { x: 0.0 });
    let first = Arc::new(AtomicUsize::new(0));
    let elided = Arc::new(AtomicUsize::new(0));
    let (f, e) = (Arc::clone(&first), Arc::clone(&elided));

    let mut seq = Sequence::new("effects");
    seq.animate(IndexedProperty::new("x").shared())
        .key(
            Keyframe::step(0.0, KeyValue::to(0.0)).with_effect(move |_: &mut Node| {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .step(1.0, 5.0)
        .key(
            Keyframe::step(0.0, KeyValue::to(5.0)).with_effect(move |_: &mut Node| {
                e.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .done();

    let mut rt = Runtime::default();
    let id = rt.play(&seq, Some(&node)).unwrap();
    let timeline = rt.timeline(id).unwrap();
    // First key (hard set) and the real segment; the trailing zero-length key is elided.
    assert_eq!(timeline.segments().len(), 2);
    assert_eq!(timeline.callback_starts(), vec![0.0, 1.0]);

    rt.tick(ProcessMode::Idle, 0.016);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(elided.load(Ordering::SeqCst), 0);
    rt.tick(ProcessMode::Idle, 1.0);
    assert_eq!(elided.load(Ordering::SeqCst), 1);
    approx(node.lock().unwrap().x, 5.0, 1e-6);
}

/// It should partition the total duration exactly across percentage keys.
#[test]
fn percentage_segments_sum_to_total() {
    let track = x_track()
        .duration(2.0)
        .key_at(0.2, 1.0)
        .key_at(0.5, 2.0)
        .key_at(0.5, 3.0)
        .key_at(1.0, 4.0);
    let res = track
        .resolve(&Node::default(), &Config::default(), None, 0.0)
        .unwrap();

    let total: f32 = res.segments.iter().map(|s| s.duration).sum();
    approx(total, 2.0, 1e-5);
    approx(res.duration, 2.0, 1e-5);
    for pair in res.segments.windows(2) {
        assert!(pair[0].start <= pair[1].start);
        approx(pair[0].end(), pair[1].start, 1e-5);
    }
}

/// It should take the sequence's total duration when the track has none.
#[test]
fn percentage_keys_use_sequence_duration() {
    let node = shared(Node::default());
    let mut seq = Sequence::new("pct");
    seq.duration(4.0)
        .animate(IndexedProperty::new("x").shared())
        .key_at(0.25, 1.0)
        .key_at(1.0, 2.0)
        .done();
    let mut rt = Runtime::default();
    let id = rt.play(&seq, Some(&node)).unwrap();
    let segments: Vec<(f32, f32)> = rt
        .timeline(id)
        .unwrap()
        .segments()
        .iter()
        .map(|s| (s.start, s.duration))
        .collect();
    assert_eq!(segments, vec![(0.0, 1.0), (1.0, 3.0)]);
}

/// It should let the sequence's total duration override a track's own.
#[test]
fn sequence_duration_overrides_track_duration() {
    let node = shared(Node::default());
    let mut seq = Sequence::new("pct");
    seq.duration(4.0)
        .animate(IndexedProperty::new("x").shared())
        .duration(2.0)
        .key_at(0.5, 1.0)
        .key_at(1.0, 2.0)
        .done();
    let mut timeline = Timeline::default();
    let total = seq
        .schedule(&mut timeline, &Config::default(), Some(&node))
        .unwrap();
    approx(total, 4.0, 1e-6);
    let segments: Vec<(f32, f32)> = timeline
        .segments()
        .iter()
        .map(|s| (s.start, s.duration))
        .collect();
    assert_eq!(segments, vec![(0.0, 2.0), (2.0, 2.0)]);
}

/// It should reject percentages that are not a fraction of the total.
#[test]
fn out_of_range_percentages_fail() {
    for bad in [f32::NAN, -0.1, 1.5] {
        let track = x_track().duration(1.0).key_at(0.5, 1.0).key_at(bad, 2.0);
        assert!(
            matches!(
                track.resolve(&Node::default(), &Config::default(), None, 0.0),
                Err(AnimationError::InvalidDuration { .. })
            ),
            "{bad}"
        );
    }
}

fn play_offsets(track: PropertyTween<Node>, initial: f32) -> Vec<f32> {
    let node = shared(Node { x: initial });
    let mut seq = Sequence::new("offsets");
    seq.add_track(track);
    let mut rt = Runtime::default();
    rt.play(&seq, Some(&node)).unwrap();
    (0..3)
        .map(|_| {
            rt.tick(ProcessMode::Idle, 1.0);
            node.lock().unwrap().x
        })
        .collect()
}

/// It should chain offsets from the running value: a trailing zero stays put.
#[test]
fn running_offsets_chain_from_previous_value() {
    let track = x_track()
        .step_by(1.0, 10.0)
        .step_by(1.0, -5.0)
        .step_by(1.0, 0.0);
    let seen = play_offsets(track, 2.0);
    for (got, want) in seen.iter().zip([12.0, 7.0, 7.0]) {
        approx(*got, want, 1e-5);
    }
}

/// It should resolve every offset against the initial value in initial mode.
#[test]
fn initial_offsets_resolve_from_start_value() {
    let track = x_track()
        .relative_to_initial()
        .step_by(1.0, 10.0)
        .step_by(1.0, -5.0)
        .step_by(1.0, 0.0);
    let seen = play_offsets(track, 2.0);
    for (got, want) in seen.iter().zip([12.0, -3.0, 2.0]) {
        approx(*got, want, 1e-5);
    }
}

/// It should ease every built-in curve from 0 to 1.
#[test]
fn easing_endpoints() {
    let css = [
        Ease::CSS_EASE,
        Ease::CSS_EASE_IN,
        Ease::CSS_EASE_OUT,
        Ease::CSS_EASE_IN_OUT,
    ];
    for ease in Ease::NAMED.into_iter().chain(css) {
        approx(ease.apply(0.0), 0.0, 1e-4);
        approx(ease.apply(1.0), 1.0, 1e-4);
    }
}

/// It should sample eased values mid-segment.
#[test]
fn eased_segment_samples_curve() {
    let node = shared(Node::default());
    let mut seq = Sequence::new("eased");
    seq.animate(IndexedProperty::new("x").shared())
        .ease(Ease::QuadIn)
        .step(1.0, 10.0)
        .done();
    let mut rt = Runtime::default();
    rt.play(&seq, Some(&node)).unwrap();
    rt.tick(ProcessMode::Idle, 0.5);
    approx(node.lock().unwrap().x, 2.5, 1e-5);
}

/// It should start delayed tracks at their initial delay.
#[test]
fn initial_delay_shifts_segments() {
    let res = x_track()
        .step(0.5, 1.0)
        .step(0.5, 2.0)
        .resolve(&Node::default(), &Config::default(), None, 1.25)
        .unwrap();
    let starts: Vec<f32> = res.segments.iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![1.25, 1.75]);
    approx(res.duration, 1.0, 1e-6);
}
