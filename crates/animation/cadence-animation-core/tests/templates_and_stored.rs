use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cadence_animation_core::{
    parse_stored_sequence_json, presets, shared, AnimationError, Animatable, Capabilities, Config,
    ProcessMode, Runtime, Sequence, TemplateRegistry, Timeline, Value,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

#[derive(Default)]
struct Card {
    x: f32,
    opacity: f32,
    position: [f32; 2],
    scale: [f32; 2],
    rotation: f32,
}

impl Animatable for Card {
    fn capabilities(&self) -> Capabilities {
        Capabilities::SPATIAL_2D | Capabilities::LAYOUT | Capabilities::VISUAL
    }
    fn get_indexed(&self, path: &str) -> Option<Value> {
        match path {
            "x" => Some(Value::f(self.x)),
            presets::OPACITY => Some(Value::f(self.opacity)),
            presets::POSITION => Some(Value::Vec2(self.position)),
            presets::SCALE => Some(Value::Vec2(self.scale)),
            presets::ROTATION => Some(Value::f(self.rotation)),
            _ => None,
        }
    }
    fn set_indexed(&mut self, path: &str, value: &Value) -> bool {
        match (path, value) {
            ("x", Value::Float(v)) => self.x = *v,
            (presets::OPACITY, Value::Float(v)) => self.opacity = *v,
            (presets::POSITION, Value::Vec2(v)) => self.position = *v,
            (presets::SCALE, Value::Vec2(v)) => self.scale = *v,
            (presets::ROTATION, Value::Float(v)) => self.rotation = *v,
            _ => return false,
        }
        true
    }
}

/// It should memoize case-insensitive lookups and build once.
#[test]
fn bounce_lookup_is_cached_across_case() {
    let registry = TemplateRegistry::<Card>::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    registry.register("attention", "bounce", move || {
        c.fetch_add(1, Ordering::SeqCst);
        let mut seq = Sequence::new("bounce");
        seq.wait(0.5);
        seq
    });

    let lower = registry.get("bounce").unwrap();
    let upper = registry.get("BOUNCE").unwrap();
    assert!(Arc::ptr_eq(&lower, &upper));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        registry.get("wobble").unwrap_err(),
        AnimationError::TemplateNotFound {
            name: "wobble".into()
        }
    );
}

/// It should hand every racing thread the same instance.
#[test]
fn concurrent_first_access_shares_one_instance() {
    let registry = Arc::new(TemplateRegistry::<Card>::new());
    presets::register_builtin(&registry);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.get("pulse").unwrap())
        })
        .collect();
    let built: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(built.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

/// It should play stock presets against a host target.
#[test]
fn presets_play_end_to_end() {
    let registry = TemplateRegistry::<Card>::new();
    presets::register_builtin(&registry);
    let card = shared(Card {
        position: [10.0, 10.0],
        scale: [1.0, 1.0],
        ..Card::default()
    });
    let mut rt = Runtime::default();

    rt.play(&registry.get("fade_in").unwrap(), Some(&card)).unwrap();
    rt.play(&registry.get_param("slide_in_left", 100.0).unwrap(), Some(&card))
        .unwrap();
    rt.tick(ProcessMode::Idle, 0.016);
    {
        let c = card.lock().unwrap();
        assert!(c.position[0] < -70.0, "slide starts offset: {:?}", c.position);
        assert!(c.opacity > 0.0 && c.opacity < 0.2);
    }
    rt.tick(ProcessMode::Idle, 1.0);
    let c = card.lock().unwrap();
    approx(c.opacity, 1.0, 1e-5);
    approx(c.position[0], 10.0, 1e-4);
    approx(c.position[1], 10.0, 1e-4);
}

/// It should net out the shake offsets.
#[test]
fn shake_returns_to_start() {
    let registry = TemplateRegistry::<Card>::new();
    presets::register_builtin(&registry);
    let card = shared(Card {
        position: [3.0, 4.0],
        ..Card::default()
    });
    let mut rt = Runtime::default();
    rt.play(&registry.get_param("shake", 6.0).unwrap(), Some(&card))
        .unwrap();
    rt.tick(ProcessMode::Idle, 0.05);
    approx(card.lock().unwrap().position[0], 9.0, 1e-4);
    rt.tick(ProcessMode::Idle, 1.0);
    let pos = card.lock().unwrap().position;
    approx(pos[0], 3.0, 1e-4);
    approx(pos[1], 4.0, 1e-4);
}

/// It should load every shared sequence fixture.
#[test]
fn fixtures_parse() {
    for key in cadence_test_fixtures::sequences::keys() {
        let json = cadence_test_fixtures::sequences::json(&key).expect("load fixture");
        let seq = parse_stored_sequence_json::<Card>(&json).expect("parse fixture");
        assert_eq!(seq.name(), key);
        seq.validate().unwrap();
    }
}

/// It should resolve stored percentage keys against the stored duration.
#[test]
fn stored_hover_pulse_partitions_duration() {
    let json = cadence_test_fixtures::sequences::json("hover-pulse").unwrap();
    let seq = parse_stored_sequence_json::<Card>(&json).unwrap();
    assert_eq!(seq.loop_count(), 0);
    let card = shared(Card {
        scale: [1.0, 1.0],
        ..Card::default()
    });
    let mut timeline = Timeline::default();
    let total = seq
        .schedule(&mut timeline, &Config::default(), Some(&card))
        .unwrap();
    approx(total, 0.8, 1e-5);
    let sum: f32 = timeline.segments().iter().map(|s| s.duration).sum();
    approx(sum, 0.8, 1e-5);
}

/// It should keep stored block structure: parallel members and block max.
#[test]
fn stored_card_entrance_blocks() {
    let json = cadence_test_fixtures::sequences::json("card-entrance").unwrap();
    let seq = parse_stored_sequence_json::<Card>(&json).unwrap();
    assert_eq!(seq.blocks().len(), 2);
    assert_eq!(seq.blocks()[0].len(), 2);
    assert_eq!(seq.speed_scale(), 2.0);

    let card = shared(Card::default());
    let mut timeline = Timeline::default();
    let total = seq
        .schedule(&mut timeline, &Config::default(), Some(&card))
        .unwrap();
    approx(total, 4.0, 1e-5);
    let last = timeline.segments().last().unwrap().start;
    approx(last, 3.75, 1e-5);
}

/// It should chain stored offsets from the running value.
#[test]
fn stored_offsets_run_through_runtime() {
    let json = cadence_test_fixtures::sequences::json("nudge-offsets").unwrap();
    let seq = parse_stored_sequence_json::<Card>(&json).unwrap();
    let card = shared(Card {
        x: 1.0,
        ..Card::default()
    });
    let mut rt = Runtime::default();
    rt.play(&seq, Some(&card)).unwrap();
    rt.tick(ProcessMode::Idle, 1.0);
    approx(card.lock().unwrap().x, 11.0, 1e-5);
    rt.tick(ProcessMode::Idle, 5.0);
    approx(card.lock().unwrap().x, 6.0, 1e-5);
}

/// It should register stored templates under their own name.
#[test]
fn register_stored_template() {
    let registry = TemplateRegistry::<Card>::new();
    let json = cadence_test_fixtures::sequences::json("card-entrance").unwrap();
    let name = registry.register_stored("entrance", &json).unwrap();
    assert_eq!(name, "card-entrance");
    assert_eq!(registry.names("entrance"), vec!["card-entrance"]);
    assert!(Arc::ptr_eq(
        &registry.get("Card-Entrance").unwrap(),
        &registry.get("card-entrance").unwrap()
    ));
    assert!(registry.register_stored("entrance", "{}").is_err());
}
