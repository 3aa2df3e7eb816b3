use std::cell::RefCell;
use std::rc::Rc;

use vizij_animator_core::{
    AnimatorComponent, ClipCache, ClipTimeline, Controller, MotionClip, ParameterType,
    ParameterValue, SlotTable, StateEvent, StoredController, UpdateMode,
};

fn clips() -> ClipCache {
    let mut cache = ClipCache::new();
    cache.insert("clips/idle.pyxa", ClipTimeline::with_length(2.0));
    cache.insert("clips/walk.pyxa", ClipTimeline::with_length(1.0));
    cache.insert("clips/jump.pyxa", ClipTimeline::with_length(0.8));
    cache.insert("clips/wave.pyxa", ClipTimeline::with_length(1.2));
    cache
}

fn state_name(c: &Controller, layer: usize) -> Option<String> {
    let sm = c.layer(layer)?;
    let id = sm.current_state()?;
    sm.state(id).map(|s| s.name().to_string())
}

/// it should refuse a fifth layer and keep exactly four
#[test]
fn fifth_add_layer_fails() {
    let mut c = Controller::new();
    assert!(c.add_layer());
    assert!(c.add_layer());
    assert!(c.add_layer());
    assert!(!c.add_layer());
    assert_eq!(c.layer_count(), 4);
    let mut numbers: Vec<_> = c.layers().iter().map(|l| l.layer()).collect();
    numbers.sort();
    assert_eq!(numbers, vec![0, 1, 2, 3]);
}

/// it should load every manifest animator document
#[test]
fn all_fixture_documents_parse() {
    for key in vizij_test_fixtures::animators::keys() {
        let doc: StoredController = vizij_test_fixtures::animators::load(&key)
            .unwrap_or_else(|e| panic!("fixture {key}: {e}"));
        let mut cache = clips();
        let mut c = Controller::new();
        c.restore(&doc, &mut cache);
        assert!(c.layer_count() >= 1, "fixture {key} has no layers");
    }
}

/// it should drive the locomotion graph from parameters through blends and triggers
#[test]
fn locomotion_fixture_runs() {
    let mut cache = clips();
    let path = vizij_test_fixtures::animators::path("locomotion").expect("locomotion fixture");
    let mut c = Controller::new();
    assert!(c.set_path(path.to_str().unwrap(), &mut cache));
    assert_eq!(c.model(), "models/hero.pyxf");
    assert_eq!(c.parameter_count(), 3);
    assert!(c.has_state("walk"));

    let figure = Rc::new(RefCell::new(SlotTable::new()));
    c.set_figure(Box::new(Rc::clone(&figure)));

    // Entry -> idle immediately.
    c.update(0.016);
    assert_eq!(state_name(&c, 0).as_deref(), Some("idle"));
    assert!(figure.borrow().primary(0).is_some());

    // idle -> walk blends over the 0.2s offset.
    c.set_value("speed", ParameterValue::Float(1.0));
    let out = c.update(0.016);
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, StateEvent::TransitionStarted { duration, .. } if *duration == 0.2)));
    assert!(figure.borrow().secondary(0).is_some());
    c.update(0.1);
    assert!((figure.borrow().weight(0) - 0.5).abs() < 1e-5);
    c.update(0.1);
    c.update(0.016);
    assert_eq!(state_name(&c, 0).as_deref(), Some("walk"));
    assert!(figure.borrow().secondary(0).is_none());

    // The Any-state jump fires from walk and consumes the trigger.
    c.set_trigger("jump");
    let out = c.update(0.016);
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, StateEvent::TransitionStarted { duration, .. } if *duration == 0.0)
            || matches!(e, StateEvent::Entered { name, .. } if name == "jump")));
    assert_eq!(c.parameter("jump").value, 0.0);
    assert_eq!(state_name(&c, 0).as_deref(), Some("jump"));

    // jump lands on idle once 90% of the clip has played and the blend finishes.
    let jump = {
        let sm = c.layer(0).unwrap();
        let id = sm.current_state().unwrap();
        sm.state(id).unwrap().clip().cloned().unwrap()
    };
    jump.seek(0.7);
    c.set_value("speed", ParameterValue::Float(0.0));
    c.set_value("grounded", ParameterValue::Bool(false));
    c.update(0.016);
    assert!(c.layer(0).unwrap().next_state().is_none());
    jump.seek(0.75);
    c.update(0.016);
    assert!(c.layer(0).unwrap().is_blending());
    // Blend length: exit time 0.9 of idle's 2s clip.
    assert!((c.layer(0).unwrap().transition_duration() - 1.8).abs() < 1e-5);
}

/// it should scale time per controller and idle a layer that reaches Exit
#[test]
fn two_layer_fixture_runs_independent_layers() {
    let mut cache = clips();
    let json = vizij_test_fixtures::animators::json("two-layer").unwrap();
    let mut c = Controller::from_json(&json, &mut cache).unwrap();
    assert_eq!(c.time_scale(), 0.5);
    assert_eq!(c.layer_count(), 2);
    c.set_figure(Box::new(SlotTable::new()));

    c.update(0.016);
    assert_eq!(state_name(&c, 0).as_deref(), Some("idle"));
    assert_eq!(state_name(&c, 1).as_deref(), Some("Entry"));

    c.set_value("waving", ParameterValue::Bool(true));
    c.update(0.016);
    assert_eq!(state_name(&c, 1).as_deref(), Some("wave"));

    c.set_value("waving", ParameterValue::Bool(false));
    c.update(0.016);
    assert_eq!(state_name(&c, 1).as_deref(), Some("Exit"));
    let out = c.update(0.016);
    assert!(out.events.contains(&StateEvent::LayerIdle { layer: 1 }));
    assert_eq!(c.layer(1).unwrap().current_state(), None);
    assert_eq!(state_name(&c, 0).as_deref(), Some("idle"));
}

/// it should add a default layer for documents without layers
#[test]
fn legacy_fixture_gets_default_layer() {
    let json = vizij_test_fixtures::animators::json("legacy-no-layers").unwrap();
    let c = Controller::from_json(&json, &mut ClipCache::new()).unwrap();
    assert_eq!(c.layer_count(), 1);
    assert_eq!(c.model(), "models/legacy.pyxf");
    assert_eq!(c.time_scale(), 1.0);
    assert_eq!(c.parameter("mood").ty, ParameterType::Int);
    assert_eq!(c.value("mood"), Some(ParameterValue::Int(3)));
}

/// it should multiply dt by the time scale before stepping layers
#[test]
fn time_scale_applies_to_blend_progress() {
    let mut cache = clips();
    let mut c = Controller::new();
    c.set_time_scale(2.0);
    let sm = c.layer_mut(0).unwrap();
    let idle = sm.add_state_with_clip("idle", "clips/idle.pyxa", &mut cache);
    let walk = sm.add_state_with_clip("walk", "clips/walk.pyxa", &mut cache);
    let enter = sm.enter_state();
    sm.add_transition(enter, idle, false).unwrap();
    sm.add_transition(idle, walk, false).unwrap().offset = 1.0;
    c.set_figure(Box::new(SlotTable::new()));

    c.update(0.0);
    c.update(0.0);
    assert!(c.layer(0).unwrap().is_blending());
    c.update(0.25);
    assert_eq!(c.layer(0).unwrap().transition_time(), 0.5);
}

/// it should only create a controller for objects with a figure and honour update modes
#[test]
fn component_update_modes() {
    let dir = std::env::temp_dir().join(format!("vizij-animator-{}-component", std::process::id()));
    let mut cache = clips();
    let mut c = Controller::new();
    let sm = c.layer_mut(0).unwrap();
    let idle = sm.add_state_with_clip("idle", "clips/idle.pyxa", &mut cache);
    let enter = sm.enter_state();
    sm.add_transition(enter, idle, false).unwrap();
    let file = dir.join("npc.anim");
    assert!(c.save(file.to_str().unwrap()));

    let mut comp = AnimatorComponent::new(file.to_str().unwrap());
    assert!(!comp.initialize(None, &mut cache));
    assert!(comp.initialize(Some(Box::new(SlotTable::new())), &mut cache));
    assert_eq!(comp.controller().unwrap().layer_count(), 1);

    comp.set_update_mode(UpdateMode::AnimatePhysic);
    assert!(comp.on_update(0.016, 0.016).is_none());
    assert_eq!(state_name(comp.controller().unwrap(), 0).as_deref(), Some("Entry"));
    assert!(comp.on_fixed_update(0.02).is_some());
    assert_eq!(state_name(comp.controller().unwrap(), 0).as_deref(), Some("idle"));

    comp.set_update_mode(UpdateMode::UnscaledTime);
    assert!(comp.on_update(0.0, 0.016).is_some());
    assert!(comp.clear().is_some());
    let _ = std::fs::remove_dir_all(&dir);
}

/// it should empty the figure slots of layers dropped by a reload
#[test]
fn reload_leaves_no_stale_figure_bindings() {
    let mut cache = clips();
    let json = vizij_test_fixtures::animators::json("two-layer").unwrap();
    let mut c = Controller::from_json(&json, &mut cache).unwrap();
    let figure = Rc::new(RefCell::new(SlotTable::new()));
    c.set_figure(Box::new(Rc::clone(&figure)));
    c.set_value("waving", ParameterValue::Bool(true));
    c.update(0.016);
    assert!(figure.borrow().primary(0).is_some());
    assert!(figure.borrow().primary(1).is_some());

    let legacy = vizij_test_fixtures::animators::path("legacy-no-layers").unwrap();
    assert!(c.set_path(legacy.to_str().unwrap(), &mut cache));
    c.update(0.016);
    c.update(0.016);
    assert_eq!(c.layer_count(), 1);
    assert!(figure.borrow().primary(0).is_none());
    assert!(figure.borrow().primary(1).is_none());
    assert!(figure.borrow().secondary(1).is_none());
}

/// it should rebind the figure to the reloaded layers' current clips
#[test]
fn reload_rebinds_current_clips() {
    let mut cache = clips();
    let mut c = Controller::new();
    let figure = Rc::new(RefCell::new(SlotTable::new()));
    c.set_figure(Box::new(Rc::clone(&figure)));

    let path = vizij_test_fixtures::animators::path("two-layer").unwrap();
    assert!(c.set_path(path.to_str().unwrap(), &mut cache));
    assert!(figure.borrow().primary(0).is_none());
    c.update(0.016);
    assert!(figure.borrow().primary(0).is_some());
    assert!(figure.borrow().primary(1).is_none());
}
