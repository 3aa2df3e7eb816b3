use vizij_animator_core::{
    AnimatorSlot, ClipCache, ClipTimeline, ConditionMode, Figure, FigureCommand, MotionClip, Outputs,
    ParameterTable, ParameterType, SlotTable, StateEvent, StateMachine,
};

fn clips() -> ClipCache {
    let mut cache = ClipCache::new();
    cache.insert("clips/a.pyxa", ClipTimeline::with_length(2.0));
    cache.insert("clips/b.pyxa", ClipTimeline::with_length(1.0));
    cache
}

/// it should idle a layer parked on Exit after one tick and stay idle
#[test]
fn exit_state_goes_idle() {
    let mut sm = StateMachine::new(0);
    let mut params = ParameterTable::new();
    let mut out = Outputs::default();
    let exit = sm.exit_state();
    sm.set_current_state(Some(exit), &mut out);

    sm.update(0.016, &mut params, &mut out);
    assert_eq!(sm.current_state(), None);
    for _ in 0..3 {
        out.clear();
        sm.update(0.016, &mut params, &mut out);
        assert_eq!(sm.current_state(), None);
        assert!(out.is_empty());
    }
}

/// it should stay on Enter until an authored transition leaves it
#[test]
fn enter_does_not_auto_advance() {
    let mut sm = StateMachine::new(0);
    sm.add_state("idle");
    let mut params = ParameterTable::new();
    let mut out = Outputs::default();
    for _ in 0..5 {
        sm.update(0.1, &mut params, &mut out);
    }
    assert_eq!(sm.current_state(), Some(sm.enter_state()));
    assert!(out.is_empty());
}

/// it should move from A to B in a single tick for an instant unconditional transition
#[test]
fn unconditional_transition_switches_without_blending() {
    let mut cache = clips();
    let mut sm = StateMachine::new(0);
    let a = sm.add_state_with_clip("A", "clips/a.pyxa", &mut cache);
    let b = sm.add_state_with_clip("B", "clips/b.pyxa", &mut cache);
    sm.add_transition(a, b, false).unwrap();

    let mut params = ParameterTable::new();
    let mut out = Outputs::default();
    sm.set_current_state(Some(a), &mut out);
    out.clear();

    sm.update(0.016, &mut params, &mut out);
    assert_eq!(sm.current_state(), Some(b));
    assert_eq!(sm.next_state(), None);
    assert!(!sm.is_blending());

    let names: Vec<_> = out
        .events
        .iter()
        .map(|e| match e {
            StateEvent::Exited { name, .. } => format!("exit {name}"),
            StateEvent::Entered { name, .. } => format!("enter {name}"),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["exit A", "enter B"]);
}

/// it should gate on exit time, blend for the fixed duration, then commit
#[test]
fn exit_time_transition_blends_then_commits() {
    let mut cache = clips();
    let mut sm = StateMachine::new(1);
    let a = sm.add_state_with_clip("A", "clips/a.pyxa", &mut cache);
    let b = sm.add_state_with_clip("B", "clips/b.pyxa", &mut cache);
    {
        let t = sm.add_transition(a, b, true).unwrap();
        t.has_fixed_duration = true;
        t.exit_time = 1.0;
        t.duration = 0.5;
        t.add_condition("go", ConditionMode::If, 0.0);
    }
    let mut params = ParameterTable::new();
    params.set("go", ParameterType::Bool, 0.0);
    let mut figure = SlotTable::new();
    let mut out = Outputs::default();
    sm.set_current_state(Some(a), &mut out);
    out.apply_to(&mut figure);

    let clip_a = sm.state(a).unwrap().clip().cloned().unwrap();
    assert_eq!(clip_a.end_time(), 2.0);

    for t in [0.0f32, 0.5, 1.0] {
        clip_a.seek(t);
        out.clear();
        sm.update(0.016, &mut params, &mut out);
        assert_eq!(sm.next_state(), None, "fired early at eval time {t}");
    }

    clip_a.seek(1.25);
    out.clear();
    sm.update(0.016, &mut params, &mut out);
    assert_eq!(sm.current_state(), Some(a));
    assert_eq!(sm.next_state(), Some(b));
    assert_eq!(sm.transition_duration(), 0.5);
    out.apply_to(&mut figure);
    assert!(figure.secondary(1).is_some());
    assert!(out.commands.iter().any(|c| matches!(
        c,
        FigureCommand::BindAnimator {
            layer: 1,
            slot: AnimatorSlot::Secondary,
            clip: Some(_)
        }
    )));

    out.clear();
    sm.update(0.25, &mut params, &mut out);
    assert_eq!(out.blend_weight(1), Some(0.5));
    out.apply_to(&mut figure);
    assert_eq!(figure.weight(1), 0.5);

    sm.update(0.25, &mut params, &mut out);
    assert_eq!(sm.transition_time(), 0.5);
    assert_eq!(sm.current_state(), Some(a));

    out.clear();
    sm.update(0.016, &mut params, &mut out);
    assert_eq!(sm.current_state(), Some(b));
    assert_eq!(sm.next_state(), None);
    assert_eq!(sm.transition_time(), 0.0);
    out.apply_to(&mut figure);
    assert!(figure.primary(1).is_some());
    assert!(figure.secondary(1).is_none());
    assert_eq!(figure.weight(1), 0.0);
}

/// it should let satisfied conditions fire an exit-time transition before the gate
#[test]
fn conditions_fire_before_exit_time_gate() {
    let mut cache = clips();
    let mut sm = StateMachine::new(0);
    let a = sm.add_state_with_clip("A", "clips/a.pyxa", &mut cache);
    let b = sm.add_state("B");
    {
        let t = sm.add_transition(a, b, true).unwrap();
        t.has_fixed_duration = true;
        t.duration = 0.0;
        t.add_condition("go", ConditionMode::If, 0.0);
    }
    let mut params = ParameterTable::new();
    params.set("go", ParameterType::Bool, 1.0);
    let mut out = Outputs::default();
    sm.set_current_state(Some(a), &mut out);
    sm.update(0.016, &mut params, &mut out);
    assert_eq!(sm.current_state(), Some(b));
}

/// it should not re-evaluate transitions while a blend is running
#[test]
fn running_blend_is_not_interrupted() {
    let mut cache = clips();
    let mut sm = StateMachine::new(0);
    let a = sm.add_state_with_clip("A", "clips/a.pyxa", &mut cache);
    let b = sm.add_state_with_clip("B", "clips/b.pyxa", &mut cache);
    let c = sm.add_state("C");
    sm.add_transition(a, b, false).unwrap().offset = 1.0;
    sm.add_any_state_transition(c)
        .unwrap()
        .add_condition("panic", ConditionMode::If, 0.0);

    let mut params = ParameterTable::new();
    params.set("panic", ParameterType::Trigger, 0.0);
    let mut out = Outputs::default();
    sm.set_current_state(Some(a), &mut out);
    sm.update(0.0, &mut params, &mut out);
    assert_eq!(sm.next_state(), Some(b));

    params.set_trigger("panic");
    sm.update(0.5, &mut params, &mut out);
    sm.update(0.5, &mut params, &mut out);
    assert_eq!(sm.next_state(), Some(b));
    assert_eq!(params.get("panic").value, 1.0);

    sm.update(0.0, &mut params, &mut out);
    assert_eq!(sm.current_state(), Some(b));
}

/// it should reach Exit through an exit transition and then idle the layer
#[test]
fn exit_transition_idles_layer() {
    let mut sm = StateMachine::new(2);
    let a = sm.add_state("A");
    sm.add_exit_transition(a, false).unwrap();
    let mut params = ParameterTable::new();
    let mut out = Outputs::default();
    sm.set_current_state(Some(a), &mut out);

    sm.update(0.016, &mut params, &mut out);
    assert_eq!(sm.current_state(), Some(sm.exit_state()));
    out.clear();
    sm.update(0.016, &mut params, &mut out);
    assert_eq!(sm.current_state(), None);
    assert_eq!(out.events, vec![StateEvent::LayerIdle { layer: 2 }]);
}

/// it should fall back to Any-state transitions when the current state has none passing
#[test]
fn any_state_transition_is_global() {
    let mut sm = StateMachine::new(0);
    let a = sm.add_state("A");
    let b = sm.add_state("B");
    let hurt = sm.add_state("hurt");
    sm.add_transition(a, b, false)
        .unwrap()
        .add_condition("walk", ConditionMode::If, 0.0);
    {
        let t = sm.add_any_state_transition(hurt).unwrap();
        t.duration = 0.0;
        t.add_condition("hit", ConditionMode::If, 0.0);
    }
    let mut params = ParameterTable::new();
    params.set("walk", ParameterType::Bool, 0.0);
    params.set("hit", ParameterType::Trigger, 1.0);
    let mut out = Outputs::default();
    sm.set_current_state(Some(a), &mut out);
    sm.update(0.016, &mut params, &mut out);
    assert_eq!(sm.current_state(), Some(hurt));
    assert_eq!(params.get("hit").value, 0.0);
}

/// it should forward figure commands through any Figure implementation
#[test]
fn figure_commands_apply_to_custom_figures() {
    #[derive(Default)]
    struct Recorder {
        binds: Vec<(usize, usize, bool)>,
    }
    impl Figure for Recorder {
        fn bind_animator(
            &mut self,
            layer: usize,
            slot: AnimatorSlot,
            clip: Option<vizij_animator_core::ClipHandle>,
        ) {
            self.binds.push((layer, slot.raw_index(layer), clip.is_some()));
        }
        fn set_blending_weight(&mut self, _layer: usize, _weight: f32) {}
    }

    let mut cache = clips();
    let mut sm = StateMachine::new(3);
    let a = sm.add_state_with_clip("A", "clips/a.pyxa", &mut cache);
    let mut out = Outputs::default();
    sm.set_current_state(Some(a), &mut out);
    let mut rec = Recorder::default();
    out.apply_to(&mut rec);
    assert_eq!(rec.binds, vec![(3, 7, true), (3, 8, false)]);
}
