use crate::headless::MemoryDocument;
use crate::*;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

const LIFECYCLE: [EventKind; 5] = [
    EventKind::Enter,
    EventKind::Start,
    EventKind::Progress,
    EventKind::End,
    EventKind::Leave,
];

fn setup() -> (Rc<MemoryDocument>, Engine, Controller) {
    let doc = Rc::new(MemoryDocument::new(1000.0, 500.0));
    let engine = Engine::new(doc.clone());
    let controller = engine.controller(ControllerOptions::default()).unwrap();
    (doc, engine, controller)
}

fn block(doc: &MemoryDocument, parent: ElementId, top: f64, height: f64) -> ElementId {
    let element = doc.append_element(parent, "div");
    doc.set_rect(element, top, 0.0, 200.0, height);
    element
}

fn scroll_window(doc: &MemoryDocument, controller: &Controller, pos: f64) {
    doc.set_scroll_position(Container::Window, Point::new(pos, 0.0));
    controller.on_scroll();
    controller.tick(0);
}

fn record(scene: &Scene, kinds: &[EventKind]) -> Rc<RefCell<Vec<EventKind>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for &kind in kinds {
        let log = Rc::clone(&log);
        scene.on(kind, move |e| log.borrow_mut().push(e.kind));
    }
    log
}

fn ranged_scene(engine: &Engine, controller: &Controller, offset: f64, duration: f64) -> Scene {
    let scene = engine.scene(
        SceneOptions::new()
            .with_offset(offset)
            .with_duration(duration),
    );
    controller.add_scene(&scene);
    controller.tick(0);
    scene
}

#[test]
fn trigger_element_scene_starts_at_hook_position() {
    let (doc, engine, controller) = setup();
    let trigger = block(&doc, doc.body_element(), 800.0, 50.0);
    let scene = engine.scene(
        SceneOptions::new()
            .with_trigger_element(trigger)
            .with_trigger_hook(0.5),
    );
    controller.add_scene(&scene);
    assert_eq!(scene.scroll_offset(), 550.0);
    assert_eq!(scene.trigger_position(), 800.0);

    let log = record(&scene, &LIFECYCLE);
    let progress = Rc::new(Cell::new(0.0));
    let seen = Rc::clone(&progress);
    scene.on(EventKind::Progress, move |e| seen.set(e.progress));

    controller.tick(0);
    assert!(log.borrow().is_empty());

    scroll_window(&doc, &controller, 600.0);
    assert_eq!(
        *log.borrow(),
        [EventKind::Enter, EventKind::Start, EventKind::Progress]
    );
    assert_eq!(progress.get(), 1.0);
    assert_eq!(scene.state(), SceneState::During);
}

#[test]
fn forward_pass_through_scene_orders_events() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    let log = record(&scene, &LIFECYCLE);

    scroll_window(&doc, &controller, 150.0);
    scroll_window(&doc, &controller, 250.0);
    assert_eq!(
        *log.borrow(),
        [
            EventKind::Enter,
            EventKind::Start,
            EventKind::Progress,
            EventKind::Progress,
            EventKind::End,
            EventKind::Leave,
        ]
    );

    log.borrow_mut().clear();
    scroll_window(&doc, &controller, 150.0);
    scroll_window(&doc, &controller, 0.0);
    assert_eq!(
        *log.borrow(),
        [
            EventKind::Enter,
            EventKind::End,
            EventKind::Progress,
            EventKind::Progress,
            EventKind::Start,
            EventKind::Leave,
        ]
    );
}

#[test]
fn jumping_over_a_scene_emits_one_consistent_transition() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    let events = Rc::new(RefCell::new(Vec::new()));
    for kind in LIFECYCLE {
        let events = Rc::clone(&events);
        scene.on(kind, move |e| {
            events
                .borrow_mut()
                .push((e.kind, e.progress, e.state, e.scroll_direction))
        });
    }

    scroll_window(&doc, &controller, 300.0);
    let events = events.borrow();
    let kinds: Vec<_> = events.iter().map(|e| e.0).collect();
    assert_eq!(kinds, LIFECYCLE);
    for &(_, progress, state, direction) in events.iter() {
        assert_eq!(progress, 1.0);
        assert_eq!(state, SceneState::After);
        assert_eq!(direction, ScrollDirection::Forward);
    }
}

#[test]
fn scenes_update_in_scroll_direction_order() {
    let (doc, engine, controller) = setup();
    let order = Rc::new(RefCell::new(Vec::new()));
    let lower = engine.scene(SceneOptions::new().with_offset(300.0).with_duration(50.0));
    let upper = engine.scene(SceneOptions::new().with_offset(100.0).with_duration(50.0));
    for (scene, label) in [(&lower, "300"), (&upper, "100")] {
        let order = Rc::clone(&order);
        scene.on(EventKind::Update, move |_| order.borrow_mut().push(label));
    }
    controller.add_scene(&lower);
    controller.add_scene(&upper);
    assert_eq!(controller.scenes(), [upper.clone(), lower.clone()]);

    controller.tick(0);
    order.borrow_mut().clear();

    scroll_window(&doc, &controller, 400.0);
    assert_eq!(*order.borrow(), ["100", "300"]);
    assert_eq!(controller.scroll_direction(), ScrollDirection::Forward);

    order.borrow_mut().clear();
    scroll_window(&doc, &controller, 0.0);
    assert_eq!(*order.borrow(), ["300", "100"]);
    assert_eq!(controller.scroll_direction(), ScrollDirection::Reverse);

    controller.update(true);
    assert_eq!(controller.scroll_direction(), ScrollDirection::Paused);
}

#[test]
fn zero_duration_progress_is_quantised() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 0.0);
    let log = record(&scene, &LIFECYCLE);

    for pos in [0.0, 50.0, 99.0, 100.0, 180.0, 400.0, 120.0, 20.0, 0.0] {
        scroll_window(&doc, &controller, pos);
        let progress = scene.progress();
        assert!(progress == 0.0 || progress == 1.0, "progress {progress} at {pos}");
        assert_ne!(scene.state(), SceneState::After);
        assert_eq!(progress == 1.0, scene.state() == SceneState::During);
    }

    assert_eq!(
        *log.borrow(),
        [
            EventKind::Enter,
            EventKind::Start,
            EventKind::Progress,
            EventKind::Progress,
            EventKind::Start,
            EventKind::Leave,
        ]
    );
}

#[test]
fn irreversible_scene_holds_its_progress() {
    let (doc, engine, controller) = setup();
    let instant = engine.scene(SceneOptions::new().with_offset(100.0).with_reverse(false));
    let ranged = engine.scene(
        SceneOptions::new()
            .with_offset(100.0)
            .with_duration(100.0)
            .with_reverse(false),
    );
    controller.add_scenes(&[instant.clone(), ranged.clone()]);
    controller.tick(0);

    scroll_window(&doc, &controller, 150.0);
    assert_eq!(instant.progress(), 1.0);
    assert_eq!(ranged.progress(), 0.5);

    let log = record(&instant, &LIFECYCLE);
    scroll_window(&doc, &controller, 120.0);
    scroll_window(&doc, &controller, 0.0);
    assert!(log.borrow().is_empty());
    assert_eq!(instant.state(), SceneState::During);
    assert_eq!(ranged.progress(), 0.5);
    assert_eq!(ranged.state(), SceneState::During);

    scroll_window(&doc, &controller, 180.0);
    assert_eq!(ranged.progress(), 0.8);
}

#[test]
fn progress_stays_within_bounds() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);

    for pos in [0.0, 50.0, 100.0, 150.0, 199.0, 200.0, 450.0, 120.0, 90.0, 0.0] {
        scroll_window(&doc, &controller, pos);
        let progress = scene.progress();
        assert!((0.0..=1.0).contains(&progress), "progress {progress} at {pos}");
        match scene.state() {
            SceneState::Before => assert_eq!(progress, 0.0),
            SceneState::During => assert!(progress < 1.0),
            SceneState::After => assert_eq!(progress, 1.0),
        }
    }
}

#[test]
fn refresh_is_idempotent() {
    let (doc, engine, controller) = setup();
    let trigger = block(&doc, doc.body_element(), 800.0, 50.0);
    let scene = engine.scene(
        SceneOptions::new()
            .with_trigger_element(trigger)
            .with_duration_fn(|| 120.0),
    );
    controller.add_scene(&scene);
    controller.tick(0);
    let log = record(&scene, &[EventKind::Shift, EventKind::Change]);

    scene.refresh();
    scene.refresh();
    assert!(log.borrow().is_empty());

    doc.set_rect(trigger, 900.0, 0.0, 200.0, 50.0);
    scene.refresh();
    scene.refresh();
    assert_eq!(*log.borrow(), [EventKind::Shift]);
    assert_eq!(scene.scroll_bounds(), ScrollOffset { start: 650.0, end: 770.0 });
}

#[test]
fn periodic_refresh_runs_from_tick() {
    let (doc, engine, controller) = setup();
    let trigger = block(&doc, doc.body_element(), 800.0, 50.0);
    let scene = engine.scene(SceneOptions::new().with_trigger_element(trigger));
    controller.add_scene(&scene);
    let log = record(&scene, &[EventKind::Shift]);

    controller.tick(0);
    doc.set_rect(trigger, 1000.0, 0.0, 200.0, 50.0);
    controller.tick(50);
    assert!(log.borrow().is_empty());
    controller.tick(100);
    assert_eq!(*log.borrow(), [EventKind::Shift]);
    assert_eq!(scene.scroll_offset(), 750.0);
}

#[test]
fn percentage_duration_follows_viewport() {
    let (doc, engine, controller) = setup();
    let scene = engine.scene(SceneOptions::new().with_duration("50%"));
    assert_eq!(scene.duration(), 0.0);

    controller.add_scene(&scene);
    assert_eq!(scene.duration(), 250.0);

    let log = record(&scene, &[EventKind::Change]);
    doc.set_window_size(1000.0, 600.0);
    controller.on_resize();
    scene.refresh();
    assert_eq!(scene.duration(), 300.0);
    assert_eq!(*log.borrow(), [EventKind::Change]);
    assert_eq!(controller.info().size, 600.0);
}

#[test]
fn invalid_duration_function_is_dropped() {
    let (_doc, engine, controller) = setup();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let scene = engine.scene(SceneOptions::new().with_duration_fn(move || {
        counter.set(counter.get() + 1);
        -5.0
    }));
    controller.add_scene(&scene);
    scene.refresh();
    assert_eq!(scene.duration(), 0.0);
    assert_eq!(calls.get(), 1);
}

#[test]
fn invalid_trigger_hook_falls_back_to_center() {
    let (doc, engine, controller) = setup();
    let scene = engine.scene(SceneOptions::new().with_trigger_hook("bogus"));
    assert_eq!(scene.trigger_hook(), 0.5);

    scene.set_trigger_hook(TriggerHook::OnEnter);
    assert_eq!(scene.trigger_hook(), 1.0);
    scene.set_trigger_hook(1.7);
    assert_eq!(scene.trigger_hook(), 1.0);
    scene.set_trigger_hook("0.25");
    assert_eq!(scene.trigger_hook(), 0.25);
    scene.set_trigger_hook("onLeave");
    assert_eq!(scene.trigger_hook(), 0.0);
    scene.set_trigger_hook("0.3px");
    assert_eq!(scene.trigger_hook(), 0.5);

    // still functional
    let scene = engine.scene(SceneOptions::new().with_offset(100.0).with_trigger_hook("nope"));
    controller.add_scene(&scene);
    scroll_window(&doc, &controller, 150.0);
    assert_eq!(scene.progress(), 1.0);
}

#[test]
fn options_from_entries() {
    let scene_options = SceneOptions::from_entries([
        ("triggerHook", OptionValue::from("onLeave")),
        ("offset", OptionValue::from("40px")),
        ("duration", OptionValue::from(80.0)),
    ]);
    assert_eq!(scene_options.get("trigger_hook"), Some(&OptionValue::from("onLeave")));

    let (_doc, engine, _controller) = setup();
    let scene = engine.scene(scene_options.with("bogus", true));
    assert_eq!(scene.trigger_hook(), 0.0);
    assert_eq!(scene.offset(), 40.0);
    assert_eq!(scene.duration(), 80.0);
    assert_eq!(scene.option("bogus"), None);
    assert_eq!(scene.option(option_names::DURATION), Some(OptionValue::Number(80.0)));

    let controller_options = ControllerOptions::from_entries([
        ("vertical", OptionValue::from(false)),
        ("refreshInterval", OptionValue::from(50.0)),
        ("loglevel", OptionValue::from(3.0)),
        ("bogus", OptionValue::from(1.0)),
    ]);
    assert!(!controller_options.vertical);
    assert_eq!(controller_options.refresh_interval, 50);
    assert_eq!(controller_options.loglevel, LogLevel::Verbose);
    assert_eq!(controller_options.container, Target::Window);
}

#[test]
fn option_changes_emit_change_then_shift() {
    let (_doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    let details = Rc::new(RefCell::new(Vec::new()));
    for kind in [EventKind::Change, EventKind::Shift] {
        let details = Rc::clone(&details);
        scene.on(kind, move |e| details.borrow_mut().push(e.detail.clone()));
    }

    scene.set_offset(150.0);
    scene.set_offset(150.0);
    scene.set_reverse(false);
    scene.set_duration(-3.0);
    assert_eq!(
        *details.borrow(),
        [
            EventDetail::Change {
                what: "offset".into(),
                new_value: OptionValue::Number(150.0),
            },
            EventDetail::Shift {
                reason: ShiftReason::Offset,
            },
            EventDetail::Change {
                what: "reverse".into(),
                new_value: OptionValue::Bool(false),
            },
            EventDetail::Change {
                what: "duration".into(),
                new_value: OptionValue::Number(0.0),
            },
            EventDetail::Shift {
                reason: ShiftReason::Duration,
            },
        ]
    );
    assert_eq!(scene.scroll_bounds(), ScrollOffset { start: 150.0, end: 150.0 });
}

#[test]
fn signals_coalesce_into_one_frame() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    let updates = record(&scene, &[EventKind::Update]);
    let before = doc.frames_requested();

    controller.on_scroll();
    controller.on_scroll();
    controller.on_resize();
    controller.update_scene(&scene, false);
    assert_eq!(doc.frames_requested(), before + 1);

    controller.tick(0);
    assert_eq!(updates.borrow().len(), 1);

    controller.on_scroll();
    assert_eq!(doc.frames_requested(), before + 2);
}

#[test]
fn destroying_the_controller_cancels_pending_work() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    let log = record(&scene, &[EventKind::Destroy, EventKind::Update]);

    controller.on_scroll();
    controller.destroy(true);
    assert_eq!(doc.frames_cancelled(), 1);
    assert!(controller.is_destroyed());
    assert!(controller.scenes().is_empty());
    assert!(scene.is_destroyed());
    assert_eq!(scene.controller(), None);

    scroll_window(&doc, &controller, 150.0);
    assert_eq!(*log.borrow(), [EventKind::Destroy]);
}

#[test]
fn destroyed_scene_is_skipped_and_rejected() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    let log = record(&scene, &[EventKind::Update]);

    controller.on_scroll();
    scene.destroy(false);
    controller.tick(0);
    assert!(log.borrow().is_empty());

    controller.add_scene(&scene);
    assert!(controller.scenes().is_empty());
    scroll_window(&doc, &controller, 150.0);
    assert_eq!(scene.state(), SceneState::Before);
}

#[test]
fn sort_listener_survives_user_unsubscribe() {
    let (_doc, engine, controller) = setup();
    let a = engine.scene(SceneOptions::new().with_offset(300.0));
    let b = engine.scene(SceneOptions::new().with_offset(100.0));
    controller.add_scenes(&[a.clone(), b.clone()]);
    assert_eq!(controller.scenes(), [b.clone(), a.clone()]);

    a.set_offset(50.0);
    assert_eq!(controller.scenes(), [a.clone(), b.clone()]);

    assert_eq!(b.off(Off::Kind(EventKind::Shift)), 0);
    b.set_offset(10.0);
    assert_eq!(controller.scenes(), [b.clone(), a.clone()]);

    controller.remove_scene(&b);
    assert_eq!(b.controller(), None);
    assert_eq!(b.off(Off::Namespace("controller_sort".into())), 0);
}

#[test]
fn namespaced_subscriptions() {
    let (_doc, engine, _controller) = setup();
    let scene = engine.scene(SceneOptions::new());
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let id = scene.on(EventKind::Change, move |_| counter.set(counter.get() + 1));
    let counter = Rc::clone(&hits);
    scene.on_in(EventKind::Change, "tween", move |e| {
        assert_eq!(e.namespace.as_deref(), Some("tween"));
        counter.set(counter.get() + 10)
    });
    scene.on_in(EventKind::Progress, "tween", |_| {});

    scene.set_offset(5.0);
    assert_eq!(hits.get(), 11);

    assert_eq!(scene.off(Off::Namespace("tween".into())), 2);
    scene.set_offset(6.0);
    assert_eq!(hits.get(), 12);

    assert_eq!(scene.off(Off::Listener(id)), 1);
    scene.set_offset(7.0);
    assert_eq!(hits.get(), 12);

    scene.on(EventKind::Enter, |_| {});
    assert_eq!(scene.off(Off::All), 1);
}

#[test]
fn moving_a_scene_between_controllers() {
    let (doc, engine, first) = setup();
    let scroller = block(&doc, doc.body_element(), 0.0, 400.0);
    doc.set_name(scroller, "scroller");
    let second = engine
        .controller(ControllerOptions::new().with_container("#scroller"))
        .unwrap();
    assert!(!second.is_document());
    assert_eq!(second.info().size, 400.0);

    let scene = engine.scene(SceneOptions::new());
    let log = record(&scene, &[EventKind::Add, EventKind::Remove]);
    scene.add_to(&first);
    second.add_scene(&scene);
    assert_eq!(scene.controller(), Some(second.clone()));
    assert!(first.scenes().is_empty());
    assert_eq!(second.scenes(), [scene.clone()]);
    assert_eq!(
        *log.borrow(),
        [EventKind::Add, EventKind::Remove, EventKind::Add]
    );

    let other = Engine::new(doc.clone());
    let foreign = other.scene(SceneOptions::new());
    first.add_scene(&foreign);
    assert!(first.scenes().is_empty());
    assert_eq!(foreign.controller(), None);
}

#[test]
fn controller_requires_a_container() {
    let (doc, engine, _controller) = setup();
    let missing = engine.controller(ControllerOptions::new().with_container("#missing"));
    assert_eq!(missing.unwrap_err(), Error::NoScrollContainer);

    let body = engine
        .controller(ControllerOptions::new().with_container(doc.body_element()))
        .unwrap();
    assert!(body.is_document());
    assert_eq!(body.container(), Container::Window);
}

#[test]
fn scroll_to_targets() {
    let (doc, engine, controller) = setup();
    let target = block(&doc, doc.body_element(), 700.0, 50.0);
    doc.set_name(target, "target");
    let scene = engine.scene(SceneOptions::new().with_offset(320.0));
    controller.add_scene(&scene);

    controller.scroll_to(250.0, None);
    assert_eq!(doc.scroll_top(Container::Window), 250.0);
    assert_eq!(controller.scroll_pos(), 250.0);

    controller.scroll_to(&scene, None);
    assert_eq!(doc.scroll_top(Container::Window), 320.0);

    controller.scroll_to("#target", None);
    assert_eq!(doc.scroll_top(Container::Window), 700.0);

    controller.scroll_to("#missing", None);
    let stray = engine.scene(SceneOptions::new().with_offset(10.0));
    controller.scroll_to(&stray, None);
    assert_eq!(doc.scroll_top(Container::Window), 700.0);

    let calls = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&calls);
    controller.scroll_to(
        ScrollTarget::method(move |pos, extra| {
            seen.borrow_mut().push((pos, extra.cloned()));
        }),
        None,
    );
    controller.scroll_to(123.0, Some(OptionValue::from("smooth")));
    assert_eq!(*calls.borrow(), [(123.0, Some(OptionValue::from("smooth")))]);
    assert_eq!(doc.scroll_top(Container::Window), 700.0);
}

#[test]
fn custom_scroll_position_source() {
    let (_doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    let position = Rc::new(Cell::new(0.0));
    let source = Rc::clone(&position);
    controller.set_scroll_pos_fn(move || source.get());

    position.set(175.0);
    controller.on_scroll();
    controller.tick(0);
    assert_eq!(controller.info().scroll_pos, 175.0);
    assert_eq!(scene.progress(), 0.75);
}

#[test]
fn info_snapshot_and_keyed_access() {
    let (doc, engine, controller) = setup();
    let _scene = ranged_scene(&engine, &controller, 0.0, 10.0);
    scroll_window(&doc, &controller, 40.0);

    let info = controller.info();
    assert_eq!(
        info,
        ControllerInfo {
            size: 500.0,
            vertical: true,
            scroll_pos: 40.0,
            scroll_direction: ScrollDirection::Forward,
            container: Container::Window,
            is_document: true,
        }
    );
    assert_eq!(controller.info_value("size"), Some(InfoValue::Size(500.0)));
    assert_eq!(
        controller.info_value("scrollDirection"),
        Some(InfoValue::ScrollDirection(ScrollDirection::Forward))
    );
    assert_eq!(controller.info_value("bogus"), None);
}

#[test]
fn disabled_controller_defers_updates() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    let log = record(&scene, &[EventKind::Enter]);

    controller.set_enabled(false);
    scroll_window(&doc, &controller, 150.0);
    assert!(log.borrow().is_empty());
    assert_eq!(scene.state(), SceneState::Before);

    controller.set_enabled(true);
    controller.tick(0);
    assert_eq!(*log.borrow(), [EventKind::Enter]);
    assert_eq!(scene.progress(), 0.5);
}

#[test]
fn class_toggle_follows_enter_and_leave() {
    let (doc, engine, controller) = setup();
    let target = block(&doc, doc.body_element(), 600.0, 50.0);
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    scene.set_class_toggle(target, "active  highlighted");

    scroll_window(&doc, &controller, 150.0);
    assert!(doc.has_class(target, "active"));
    assert!(doc.has_class(target, "highlighted"));

    scroll_window(&doc, &controller, 300.0);
    assert!(!doc.has_class(target, "active"));

    scroll_window(&doc, &controller, 150.0);
    assert!(doc.has_class(target, "active"));
    scene.destroy(true);
    assert!(!doc.has_class(target, "active"));
    assert!(!doc.has_class(target, "highlighted"));
}

#[test]
fn pin_round_trip_restores_element() {
    let (doc, engine, controller) = setup();
    let body = doc.body_element();
    let before = block(&doc, body, 250.0, 50.0);
    let element = block(&doc, body, 300.0, 100.0);
    let after = block(&doc, body, 400.0, 50.0);
    doc.set_inline_style(element, "width", "200px");
    doc.set_inline_style(element, "margin-top", "10px");
    let styles = doc.inline_styles(element);

    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    scene.set_pin(element, PinSettings::default());
    let spacer = scene.pin_spacer().unwrap();
    assert_eq!(doc.parent(element), Some(spacer));
    assert_eq!(doc.children(body), [before, spacer, after]);
    assert!(doc.has_class(spacer, DEFAULT_SPACER_CLASS));

    scroll_window(&doc, &controller, 150.0);
    assert_eq!(doc.inline_style(element, "position"), "fixed");

    scene.remove_pin(true);
    assert!(!scene.has_pin());
    assert_eq!(doc.parent(element), Some(body));
    assert_eq!(doc.children(body), [before, element, after]);
    assert_eq!(doc.parent(spacer), None);
    assert_eq!(doc.inline_styles(element), styles);
    assert_eq!(doc.inline_style(body, "display"), "");
}

#[test]
fn pinned_element_pushes_followers() {
    let (doc, engine, controller) = setup();
    let element = block(&doc, doc.body_element(), 300.0, 100.0);
    let scene = ranged_scene(&engine, &controller, 100.0, 200.0);
    scene.set_pin(element, PinSettings::default());
    let spacer = scene.pin_spacer().unwrap();

    scroll_window(&doc, &controller, 200.0);
    assert_eq!(scene.progress(), 0.5);
    assert_eq!(doc.inline_style(spacer, "padding-top"), "100px");
    assert_eq!(doc.inline_style(spacer, "padding-bottom"), "100px");
    assert_eq!(doc.inline_style(spacer, "min-height"), "100px");
    assert_eq!(doc.inline_style(element, "position"), "fixed");
    assert_eq!(doc.inline_style(element, "top"), "200px");

    scroll_window(&doc, &controller, 400.0);
    assert_eq!(scene.state(), SceneState::After);
    assert_eq!(doc.inline_style(element, "position"), "relative");
    assert_eq!(doc.inline_style(spacer, "padding-top"), "200px");
    assert_eq!(doc.inline_style(spacer, "padding-bottom"), "0px");
}

#[test]
fn pin_without_pushing_followers_moves_with_progress() {
    let (doc, engine, controller) = setup();
    let element = block(&doc, doc.body_element(), 300.0, 100.0);
    let scene = ranged_scene(&engine, &controller, 100.0, 200.0);
    scene.set_pin(element, PinSettings::new().with_push_followers(false));
    let spacer = scene.pin_spacer().unwrap();

    scroll_window(&doc, &controller, 400.0);
    assert_eq!(doc.inline_style(element, "position"), "relative");
    assert_eq!(doc.inline_style(element, "top"), "200px");
    assert_eq!(doc.inline_style(spacer, "padding-top"), "");
}

#[test]
fn disabling_a_scene_releases_its_pin_in_place() {
    let (doc, engine, controller) = setup();
    let element = block(&doc, doc.body_element(), 300.0, 100.0);
    let scene = ranged_scene(&engine, &controller, 100.0, 200.0);
    scene.set_pin(element, PinSettings::default());
    scroll_window(&doc, &controller, 200.0);
    assert_eq!(doc.inline_style(element, "position"), "fixed");

    scene.set_enabled(false);
    assert_eq!(doc.inline_style(element, "position"), "relative");
    assert_eq!(scene.state(), SceneState::During);
}

#[test]
fn pin_rejects_fixed_and_missing_elements() {
    let (doc, engine, controller) = setup();
    let fixed = block(&doc, doc.body_element(), 0.0, 10.0);
    doc.set_style(fixed, "position", "fixed");
    let scene = ranged_scene(&engine, &controller, 0.0, 100.0);

    scene.set_pin(fixed, PinSettings::default());
    assert!(!scene.has_pin());
    scene.set_pin("#missing", PinSettings::default());
    assert!(!scene.has_pin());
}

#[test]
fn absolute_pin_stays_out_of_flow() {
    let (doc, engine, controller) = setup();
    let element = block(&doc, doc.body_element(), 300.0, 100.0);
    doc.set_style(element, "position", "absolute");
    doc.set_style(element, "width", "120px");
    let scene = ranged_scene(&engine, &controller, 100.0, 200.0);
    scene.set_pin(element, PinSettings::new().with_push_followers(true));
    let spacer = scene.pin_spacer().unwrap();

    assert_eq!(doc.inline_style(spacer, "position"), "absolute");
    assert_eq!(doc.inline_style(spacer, "width"), "120px");
    scroll_window(&doc, &controller, 200.0);
    assert_eq!(doc.inline_style(spacer, "padding-top"), "");
}

#[test]
fn repinning_replaces_the_previous_pin() {
    let (doc, engine, _controller) = setup();
    let first = block(&doc, doc.body_element(), 300.0, 100.0);
    let second = block(&doc, doc.body_element(), 500.0, 100.0);
    let scene = engine.scene(SceneOptions::new().with_duration(100.0));

    scene.set_pin(first, PinSettings::default());
    let spacer = scene.pin_spacer().unwrap();
    scene.set_pin(first, PinSettings::default());
    assert_eq!(scene.pin_spacer(), Some(spacer));

    // detached scenes reset the old pin completely
    scene.set_pin(second, PinSettings::default());
    assert_eq!(scene.pin_element(), Some(second));
    assert_eq!(doc.parent(first), Some(doc.body_element()));
    assert_eq!(doc.parent(spacer), None);
}

#[test]
fn cascaded_pins_unwind_in_any_order() {
    let (doc, engine, controller) = setup();
    let body = doc.body_element();
    let element = block(&doc, body, 300.0, 100.0);
    doc.set_inline_style(element, "height", "100px");
    let styles = doc.inline_styles(element);

    let outer = ranged_scene(&engine, &controller, 100.0, 100.0);
    let inner = ranged_scene(&engine, &controller, 300.0, 100.0);
    outer.set_pin(element, PinSettings::default());
    inner.set_pin(element, PinSettings::default());
    let outer_spacer = outer.pin_spacer().unwrap();
    let inner_spacer = inner.pin_spacer().unwrap();
    assert_eq!(doc.parent(element), Some(inner_spacer));
    assert_eq!(doc.parent(inner_spacer), Some(outer_spacer));

    outer.remove_pin(true);
    assert_eq!(doc.parent(inner_spacer), Some(body));
    assert_eq!(doc.parent(element), Some(inner_spacer));
    assert_ne!(doc.inline_styles(element), styles);

    inner.remove_pin(true);
    assert_eq!(doc.parent(element), Some(body));
    assert_eq!(doc.inline_styles(element), styles);
}

#[test]
fn trigger_element_inside_a_pin_is_measured_at_its_spacer() {
    let (doc, engine, controller) = setup();
    let element = block(&doc, doc.body_element(), 300.0, 100.0);
    let pinning = ranged_scene(&engine, &controller, 100.0, 200.0);
    pinning.set_pin(element, PinSettings::default());
    scroll_window(&doc, &controller, 200.0);

    let follower = engine.scene(
        SceneOptions::new()
            .with_trigger_element(element)
            .with_trigger_hook(TriggerHook::OnLeave),
    );
    controller.add_scene(&follower);
    assert_eq!(follower.scroll_offset(), 300.0);
}

#[test]
fn detached_trigger_element_is_reset() {
    let (doc, engine, controller) = setup();
    let trigger = block(&doc, doc.body_element(), 800.0, 50.0);
    let scene = engine.scene(SceneOptions::new().with_trigger_element(trigger));
    controller.add_scene(&scene);
    let log = record(&scene, &[EventKind::Change, EventKind::Shift]);

    doc.remove_child(doc.body_element(), trigger);
    scene.refresh();
    assert_eq!(scene.trigger_element(), None);
    assert_eq!(*log.borrow(), [EventKind::Shift, EventKind::Change]);
    assert_eq!(scene.scroll_offset(), 0.0);
}

#[test]
fn wheel_over_pin_scrolls_element_container() {
    let (doc, engine, window_controller) = setup();
    let scroller = block(&doc, doc.body_element(), 0.0, 400.0);
    doc.set_name(scroller, "scroller");
    let element = block(&doc, scroller, 200.0, 50.0);
    let controller = engine
        .controller(ControllerOptions::new().with_container("#scroller"))
        .unwrap();
    let scene = ranged_scene(&engine, &controller, 100.0, 200.0);
    scene.set_pin(element, PinSettings::default());

    let wheel = WheelDelta {
        wheel_delta: -120.0,
        ..WheelDelta::default()
    };
    assert!(!controller.handle_wheel(element, wheel));

    doc.set_scroll_position(Container::Element(scroller), Point::new(150.0, 0.0));
    controller.on_scroll();
    controller.tick(0);
    assert_eq!(scene.state(), SceneState::During);
    assert_eq!(doc.inline_style(element, "top"), "100px");

    assert!(controller.handle_wheel(element, wheel));
    assert_eq!(doc.scroll_top(Container::Element(scroller)), 190.0);

    let legacy = WheelDelta {
        detail: 1.0,
        ..WheelDelta::default()
    };
    assert!(controller.handle_wheel(element, legacy));
    assert_eq!(doc.scroll_top(Container::Element(scroller)), 180.0);

    // the document scrolls natively
    let banner = block(&doc, doc.body_element(), 600.0, 50.0);
    let other = ranged_scene(&engine, &window_controller, 0.0, 100.0);
    other.set_pin(banner, PinSettings::default());
    assert_eq!(other.state(), SceneState::During);
    assert!(!window_controller.handle_wheel(banner, wheel));
}

#[derive(Default)]
struct Tracer {
    attached: Cell<usize>,
    log: RefCell<Vec<String>>,
}

impl SceneExtension for Rc<Tracer> {
    fn on_attach(&self, _scene: &Scene) {
        self.attached.set(self.attached.get() + 1);
    }

    fn on_event(&self, _scene: &Scene, event: &SceneEvent) {
        if event.kind == EventKind::Enter {
            self.log.borrow_mut().push("extension".into());
        }
    }

    fn on_destroy(&self, _scene: &Scene, reset: bool) {
        self.log.borrow_mut().push(format!("destroy {reset}"));
    }
}

#[test]
fn engine_extensions_and_options() {
    let doc = Rc::new(MemoryDocument::new(1000.0, 500.0));
    let tracer = Rc::new(Tracer::default());
    let engine = Engine::builder(doc.clone())
        .register_option(OptionDescriptor::new("speed", 1.0).with_validator(|value| {
            match value.as_number() {
                Some(n) if n > 0.0 => Ok(OptionValue::Number(n)),
                _ => Err(OptionError::InvalidValue {
                    option: "speed".into(),
                    value: value.to_string(),
                }),
            }
        }))
        .register_option(OptionDescriptor::new("lead", 0.0).with_shifts(true))
        .register_option(OptionDescriptor::new("offset", 3.0))
        .register_extension(Rc::clone(&tracer))
        .build();
    assert_eq!(engine.option_descriptors().len(), 2);

    let controller = engine.controller(ControllerOptions::default()).unwrap();
    let scene = engine.scene(
        SceneOptions::new()
            .with("speed", 3.0)
            .with_offset(100.0)
            .with_duration(100.0),
    );
    assert_eq!(tracer.attached.get(), 1);
    assert_eq!(scene.option("speed"), Some(OptionValue::Number(3.0)));
    assert_eq!(scene.option("lead"), Some(OptionValue::Number(0.0)));
    assert_eq!(scene.offset(), 100.0);

    let details = Rc::new(RefCell::new(Vec::new()));
    for kind in [EventKind::Change, EventKind::Shift] {
        let details = Rc::clone(&details);
        scene.on(kind, move |e| details.borrow_mut().push(e.detail.clone()));
    }
    scene.set_option("speed", -1.0);
    scene.set_option("lead", 5.0);
    assert_eq!(scene.option("speed"), Some(OptionValue::Number(1.0)));
    assert_eq!(
        *details.borrow(),
        [
            EventDetail::Change {
                what: "speed".into(),
                new_value: OptionValue::Number(1.0),
            },
            EventDetail::Change {
                what: "lead".into(),
                new_value: OptionValue::Number(5.0),
            },
            EventDetail::Shift {
                reason: ShiftReason::Option("lead".into()),
            },
        ]
    );

    let log = Rc::clone(&tracer);
    scene.on(EventKind::Enter, move |_| log.log.borrow_mut().push("listener".into()));
    controller.add_scene(&scene);
    doc.set_scroll_position(Container::Window, Point::new(150.0, 0.0));
    controller.on_scroll();
    controller.tick(0);
    scene.destroy(false);
    assert_eq!(*tracer.log.borrow(), ["extension", "listener", "destroy false"]);
}

#[test]
fn global_scene_options_override_scene_options() {
    let doc = Rc::new(MemoryDocument::new(1000.0, 500.0));
    let engine = Engine::new(doc.clone());
    let controller = engine
        .controller(
            ControllerOptions::new()
                .with_global_scene_options(SceneOptions::new().with_reverse(false)),
        )
        .unwrap();
    let scene = engine.scene(SceneOptions::new().with_reverse(true));
    controller.add_scene(&scene);
    assert!(!scene.reverse());
}

#[test]
fn scene_snapshot() {
    let (doc, engine, controller) = setup();
    let scene = ranged_scene(&engine, &controller, 100.0, 100.0);
    scroll_window(&doc, &controller, 125.0);
    assert_eq!(
        scene.info(),
        SceneInfo {
            state: SceneState::During,
            progress: 0.25,
            scroll_offset: ScrollOffset { start: 100.0, end: 200.0 },
            duration: 100.0,
            enabled: true,
            pinned: false,
        }
    );
}

#[test]
fn parse_float_reads_leading_numbers() {
    assert_eq!(parse_float("12.5px"), 12.5);
    assert_eq!(parse_float("-3em"), -3.0);
    assert_eq!(parse_float(" .5"), 0.5);
    assert_eq!(parse_float("1e3px"), 1000.0);
    assert_eq!(parse_float("4e"), 4.0);
    assert!(parse_float("auto").is_nan());
    assert!(parse_float("-").is_nan());
}

#[test]
fn loglevel_conversions() {
    assert_eq!(LogLevel::from_number(0.0), Some(LogLevel::Silent));
    assert_eq!(LogLevel::from_number(3.0), Some(LogLevel::Verbose));
    assert_eq!(LogLevel::from_number(2.5), None);
    assert_eq!(LogLevel::from_number(4.0), None);

    let (_doc, engine, controller) = setup();
    let scene = engine.scene(SceneOptions::new().with_loglevel(LogLevel::Silent));
    assert_eq!(scene.loglevel(), LogLevel::Silent);
    scene.set_option("loglevel", 9.0);
    assert_eq!(scene.loglevel(), LogLevel::Warnings);
    controller.set_loglevel(LogLevel::Errors);
    assert_eq!(controller.loglevel(), LogLevel::Errors);
}
