use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::controller::ControllerInner;
use crate::engine::Engine;
use crate::error::OptionError;
use crate::events::{
    Callback, EventBus, EventDetail, EventKind, ListenerId, Off, SceneEvent, ShiftReason,
};
use crate::options::{
    self, DURATION, DurationInput, LOGLEVEL, OFFSET, REVERSE, TRIGGER_ELEMENT, TRIGGER_HOOK,
    ValueFn,
};
use crate::pin::PinBinding;
use crate::toggle::ClassToggle;
use crate::{
    Container, Controller, ElementId, Host, LogLevel, OptionValue, SceneOptions, SceneState,
    ScrollDirection, ScrollOffset,
};

/// Duration that is recomputed instead of fixed.
#[derive(Clone)]
enum DurationSource {
    /// Fraction of the controller's viewport size.
    Percent(f64),
    Function(ValueFn),
}

pub(crate) struct SceneCore {
    pub(crate) duration: f64,
    duration_source: Option<DurationSource>,
    pub(crate) offset: f64,
    pub(crate) trigger_element: Option<ElementId>,
    pub(crate) trigger_hook: f64,
    pub(crate) reverse: bool,
    pub(crate) loglevel: LogLevel,
    extra: Vec<(String, OptionValue)>,

    trigger_pos: f64,
    pub(crate) scroll_offset: ScrollOffset,
    pub(crate) state: SceneState,
    pub(crate) progress: f64,
    pub(crate) enabled: bool,
    controller: Option<Weak<ControllerInner>>,
    pub(crate) pin: Option<PinBinding>,
    pub(crate) class_toggle: Option<ClassToggle>,
    destroyed: bool,
}

pub(crate) struct SceneInner {
    id: u64,
    engine: Engine,
    core: RefCell<SceneCore>,
    bus: RefCell<EventBus<EventKind, SceneEvent>>,
}

/// Values every event of one transition carries.
#[derive(Clone, Copy)]
struct Snapshot {
    progress: f64,
    state: SceneState,
    scroll_direction: ScrollDirection,
}

/// A scroll range with lifecycle events and an optional pin.
///
/// `Scene` is a cheap handle; clones refer to the same scene. Scenes are created with
/// [`Engine::scene`], attached with [`Scene::add_to`] or [`Controller::add_scene`] and driven by the
/// controller's update pass.
///
/// Progress is derived from the controller's scroll position:
/// - with a duration, `progress = (scroll_pos - start) / duration`, clamped into `[0, 1]` through
///   the state machine (`Before`, `During`, `After`);
/// - without one, progress is `0` (`Before`) or `1` (`During`) and there is no `After` state.
#[derive(Clone)]
pub struct Scene {
    inner: Rc<SceneInner>,
}

impl Scene {
    pub(crate) fn new(engine: &Engine, options: SceneOptions) -> Self {
        let extra = engine
            .option_descriptors()
            .iter()
            .map(|d| (d.name.clone(), d.default.clone()))
            .collect();
        let scene = Self {
            inner: Rc::new(SceneInner {
                id: engine.next_scene_id(),
                engine: engine.clone(),
                core: RefCell::new(SceneCore {
                    duration: 0.0,
                    duration_source: None,
                    offset: 0.0,
                    trigger_element: None,
                    trigger_hook: 0.5,
                    reverse: true,
                    loglevel: LogLevel::default(),
                    extra,
                    trigger_pos: 0.0,
                    scroll_offset: ScrollOffset::default(),
                    state: SceneState::Before,
                    progress: 0.0,
                    enabled: true,
                    controller: None,
                    pin: None,
                    class_toggle: None,
                    destroyed: false,
                }),
                bus: RefCell::new(EventBus::new()),
            }),
        };

        if let Some(level) = options.get(LOGLEVEL) {
            scene.apply_option(LOGLEVEL, level);
        }
        for (key, value) in options.entries() {
            if key == LOGLEVEL {
                continue;
            }
            if options::canonical_scene_option(key).is_some() || engine.descriptor(key).is_some() {
                scene.apply_option(key, value);
            } else {
                log_warn!(scene.loglevel(), "unknown scene option {key:?} dropped");
            }
        }
        scene.update_scroll_offset();

        for extension in engine.extensions() {
            extension.on_attach(&scene);
        }
        log_debug!(scene.loglevel(), scene = scene.id(), "scene created");
        scene
    }

    pub(crate) fn from_inner(inner: Rc<SceneInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<SceneInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn core(&self) -> Ref<'_, SceneCore> {
        self.inner.core.borrow()
    }

    pub(crate) fn core_mut(&self) -> RefMut<'_, SceneCore> {
        self.inner.core.borrow_mut()
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.inner.engine
    }

    pub(crate) fn host(&self) -> &dyn Host {
        self.inner.engine.host().as_ref()
    }

    /// Identifier unique within the scene's engine.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.core().destroyed
    }

    pub fn controller(&self) -> Option<Controller> {
        let weak = self.core().controller.clone()?;
        weak.upgrade().map(Controller::from_inner)
    }

    // --- lifecycle -------------------------------------------------------------------------------

    /// Attaches the scene to `controller`, detaching it from its previous controller first.
    pub fn add_to(&self, controller: &Controller) {
        let level = self.loglevel();
        if self.is_destroyed() {
            log_error!(level, scene = self.id(), "add_to: scene was destroyed");
            return;
        }
        if !controller.engine().ptr_eq(self.engine()) {
            log_error!(level, scene = self.id(), "add_to: controller belongs to another engine");
            return;
        }
        if controller.is_destroyed() {
            log_error!(level, scene = self.id(), "add_to: controller was destroyed");
            return;
        }
        if self.controller().as_ref() == Some(controller) {
            return;
        }
        if let Some(previous) = self.controller() {
            previous.remove_scene(self);
        }

        self.core_mut().controller = Some(controller.downgrade());
        self.update_duration(true);
        self.update_trigger_element_position(true);
        self.update_scroll_offset();
        controller.add_scene(self);
        self.trigger(EventKind::Add, EventDetail::None);
        log_debug!(level, scene = self.id(), "added to controller");
        self.update(false);
    }

    /// Detaches the scene from its controller. Pins stay in place.
    pub fn remove(&self) {
        let Some(weak) = self.core_mut().controller.take() else {
            return;
        };
        if let Some(controller) = weak.upgrade().map(Controller::from_inner) {
            controller.remove_scene(self);
        }
        self.trigger(EventKind::Remove, EventDetail::None);
        log_debug!(self.loglevel(), scene = self.id(), "removed from controller");
    }

    /// Detaches the scene and drops every subscription. With `reset`, pin and class toggle side
    /// effects are undone. A destroyed scene ignores further calls.
    pub fn destroy(&self, reset: bool) {
        if self.is_destroyed() {
            return;
        }
        self.trigger(EventKind::Destroy, EventDetail::Destroy { reset });
        for extension in self.engine().extensions() {
            extension.on_destroy(self, reset);
        }
        self.remove();
        self.inner.bus.borrow_mut().clear();
        self.core_mut().destroyed = true;
        log_debug!(self.loglevel(), scene = self.id(), reset, "scene destroyed");
    }

    /// Recomputes progress from the controller's scroll position.
    ///
    /// Without `immediately` the scene is only queued for the controller's next update pass.
    pub fn update(&self, immediately: bool) {
        if self.is_destroyed() {
            return;
        }
        let Some(controller) = self.controller() else {
            return;
        };
        if !immediately {
            controller.update_scene(self, false);
            return;
        }

        if controller.enabled() && self.enabled() {
            let scroll_pos = controller.cached_scroll_pos();
            let (ScrollOffset { start, end }, duration) = {
                let core = self.core();
                (core.scroll_offset, core.duration)
            };
            let progress = if duration > 0.0 {
                (scroll_pos - start) / (end - start)
            } else if scroll_pos >= start {
                1.0
            } else {
                0.0
            };
            self.trigger(
                EventKind::Update,
                EventDetail::Update {
                    start_pos: start,
                    end_pos: end,
                    scroll_pos,
                },
            );
            self.set_progress(progress);
        } else if self.has_pin() && self.state() == SceneState::During {
            // unpin in place
            self.update_pin_state(true);
        }
    }

    /// Re-evaluates a duration function and re-measures the trigger element.
    ///
    /// Emits `shift` only for values that actually changed.
    pub fn refresh(&self) {
        if self.is_destroyed() {
            return;
        }
        self.update_duration(false);
        self.update_trigger_element_position(false);
    }

    // --- progress --------------------------------------------------------------------------------

    pub fn progress(&self) -> f64 {
        self.core().progress
    }

    pub fn state(&self) -> SceneState {
        self.core().state
    }

    /// Moves the scene to `progress`, emitting lifecycle events for the resulting transition.
    ///
    /// Events of one transition are ordered `enter`, `start`/`end` (boundary left behind),
    /// `progress`, `start`/`end` (boundary reached), `leave`, and all carry the same progress,
    /// state and scroll direction.
    pub fn set_progress(&self, progress: f64) {
        if self.is_destroyed() || progress.is_nan() {
            return;
        }
        let scroll_direction = self
            .controller()
            .map_or(ScrollDirection::Paused, |c| c.scroll_direction());

        let mut hold_pin = false;
        let (old_state, changed, snapshot) = {
            let mut core = self.core_mut();
            let old_state = core.state;
            let reverse_or_forward = core.reverse || progress >= core.progress;
            let mut changed = false;

            if core.duration == 0.0 {
                let quantised = if progress < 1.0 && reverse_or_forward {
                    0.0
                } else {
                    1.0
                };
                changed = quantised != core.progress;
                core.progress = quantised;
                core.state = if quantised == 0.0 {
                    SceneState::Before
                } else {
                    SceneState::During
                };
            } else if progress < 0.0 && core.state != SceneState::Before && reverse_or_forward {
                core.progress = 0.0;
                core.state = SceneState::Before;
                changed = true;
            } else if (0.0..1.0).contains(&progress) && reverse_or_forward {
                core.progress = progress;
                core.state = SceneState::During;
                changed = true;
            } else if progress >= 1.0 && core.state != SceneState::After {
                core.progress = 1.0;
                core.state = SceneState::After;
                changed = true;
            } else if core.state == SceneState::During && !reverse_or_forward {
                hold_pin = true;
            }

            let snapshot = Snapshot {
                progress: core.progress,
                state: core.state,
                scroll_direction,
            };
            (old_state, changed, snapshot)
        };

        if hold_pin {
            // progress is held, the pin must not move back with the content
            self.update_pin_state(false);
        }
        if !changed {
            return;
        }

        let state_changed = snapshot.state != old_state;
        let boundary = |state: SceneState| {
            if state == SceneState::Before {
                EventKind::Start
            } else {
                EventKind::End
            }
        };
        if state_changed && old_state != SceneState::During {
            self.emit(EventKind::Enter, EventDetail::None, snapshot);
            self.emit(boundary(old_state), EventDetail::None, snapshot);
        }
        self.emit(EventKind::Progress, EventDetail::None, snapshot);
        if state_changed && snapshot.state != SceneState::During {
            self.emit(boundary(snapshot.state), EventDetail::None, snapshot);
            self.emit(EventKind::Leave, EventDetail::None, snapshot);
        }
    }

    // --- geometry --------------------------------------------------------------------------------

    /// Scroll position at which the scene starts.
    pub fn scroll_offset(&self) -> f64 {
        self.core().scroll_offset.start
    }

    pub fn scroll_bounds(&self) -> ScrollOffset {
        self.core().scroll_offset
    }

    /// Position of the trigger in the scroll content, including `offset`.
    ///
    /// Without a trigger element this is the position of the trigger hook in the viewport.
    pub fn trigger_position(&self) -> f64 {
        let controller = self.controller();
        let core = self.core();
        let mut position = core.offset;
        if let Some(controller) = controller {
            if core.trigger_element.is_some() {
                position += core.trigger_pos;
            } else {
                position += controller.viewport_size() * core.trigger_hook;
            }
        }
        position
    }

    fn update_scroll_offset(&self) {
        let size = self.controller().map(|c| c.viewport_size());
        let mut core = self.core_mut();
        let mut start = core.trigger_pos + core.offset;
        if let (Some(size), Some(_)) = (size, core.trigger_element) {
            start -= size * core.trigger_hook;
        }
        core.scroll_offset = ScrollOffset {
            start,
            end: start + core.duration,
        };
    }

    fn update_duration(&self, suppress_events: bool) {
        let Some(source) = self.core().duration_source.clone() else {
            return;
        };
        let duration = match self.evaluate_duration(&source) {
            Ok(duration) => duration,
            Err(e) => {
                log_error!(self.loglevel(), scene = self.id(), "{e}");
                self.core_mut().duration_source = None;
                0.0
            }
        };
        if self.store(|c| &mut c.duration, duration) && !suppress_events {
            self.trigger(
                EventKind::Change,
                EventDetail::Change {
                    what: DURATION.into(),
                    new_value: OptionValue::Number(duration),
                },
            );
            self.trigger(
                EventKind::Shift,
                EventDetail::Shift {
                    reason: ShiftReason::Duration,
                },
            );
        }
    }

    fn evaluate_duration(&self, source: &DurationSource) -> Result<f64, OptionError> {
        let value = match source {
            DurationSource::Percent(fraction) => self
                .controller()
                .map_or(0.0, |c| c.viewport_size() * fraction),
            DurationSource::Function(f) => f(),
        };
        options::validate_duration_value(value, true)
    }

    fn update_trigger_element_position(&self, suppress_events: bool) {
        let Some(controller) = self.controller() else {
            return;
        };
        let (trigger_element, trigger_pos) = {
            let core = self.core();
            (core.trigger_element, core.trigger_pos)
        };
        if trigger_element.is_none() && trigger_pos == 0.0 {
            return;
        }

        let mut element_pos = 0.0;
        if let Some(element) = trigger_element {
            let host = self.host();
            if host.parent(element).is_some() {
                let vertical = controller.vertical();
                // measure the outermost spacer so pinned elements report their flow position
                let mut measured = element;
                {
                    let pins = self.engine().pins();
                    while let Some(parent) = host.parent(measured) {
                        if !pins.is_spacer(parent) {
                            break;
                        }
                        measured = parent;
                    }
                }
                let mut container_offset = host.offset(controller.container(), false).along(vertical);
                if !controller.is_document() {
                    container_offset -= controller.scroll_pos();
                }
                element_pos =
                    host.offset(Container::Element(measured), false).along(vertical) - container_offset;
            } else {
                log_warn!(
                    self.loglevel(),
                    scene = self.id(),
                    "trigger element was removed from the document and is reset"
                );
                self.set_trigger_element(OptionValue::Null);
            }
        }

        if self.store(|c| &mut c.trigger_pos, element_pos) && !suppress_events {
            self.trigger(
                EventKind::Shift,
                EventDetail::Shift {
                    reason: ShiftReason::TriggerElementPosition,
                },
            );
        }
    }

    pub(crate) fn on_container_resize(&self) {
        if self.core().trigger_hook > 0.0 {
            self.trigger(
                EventKind::Shift,
                EventDetail::Shift {
                    reason: ShiftReason::ContainerResize,
                },
            );
        }
    }

    // --- options ---------------------------------------------------------------------------------

    pub fn duration(&self) -> f64 {
        self.core().duration
    }

    /// A number, a viewport percentage (`"50%"`) or an [`OptionValue::Function`].
    pub fn set_duration(&self, duration: impl Into<OptionValue>) {
        self.set_option(DURATION, duration);
    }

    pub fn offset(&self) -> f64 {
        self.core().offset
    }

    pub fn set_offset(&self, offset: f64) {
        self.set_option(OFFSET, offset);
    }

    pub fn trigger_element(&self) -> Option<ElementId> {
        self.core().trigger_element
    }

    /// An element, a selector, or [`OptionValue::Null`] to clear it.
    pub fn set_trigger_element(&self, target: impl Into<OptionValue>) {
        self.set_option(TRIGGER_ELEMENT, target);
    }

    pub fn trigger_hook(&self) -> f64 {
        self.core().trigger_hook
    }

    pub fn set_trigger_hook(&self, hook: impl Into<OptionValue>) {
        self.set_option(TRIGGER_HOOK, hook);
    }

    pub fn reverse(&self) -> bool {
        self.core().reverse
    }

    pub fn set_reverse(&self, reverse: bool) {
        self.set_option(REVERSE, reverse);
    }

    pub fn loglevel(&self) -> LogLevel {
        self.core().loglevel
    }

    pub fn set_loglevel(&self, loglevel: LogLevel) {
        self.set_option(LOGLEVEL, loglevel);
    }

    pub fn enabled(&self) -> bool {
        self.core().enabled
    }

    /// A disabled scene keeps its state but stops updating; an active pin is released in place.
    pub fn set_enabled(&self, enabled: bool) {
        if self.store(|c| &mut c.enabled, enabled) {
            self.update(true);
        }
    }

    /// Current value of a built-in or registered option. Unknown names are logged.
    pub fn option(&self, name: &str) -> Option<OptionValue> {
        if let Some(key) = options::canonical_scene_option(name) {
            return Some(self.option_value(key));
        }
        if self.engine().descriptor(name).is_some() {
            return Some(self.option_value(name));
        }
        log_error!(self.loglevel(), scene = self.id(), "unknown option {name:?}");
        None
    }

    /// Validates and stores an option.
    ///
    /// An actual change emits `change`, followed by `shift` when the option moves the scroll
    /// bounds. Invalid values are logged and replaced by the option's default.
    pub fn set_option(&self, name: &str, value: impl Into<OptionValue>) {
        let value = value.into();
        let level = self.loglevel();
        if self.is_destroyed() {
            log_warn!(level, scene = self.id(), "set_option on a destroyed scene ignored");
            return;
        }
        let key = match options::canonical_scene_option(name) {
            Some(key) => key.to_string(),
            None if self.engine().descriptor(name).is_some() => name.to_string(),
            None => {
                log_error!(level, scene = self.id(), "unknown option {name:?}");
                return;
            }
        };
        if !self.apply_option(&key, &value) {
            return;
        }

        let new_value = self.option_value(&key);
        log_trace!(level, scene = self.id(), option = %key, "option changed");
        let shift = self.shift_reason(&key);
        self.trigger(
            EventKind::Change,
            EventDetail::Change {
                what: key,
                new_value,
            },
        );
        if let Some(reason) = shift {
            self.trigger(EventKind::Shift, EventDetail::Shift { reason });
        }
    }

    fn shift_reason(&self, key: &str) -> Option<ShiftReason> {
        match key {
            DURATION => Some(ShiftReason::Duration),
            OFFSET => Some(ShiftReason::Offset),
            TRIGGER_HOOK => Some(ShiftReason::TriggerHook),
            _ => self
                .engine()
                .descriptor(key)
                .filter(|d| d.shifts)
                .map(|d| ShiftReason::Option(d.name.clone())),
        }
    }

    fn option_value(&self, key: &str) -> OptionValue {
        let core = self.core();
        match key {
            DURATION => OptionValue::Number(core.duration),
            OFFSET => OptionValue::Number(core.offset),
            TRIGGER_ELEMENT => core.trigger_element.into(),
            TRIGGER_HOOK => OptionValue::Number(core.trigger_hook),
            REVERSE => OptionValue::Bool(core.reverse),
            LOGLEVEL => core.loglevel.into(),
            _ => core
                .extra
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
        }
    }

    /// Validates and stores one option without emitting events. Returns whether it changed.
    fn apply_option(&self, key: &str, value: &OptionValue) -> bool {
        let key = options::canonical_scene_option(key).unwrap_or(key);
        let level = self.loglevel();
        let or_default = |result: Result<_, OptionError>, default| {
            result.unwrap_or_else(|e| {
                log_error!(level, "{e}");
                default
            })
        };
        match key {
            DURATION => self.apply_duration(value),
            OFFSET => {
                let offset = or_default(options::validate_offset(value), 0.0);
                self.store(|c| &mut c.offset, offset)
            }
            TRIGGER_ELEMENT => {
                let element = options::validate_trigger_element(value, self.host())
                    .unwrap_or_else(|e| {
                        log_error!(level, "{e}");
                        None
                    });
                self.store(|c| &mut c.trigger_element, element)
            }
            TRIGGER_HOOK => {
                let hook = or_default(options::validate_trigger_hook(value), 0.5);
                self.store(|c| &mut c.trigger_hook, hook)
            }
            REVERSE => self.store(|c| &mut c.reverse, options::validate_reverse(value)),
            LOGLEVEL => {
                let loglevel = options::validate_loglevel(value).unwrap_or_else(|e| {
                    log_error!(level, "{e}");
                    LogLevel::default()
                });
                self.store(|c| &mut c.loglevel, loglevel)
            }
            _ => {
                let Some(descriptor) = self.engine().descriptor(key) else {
                    return false;
                };
                let validated = (descriptor.validate)(value).unwrap_or_else(|e| {
                    log_error!(level, "{e}");
                    descriptor.default.clone()
                });
                let mut core = self.core_mut();
                match core.extra.iter_mut().find(|(k, _)| k == key) {
                    Some(slot) => {
                        let changed = slot.1 != validated;
                        slot.1 = validated;
                        changed
                    }
                    None => {
                        core.extra.push((key.to_string(), validated));
                        true
                    }
                }
            }
        }
    }

    fn apply_duration(&self, value: &OptionValue) -> bool {
        let level = self.loglevel();
        let input = options::validate_duration(value).unwrap_or_else(|e| {
            log_error!(level, "{e}");
            DurationInput::Fixed(0.0)
        });
        let source = match input {
            DurationInput::Fixed(duration) => {
                self.core_mut().duration_source = None;
                return self.store(|c| &mut c.duration, duration);
            }
            DurationInput::Percent(fraction) => DurationSource::Percent(fraction),
            DurationInput::Dynamic(f) => DurationSource::Function(f),
        };
        let duration = match self.evaluate_duration(&source) {
            Ok(duration) => {
                self.core_mut().duration_source = Some(source);
                duration
            }
            Err(e) => {
                log_error!(level, "{e}");
                self.core_mut().duration_source = None;
                0.0
            }
        };
        self.store(|c| &mut c.duration, duration)
    }

    /// Replaces a field, returning whether the value changed.
    fn store<T: PartialEq>(&self, field: impl FnOnce(&mut SceneCore) -> &mut T, value: T) -> bool {
        let mut core = self.core_mut();
        let slot = field(&mut core);
        let changed = *slot != value;
        *slot = value;
        changed
    }

    // --- events ----------------------------------------------------------------------------------

    pub fn on(&self, kind: EventKind, callback: impl Fn(&SceneEvent) + 'static) -> ListenerId {
        self.subscribe(kind, None, Rc::new(callback))
    }

    /// Subscribes with a namespace tag, so the subscription can be removed with
    /// [`Off::Namespace`] or [`Off::KindInNamespace`].
    pub fn on_in(
        &self,
        kind: EventKind,
        namespace: impl Into<String>,
        callback: impl Fn(&SceneEvent) + 'static,
    ) -> ListenerId {
        self.subscribe(kind, Some(namespace.into()), Rc::new(callback))
    }

    fn subscribe(
        &self,
        kind: EventKind,
        namespace: Option<String>,
        callback: Callback<SceneEvent>,
    ) -> ListenerId {
        self.inner.bus.borrow_mut().subscribe(kind, namespace, callback)
    }

    /// Removes subscriptions; returns how many were removed.
    pub fn off(&self, filter: Off<EventKind>) -> usize {
        self.inner.bus.borrow_mut().unsubscribe(&filter)
    }

    pub(crate) fn trigger(&self, kind: EventKind, detail: EventDetail) {
        let scroll_direction = self
            .controller()
            .map_or(ScrollDirection::Paused, |c| c.scroll_direction());
        let snapshot = {
            let core = self.core();
            Snapshot {
                progress: core.progress,
                state: core.state,
                scroll_direction,
            }
        };
        self.emit(kind, detail, snapshot);
    }

    fn emit(&self, kind: EventKind, detail: EventDetail, snapshot: Snapshot) {
        if self.is_destroyed() {
            return;
        }
        log_trace!(self.loglevel(), scene = self.id(), event = ?kind, "event");
        let mut event = SceneEvent {
            kind,
            namespace: None,
            target: self.clone(),
            progress: snapshot.progress,
            state: snapshot.state,
            scroll_direction: snapshot.scroll_direction,
            detail,
        };

        self.react(&event);
        for extension in self.engine().extensions() {
            extension.on_event(self, &event);
        }

        let listeners = self.inner.bus.borrow().listeners_for(kind, None);
        for (namespace, callback) in listeners {
            event.namespace = namespace;
            callback(&event);
        }
    }

    /// The scene's own reactions, run before extensions and subscribers.
    fn react(&self, event: &SceneEvent) {
        match (event.kind, &event.detail) {
            (EventKind::Change, EventDetail::Change { what, .. }) => match what.as_str() {
                TRIGGER_ELEMENT => self.update_trigger_element_position(false),
                REVERSE => self.update(false),
                _ => {}
            },
            (EventKind::Shift, EventDetail::Shift { reason }) => {
                self.update_scroll_offset();
                self.update(false);

                let duration_changed = *reason == ShiftReason::Duration;
                let (state, duration) = {
                    let core = self.core();
                    (core.state, core.duration)
                };
                if (state == SceneState::After && duration_changed)
                    || (state == SceneState::During && duration == 0.0)
                {
                    self.update_pin_state(false);
                }
                if duration_changed {
                    self.update_pin_dimensions();
                }
            }
            (EventKind::Progress, _) => self.update_pin_state(false),
            (EventKind::Enter, _) => self.apply_class_toggle(true),
            (EventKind::Leave, _) => self.apply_class_toggle(false),
            (EventKind::Add, _) => self.update_pin_dimensions(),
            (EventKind::Destroy, EventDetail::Destroy { reset }) => {
                self.remove_pin(*reset);
                self.remove_class_toggle(*reset);
            }
            _ => {}
        }
    }
}

impl PartialEq for Scene {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Scene {}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(core) = self.inner.core.try_borrow() else {
            return f.debug_struct("Scene").field("id", &self.inner.id).finish_non_exhaustive();
        };
        f.debug_struct("Scene")
            .field("id", &self.inner.id)
            .field("state", &core.state)
            .field("progress", &core.progress)
            .field("scroll_offset", &core.scroll_offset)
            .field("duration", &core.duration)
            .field("pinned", &core.pin.is_some())
            .finish_non_exhaustive()
    }
}
