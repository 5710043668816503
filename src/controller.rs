use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::events::{EventKind, Off};
use crate::{
    Container, ControllerInfo, ControllerOptions, ElementId, Extent, Host, InfoValue, LogLevel,
    OptionValue, Point, Scene, SceneOptions, ScrollDirection, Target, WheelDelta,
};

/// Namespace of the listener a controller subscribes on its scenes to keep them sorted.
const SORT_NAMESPACE: &str = "controller_sort";

/// Replacement for reading the container's native scroll position.
pub type ScrollPosFn = Rc<dyn Fn() -> f64>;

/// Replacement for writing the container's native scroll position. Receives the target position
/// and the extra argument given to [`Controller::scroll_to`].
pub type ScrollToFn = Rc<dyn Fn(f64, Option<&OptionValue>)>;

/// What [`Controller::scroll_to`] scrolls to.
#[derive(Clone)]
pub enum ScrollTarget {
    Offset(f64),
    /// The start of a scene attached to the controller.
    Scene(Scene),
    /// The document position of an element (a pinned element counts at its spacer's position).
    Element(Target),
    /// Installs a new scroll method instead of scrolling.
    Method(ScrollToFn),
}

impl ScrollTarget {
    pub fn method(f: impl Fn(f64, Option<&OptionValue>) + 'static) -> Self {
        Self::Method(Rc::new(f))
    }
}

impl From<f64> for ScrollTarget {
    fn from(offset: f64) -> Self {
        Self::Offset(offset)
    }
}

impl From<Scene> for ScrollTarget {
    fn from(scene: Scene) -> Self {
        Self::Scene(scene)
    }
}

impl From<&Scene> for ScrollTarget {
    fn from(scene: &Scene) -> Self {
        Self::Scene(scene.clone())
    }
}

impl From<ElementId> for ScrollTarget {
    fn from(element: ElementId) -> Self {
        Self::Element(Target::Element(element))
    }
}

impl From<&str> for ScrollTarget {
    fn from(selector: &str) -> Self {
        Self::Element(Target::Selector(selector.into()))
    }
}

impl From<Target> for ScrollTarget {
    fn from(target: Target) -> Self {
        Self::Element(target)
    }
}

impl fmt::Debug for ScrollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset(offset) => f.debug_tuple("Offset").field(offset).finish(),
            Self::Scene(scene) => f.debug_tuple("Scene").field(&scene.id()).finish(),
            Self::Element(target) => f.debug_tuple("Element").field(target).finish(),
            Self::Method(_) => f.write_str("Method(..)"),
        }
    }
}

/// Scenes waiting for the next update pass.
#[derive(Default)]
enum Pending {
    #[default]
    None,
    All,
    Scenes(Vec<Scene>),
}

struct ControllerState {
    /// Attached scenes, ascending by scroll offset.
    scenes: Vec<Scene>,
    scroll_pos: f64,
    scroll_direction: ScrollDirection,
    viewport_size: f64,
    enabled: bool,
    pending: Pending,
    frame_requested: bool,
    refresh_interval: u64,
    next_refresh_ms: Option<u64>,
    loglevel: LogLevel,
    global_scene_options: SceneOptions,
    scroll_pos_fn: Option<ScrollPosFn>,
    scroll_to_fn: Option<ScrollToFn>,
    destroyed: bool,
}

pub(crate) struct ControllerInner {
    engine: Engine,
    container: Container,
    is_document: bool,
    vertical: bool,
    state: RefCell<ControllerState>,
}

/// Owns one scroll container and drives the scenes attached to it.
///
/// The controller holds no platform listeners. The host forwards signals:
/// - `on_scroll` / `on_resize` when the container scrolls or resizes,
/// - `on_document_scroll` / `on_document_resize` for the window when the container is an element,
/// - `tick(now_ms)` on the animation frame it requested, and periodically for the refresh timer.
///
/// Signals only mark scenes dirty and request one frame; everything between two frames collapses
/// into a single update pass.
#[derive(Clone)]
pub struct Controller {
    inner: Rc<ControllerInner>,
}

fn sort_scenes(scenes: &mut [Scene]) {
    scenes.sort_by(|a, b| a.scroll_offset().total_cmp(&b.scroll_offset()));
}

impl Controller {
    pub(crate) fn new(engine: &Engine, options: ControllerOptions) -> Result<Self> {
        let host = engine.host();
        let level = options.loglevel;
        let resolved = match &options.container {
            Target::Window => Some(Container::Window),
            target => host
                .resolve_elements(target)
                .first()
                .copied()
                .map(Container::Element),
        };
        let Some(container) = resolved else {
            log_error!(level, container = ?options.container, "no valid scroll container supplied");
            return Err(Error::NoScrollContainer);
        };
        let is_document = match (container, host.body()) {
            (Container::Window, _) | (_, None) => true,
            (Container::Element(element), Some(body)) => {
                element == body || !host.contains(body, element)
            }
        };
        let container = if is_document {
            Container::Window
        } else {
            container
        };

        let controller = Self {
            inner: Rc::new(ControllerInner {
                engine: engine.clone(),
                container,
                is_document,
                vertical: options.vertical,
                state: RefCell::new(ControllerState {
                    scenes: Vec::new(),
                    scroll_pos: 0.0,
                    scroll_direction: ScrollDirection::Paused,
                    viewport_size: 0.0,
                    enabled: true,
                    pending: Pending::None,
                    frame_requested: false,
                    refresh_interval: options.refresh_interval,
                    next_refresh_ms: None,
                    loglevel: level,
                    global_scene_options: options.global_scene_options,
                    scroll_pos_fn: None,
                    scroll_to_fn: None,
                    destroyed: false,
                }),
            }),
        };
        let size = controller.measure_viewport();
        controller.state_mut().viewport_size = size;
        log_debug!(level, ?container, is_document, size, "controller created");
        Ok(controller)
    }

    pub(crate) fn from_inner(inner: Rc<ControllerInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ControllerInner> {
        Rc::downgrade(&self.inner)
    }

    fn state(&self) -> Ref<'_, ControllerState> {
        self.inner.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, ControllerState> {
        self.inner.state.borrow_mut()
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.inner.engine
    }

    fn host(&self) -> &dyn Host {
        self.inner.engine.host().as_ref()
    }

    pub fn container(&self) -> Container {
        self.inner.container
    }

    /// Whether the container is the document (window) itself.
    pub fn is_document(&self) -> bool {
        self.inner.is_document
    }

    pub fn vertical(&self) -> bool {
        self.inner.vertical
    }

    pub(crate) fn viewport_size(&self) -> f64 {
        self.state().viewport_size
    }

    pub(crate) fn cached_scroll_pos(&self) -> f64 {
        self.state().scroll_pos
    }

    pub fn scroll_direction(&self) -> ScrollDirection {
        self.state().scroll_direction
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Attached scenes, ascending by scroll offset.
    pub fn scenes(&self) -> Vec<Scene> {
        self.state().scenes.clone()
    }

    fn measure_viewport(&self) -> f64 {
        if self.vertical() {
            self.host().height(self.container(), Extent::Client)
        } else {
            self.host().width(self.container(), Extent::Client)
        }
    }

    // --- scenes ----------------------------------------------------------------------------------

    /// Attaches a scene. A scene attached elsewhere is moved; adding it twice does nothing.
    ///
    /// The controller's global scene options are applied to the scene.
    pub fn add_scene(&self, scene: &Scene) {
        let level = self.loglevel();
        if self.is_destroyed() {
            log_error!(level, "add_scene: controller was destroyed");
            return;
        }
        if !scene.engine().ptr_eq(self.engine()) {
            log_error!(level, scene = scene.id(), "add_scene: scene belongs to another engine");
            return;
        }
        if scene.is_destroyed() {
            log_error!(level, scene = scene.id(), "add_scene: scene was destroyed");
            return;
        }
        if scene.controller().as_ref() != Some(self) {
            // attaches through the scene, which calls back into this method
            scene.add_to(self);
            return;
        }
        if self.state().scenes.contains(scene) {
            return;
        }

        let total = {
            let mut state = self.state_mut();
            state.scenes.push(scene.clone());
            sort_scenes(&mut state.scenes);
            state.scenes.len()
        };
        let weak = self.downgrade();
        scene.on_in(EventKind::Shift, SORT_NAMESPACE, move |_| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Ok(mut state) = inner.state.try_borrow_mut() {
                sort_scenes(&mut state.scenes);
            }
        });

        let global = self.state().global_scene_options.clone();
        for (key, value) in global.entries() {
            scene.set_option(key, value.clone());
        }
        log_debug!(level, scene = scene.id(), total, "scene added");
    }

    pub fn add_scenes(&self, scenes: &[Scene]) {
        for scene in scenes {
            self.add_scene(scene);
        }
    }

    /// Detaches a scene. Scenes of other controllers are ignored.
    pub fn remove_scene(&self, scene: &Scene) {
        let index = self.state().scenes.iter().position(|s| s == scene);
        let Some(index) = index else {
            return;
        };
        scene.off(Off::KindInNamespace(EventKind::Shift, SORT_NAMESPACE.into()));
        let total = {
            let mut state = self.state_mut();
            state.scenes.remove(index);
            if let Pending::Scenes(list) = &mut state.pending {
                list.retain(|s| s != scene);
            }
            state.scenes.len()
        };
        scene.remove();
        log_debug!(self.loglevel(), scene = scene.id(), total, "scene removed");
    }

    pub fn remove_scenes(&self, scenes: &[Scene]) {
        for scene in scenes {
            self.remove_scene(scene);
        }
    }

    // --- updates ---------------------------------------------------------------------------------

    /// Re-measures the viewport and schedules every scene; with `immediately` the pass runs now.
    pub fn update(&self, immediately: bool) {
        if self.is_destroyed() {
            return;
        }
        self.handle_change(true);
        if immediately {
            self.run_update_pass();
        }
    }

    /// Recomputes one scene now, or queues it for the next update pass.
    pub fn update_scene(&self, scene: &Scene, immediately: bool) {
        if immediately {
            scene.update(true);
            return;
        }
        {
            let mut state = self.state_mut();
            if state.destroyed {
                return;
            }
            match &mut state.pending {
                Pending::All => return,
                pending @ Pending::None => *pending = Pending::Scenes(vec![scene.clone()]),
                Pending::Scenes(list) => {
                    if !list.contains(scene) {
                        list.push(scene.clone());
                    }
                }
            }
        }
        self.request_frame();
    }

    pub fn update_scenes(&self, scenes: &[Scene], immediately: bool) {
        for scene in scenes {
            self.update_scene(scene, immediately);
        }
    }

    /// A scroll or resize happened: mark every scene dirty.
    fn handle_change(&self, resize: bool) {
        if resize {
            let size = self.measure_viewport();
            let mut state = self.state_mut();
            state.viewport_size = size;
            state.scroll_direction = ScrollDirection::Paused;
        }
        self.state_mut().pending = Pending::All;
        self.request_frame();
    }

    fn request_frame(&self) {
        {
            let mut state = self.state_mut();
            if state.frame_requested {
                return;
            }
            state.frame_requested = true;
        }
        self.host().request_frame();
    }

    fn run_update_pass(&self) {
        let mut scenes = {
            let mut state = self.state_mut();
            if !state.enabled {
                return;
            }
            match std::mem::take(&mut state.pending) {
                Pending::None => return,
                Pending::All => state.scenes.clone(),
                Pending::Scenes(list) => list,
            }
        };
        sort_scenes(&mut scenes);

        let scroll_pos = self.scroll_pos();
        let direction = {
            let mut state = self.state_mut();
            let delta = scroll_pos - state.scroll_pos;
            state.scroll_pos = scroll_pos;
            state.scroll_direction = if delta > 0.0 {
                ScrollDirection::Forward
            } else if delta < 0.0 {
                ScrollDirection::Reverse
            } else {
                ScrollDirection::Paused
            };
            state.scroll_direction
        };
        if direction == ScrollDirection::Reverse {
            scenes.reverse();
        }
        log_trace!(
            self.loglevel(),
            scroll_pos,
            ?direction,
            scenes = scenes.len(),
            "update pass"
        );
        for scene in &scenes {
            scene.update(true);
        }
    }

    /// Re-measures every scene. For element containers a changed viewport size is handled as a
    /// resize first.
    pub fn refresh(&self) {
        if self.is_destroyed() {
            return;
        }
        if !self.is_document() && self.measure_viewport() != self.viewport_size() {
            self.on_resize();
        }
        for scene in self.scenes() {
            scene.refresh();
        }
    }

    // --- host signals ----------------------------------------------------------------------------

    pub fn on_scroll(&self) {
        if self.is_destroyed() {
            return;
        }
        self.handle_change(false);
    }

    pub fn on_resize(&self) {
        if self.is_destroyed() {
            return;
        }
        self.handle_change(true);
        for scene in self.scenes() {
            scene.on_container_resize();
            if self.is_document() {
                scene.update_relative_pin_spacer();
            }
        }
    }

    /// The window scrolled. For document containers this is [`Self::on_scroll`].
    pub fn on_document_scroll(&self) {
        if self.is_document() {
            self.on_scroll();
            return;
        }
        for scene in self.scenes() {
            scene.update_pin_in_container();
        }
    }

    /// The window resized. For document containers this is [`Self::on_resize`].
    pub fn on_document_resize(&self) {
        if self.is_document() {
            self.on_resize();
            return;
        }
        for scene in self.scenes() {
            scene.update_pin_in_container();
            scene.update_relative_pin_spacer();
        }
    }

    /// Wheel input over `element`. Returns `true` when a scene pinning it scrolled the container,
    /// in which case the host should suppress the native scroll.
    pub fn handle_wheel(&self, element: ElementId, delta: WheelDelta) -> bool {
        self.scenes()
            .iter()
            .filter(|scene| scene.pin_element() == Some(element))
            .any(|scene| scene.handle_wheel(delta))
    }

    /// Runs the pending update pass and, when due, the periodic refresh.
    pub fn tick(&self, now_ms: u64) {
        if self.is_destroyed() {
            return;
        }
        self.state_mut().frame_requested = false;
        self.run_update_pass();

        let refresh_due = {
            let mut state = self.state_mut();
            let interval = state.refresh_interval;
            let next = state.next_refresh_ms;
            match next {
                _ if interval == 0 => false,
                Some(at) if now_ms < at => false,
                Some(_) => {
                    state.next_refresh_ms = Some(now_ms + interval);
                    true
                }
                None => {
                    state.next_refresh_ms = Some(now_ms + interval);
                    false
                }
            }
        };
        if refresh_due {
            self.refresh();
        }
    }

    // --- scrolling -------------------------------------------------------------------------------

    /// Live scroll position of the container (custom function if installed).
    pub fn scroll_pos(&self) -> f64 {
        let custom = self.state().scroll_pos_fn.clone();
        if let Some(f) = custom {
            return f();
        }
        if self.vertical() {
            self.host().scroll_top(self.container())
        } else {
            self.host().scroll_left(self.container())
        }
    }

    /// Replaces how the scroll position is read, for containers whose scroll state is not native.
    pub fn set_scroll_pos_fn(&self, f: impl Fn() -> f64 + 'static) {
        self.state_mut().scroll_pos_fn = Some(Rc::new(f));
    }

    pub(crate) fn set_scroll_pos(&self, pos: f64, extra: Option<&OptionValue>) {
        let custom = self.state().scroll_to_fn.clone();
        if let Some(f) = custom {
            f(pos, extra);
            return;
        }
        let host = self.host();
        let container = self.container();
        let position = if self.vertical() {
            Point::new(pos, host.scroll_left(container))
        } else {
            Point::new(host.scroll_top(container), pos)
        };
        host.set_scroll_position(container, position);
    }

    /// Scrolls the container. Invalid targets are logged and ignored.
    pub fn scroll_to(&self, target: impl Into<ScrollTarget>, extra: Option<OptionValue>) {
        let level = self.loglevel();
        match target.into() {
            ScrollTarget::Offset(pos) if pos.is_finite() => self.set_scroll_pos(pos, extra.as_ref()),
            ScrollTarget::Offset(pos) => {
                log_warn!(level, pos, "scroll_to: invalid offset, scroll cancelled");
            }
            ScrollTarget::Scene(scene) => {
                if scene.controller().as_ref() == Some(self) {
                    self.set_scroll_pos(scene.scroll_offset(), extra.as_ref());
                } else {
                    log_warn!(
                        level,
                        scene = scene.id(),
                        "scroll_to: scene does not belong to this controller, scroll cancelled"
                    );
                }
            }
            ScrollTarget::Method(f) => self.state_mut().scroll_to_fn = Some(f),
            ScrollTarget::Element(target) => {
                let host = self.host();
                let Some(mut element) = host.resolve_elements(&target).first().copied() else {
                    log_warn!(level, ?target, "scroll_to: element not found, scroll cancelled");
                    return;
                };
                {
                    let pins = self.engine().pins();
                    while let Some(parent) = host.parent(element) {
                        if !pins.is_spacer(parent) {
                            break;
                        }
                        element = parent;
                    }
                }
                let vertical = self.vertical();
                let mut container_offset = host.offset(self.container(), false).along(vertical);
                if !self.is_document() {
                    container_offset -= self.scroll_pos();
                }
                let element_offset = host.offset(Container::Element(element), false).along(vertical);
                self.set_scroll_pos(element_offset - container_offset, extra.as_ref());
            }
        }
    }

    // --- state -----------------------------------------------------------------------------------

    pub fn info(&self) -> ControllerInfo {
        let state = self.state();
        ControllerInfo {
            size: state.viewport_size,
            vertical: self.vertical(),
            scroll_pos: state.scroll_pos,
            scroll_direction: state.scroll_direction,
            container: self.container(),
            is_document: self.is_document(),
        }
    }

    /// One field of [`Self::info`]. Unknown keys are logged and yield `None`.
    pub fn info_value(&self, key: &str) -> Option<InfoValue> {
        let value = self.info().get(key);
        if value.is_none() {
            log_error!(self.loglevel(), key, "info: unknown key");
        }
        value
    }

    pub fn enabled(&self) -> bool {
        self.state().enabled
    }

    /// Enables or disables updates. A change immediately updates every scene, so pins are released
    /// when disabling.
    pub fn set_enabled(&self, enabled: bool) {
        {
            let mut state = self.state_mut();
            if state.enabled == enabled {
                return;
            }
            state.enabled = enabled;
        }
        self.update_scenes(&self.scenes(), true);
    }

    pub fn loglevel(&self) -> LogLevel {
        self.state().loglevel
    }

    pub fn set_loglevel(&self, loglevel: LogLevel) {
        self.state_mut().loglevel = loglevel;
    }

    /// Destroys every attached scene (undoing their side effects with `reset_scenes`) and cancels
    /// pending work. The controller ignores all further signals.
    pub fn destroy(&self, reset_scenes: bool) {
        let (frame_requested, scenes) = {
            let mut state = self.state_mut();
            if state.destroyed {
                return;
            }
            state.next_refresh_ms = None;
            (
                std::mem::take(&mut state.frame_requested),
                state.scenes.clone(),
            )
        };
        if frame_requested {
            self.host().cancel_frame();
        }
        for scene in scenes.iter().rev() {
            scene.destroy(reset_scenes);
        }
        let mut state = self.state_mut();
        state.pending = Pending::None;
        state.scenes.clear();
        state.destroyed = true;
        log_debug!(state.loglevel, reset_scenes, "controller destroyed");
    }
}

impl PartialEq for Controller {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Controller {}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Controller");
        debug
            .field("container", &self.inner.container)
            .field("is_document", &self.inner.is_document)
            .field("vertical", &self.inner.vertical);
        if let Ok(state) = self.inner.state.try_borrow() {
            debug
                .field("scenes", &state.scenes.len())
                .field("scroll_pos", &state.scroll_pos)
                .field("enabled", &state.enabled);
        }
        debug.finish_non_exhaustive()
    }
}
