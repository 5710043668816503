use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::Result;
use crate::scene::SceneInner;
use crate::{Controller, ControllerOptions, ElementId, Host, OptionDescriptor, Scene, SceneEvent, SceneOptions};

/// Behaviour composed into every scene an engine creates.
///
/// All hooks have empty defaults. `on_event` runs after the scene's own reactions and before
/// subscribers registered with [`Scene::on`].
pub trait SceneExtension {
    fn on_attach(&self, _scene: &Scene) {}

    fn on_event(&self, _scene: &Scene, _event: &SceneEvent) {}

    fn on_destroy(&self, _scene: &Scene, _reset: bool) {}
}

/// Factory for controllers and scenes sharing one host.
///
/// An engine owns everything that would otherwise be process-wide: registered extra options,
/// scene extensions and the registry of pin spacers. Scenes can only be added to controllers of
/// the engine that created them.
#[derive(Clone)]
pub struct Engine {
    pub(crate) inner: Rc<EngineInner>,
}

pub(crate) struct EngineInner {
    pub(crate) host: Rc<dyn Host>,
    pub(crate) descriptors: Vec<OptionDescriptor>,
    pub(crate) extensions: Vec<Rc<dyn SceneExtension>>,
    pins: RefCell<PinRegistry>,
    next_scene_id: Cell<u64>,
}

impl Engine {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self::builder(host).build()
    }

    pub fn builder(host: Rc<dyn Host>) -> EngineBuilder {
        EngineBuilder {
            host,
            descriptors: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Creates a controller over `options.container`.
    ///
    /// Fails with [`crate::Error::NoScrollContainer`] when the container resolves to nothing.
    pub fn controller(&self, options: ControllerOptions) -> Result<Controller> {
        Controller::new(self, options)
    }

    /// Creates a detached scene. Invalid options are logged and fall back to their defaults.
    pub fn scene(&self, options: SceneOptions) -> Scene {
        Scene::new(self, options)
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.inner.host
    }

    pub fn option_descriptors(&self) -> &[OptionDescriptor] {
        &self.inner.descriptors
    }

    pub(crate) fn descriptor(&self, name: &str) -> Option<&OptionDescriptor> {
        self.inner.descriptors.iter().find(|d| d.name == name)
    }

    pub(crate) fn extensions(&self) -> &[Rc<dyn SceneExtension>] {
        &self.inner.extensions
    }

    pub(crate) fn pins(&self) -> Ref<'_, PinRegistry> {
        self.inner.pins.borrow()
    }

    pub(crate) fn pins_mut(&self) -> RefMut<'_, PinRegistry> {
        self.inner.pins.borrow_mut()
    }

    pub(crate) fn next_scene_id(&self) -> u64 {
        let id = self.inner.next_scene_id.get();
        self.inner.next_scene_id.set(id + 1);
        id
    }

    pub(crate) fn ptr_eq(&self, other: &Engine) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("descriptors", &self.inner.descriptors)
            .field("extensions", &self.inner.extensions.len())
            .field("spacers", &self.inner.pins.borrow().spacers.len())
            .finish_non_exhaustive()
    }
}

pub struct EngineBuilder {
    host: Rc<dyn Host>,
    descriptors: Vec<OptionDescriptor>,
    extensions: Vec<Rc<dyn SceneExtension>>,
}

impl EngineBuilder {
    /// Adds an extra scene option. A later descriptor with the same name replaces the earlier one;
    /// built-in option names cannot be overridden.
    pub fn register_option(mut self, descriptor: OptionDescriptor) -> Self {
        if crate::options::canonical_scene_option(&descriptor.name).is_some() {
            log_warn!(
                crate::LogLevel::default(),
                name = %descriptor.name,
                "option descriptor shadows a built-in option and was ignored"
            );
            return self;
        }
        self.descriptors.retain(|d| d.name != descriptor.name);
        self.descriptors.push(descriptor);
        self
    }

    pub fn register_extension(mut self, extension: impl SceneExtension + 'static) -> Self {
        self.extensions.push(Rc::new(extension));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            inner: Rc::new(EngineInner {
                host: self.host,
                descriptors: self.descriptors,
                extensions: self.extensions,
                pins: RefCell::new(PinRegistry::default()),
                next_scene_id: Cell::new(0),
            }),
        }
    }
}

struct SpacerLink {
    /// The spacer this one is nested in (cascaded pins).
    parent: Option<ElementId>,
    owner: Weak<SceneInner>,
}

/// Spacers created by pins, linked into chains for cascaded pins.
///
/// Also keeps the inline styles a pinned element had before its first pin, restored once the last
/// spacer around it is gone.
#[derive(Default)]
pub(crate) struct PinRegistry {
    spacers: BTreeMap<ElementId, SpacerLink>,
    orig_styles: BTreeMap<ElementId, Vec<(&'static str, String)>>,
}

impl PinRegistry {
    pub(crate) fn register(
        &mut self,
        spacer: ElementId,
        parent: Option<ElementId>,
        owner: Weak<SceneInner>,
    ) {
        self.spacers.insert(spacer, SpacerLink { parent, owner });
    }

    pub(crate) fn is_spacer(&self, element: ElementId) -> bool {
        self.spacers.contains_key(&element)
    }

    /// The scene owning the spacer that `spacer` is nested in.
    pub(crate) fn parent_owner(&self, spacer: ElementId) -> Option<Scene> {
        let parent = self.spacers.get(&spacer)?.parent?;
        let owner = self.spacers.get(&parent)?.owner.upgrade()?;
        Some(Scene::from_inner(owner))
    }

    /// Removes a spacer; spacers nested in it are relinked to its parent.
    pub(crate) fn unregister(&mut self, spacer: ElementId) {
        let Some(link) = self.spacers.remove(&spacer) else {
            return;
        };
        for child in self.spacers.values_mut() {
            if child.parent == Some(spacer) {
                child.parent = link.parent;
            }
        }
    }

    /// Records an element's inline styles unless a snapshot already exists.
    pub(crate) fn record_orig_style(
        &mut self,
        element: ElementId,
        styles: impl FnOnce() -> Vec<(&'static str, String)>,
    ) {
        self.orig_styles.entry(element).or_insert_with(styles);
    }

    pub(crate) fn take_orig_style(
        &mut self,
        element: ElementId,
    ) -> Option<Vec<(&'static str, String)>> {
        self.orig_styles.remove(&element)
    }
}
