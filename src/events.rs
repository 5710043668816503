use std::fmt;
use std::rc::Rc;

use crate::{OptionValue, Scene, SceneState, ScrollDirection};

/// Identifies one subscription so it can be removed individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Event types emitted by a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An option changed value.
    Change,
    /// The scene's scroll bounds moved.
    Shift,
    /// The controller recomputed the scene (fires even if progress did not change).
    Update,
    Progress,
    Enter,
    Leave,
    Start,
    End,
    /// Attached to a controller.
    Add,
    /// Detached from its controller.
    Remove,
    Destroy,
}

/// Why the scroll bounds of a scene moved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShiftReason {
    Duration,
    Offset,
    TriggerHook,
    TriggerElementPosition,
    ContainerResize,
    /// An extension option registered with `shifts = true` changed.
    Option(String),
}

/// Event-specific payload.
#[derive(Clone, Debug, PartialEq)]
pub enum EventDetail {
    None,
    Change { what: String, new_value: OptionValue },
    Shift { reason: ShiftReason },
    Update { start_pos: f64, end_pos: f64, scroll_pos: f64 },
    Destroy { reset: bool },
}

/// What a scene listener receives.
#[derive(Clone, Debug)]
pub struct SceneEvent {
    pub kind: EventKind,
    /// Namespace of the subscription that is being invoked.
    pub namespace: Option<String>,
    pub target: Scene,
    pub progress: f64,
    pub state: SceneState,
    pub scroll_direction: ScrollDirection,
    pub detail: EventDetail,
}

/// Which subscriptions `off` removes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Off<K> {
    /// Every subscription on the instance.
    All,
    /// Subscriptions of the kind made without a namespace.
    Kind(K),
    /// Every subscription tagged with the namespace, whatever its kind.
    Namespace(String),
    KindInNamespace(K, String),
    Listener(ListenerId),
}

pub type Callback<E> = Rc<dyn Fn(&E)>;

struct Listener<K, E> {
    id: ListenerId,
    kind: K,
    namespace: Option<String>,
    callback: Callback<E>,
}

/// Per-instance publish/subscribe with optional namespace tags.
pub struct EventBus<K, E> {
    listeners: Vec<Listener<K, E>>,
    next_id: u64,
}

impl<K, E> Default for EventBus<K, E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<K: Copy + PartialEq, E> EventBus<K, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: K,
        namespace: Option<String>,
        callback: Callback<E>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            namespace,
            callback,
        });
        id
    }

    /// Removes matching subscriptions and returns how many were removed.
    pub fn unsubscribe(&mut self, filter: &Off<K>) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|l| !matches_filter(l, filter));
        before - self.listeners.len()
    }

    /// Snapshot of the callbacks to invoke for `kind`.
    ///
    /// With a `namespace`, only subscriptions tagged with it are returned. Dispatching from a
    /// snapshot lets callbacks subscribe or unsubscribe while an event is being delivered.
    pub fn listeners_for(
        &self,
        kind: K,
        namespace: Option<&str>,
    ) -> Vec<(Option<String>, Callback<E>)> {
        self.listeners
            .iter()
            .filter(|l| l.kind == kind)
            .filter(|l| namespace.is_none() || l.namespace.as_deref() == namespace)
            .map(|l| (l.namespace.clone(), Rc::clone(&l.callback)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

fn matches_filter<K: PartialEq, E>(listener: &Listener<K, E>, filter: &Off<K>) -> bool {
    match filter {
        Off::All => true,
        Off::Kind(kind) => listener.kind == *kind && listener.namespace.is_none(),
        Off::Namespace(ns) => listener.namespace.as_deref() == Some(ns.as_str()),
        Off::KindInNamespace(kind, ns) => {
            listener.kind == *kind && listener.namespace.as_deref() == Some(ns.as_str())
        }
        Off::Listener(id) => listener.id == *id,
    }
}

impl<K: fmt::Debug, E> fmt::Debug for EventBus<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
