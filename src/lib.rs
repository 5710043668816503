//! A headless scroll-synchronized scene engine.
//!
//! A [`Controller`] watches one scroll container. [`Scene`]s describe a scroll range (a start
//! derived from a trigger element, a hook fraction of the viewport and an offset, plus a
//! duration) and emit lifecycle events (`enter`, `start`, `progress`, `end`, `leave`) as the
//! scroll position crosses it. A scene can pin an element for its duration and toggle classes
//! while it is active.
//!
//! The engine never touches a platform directly. Everything it needs from its environment goes
//! through the [`Host`] capability:
//! - element resolution, tree and inline style mutation,
//! - measurement ([`Geometry`]),
//! - scroll position writes and animation frame requests.
//!
//! The host forwards scroll/resize signals to the controller and calls [`Controller::tick`] on the
//! frames it was asked for. [`headless::MemoryDocument`] is an in-memory host for tests and
//! non-browser embedding.
//!
//! ```
//! use std::rc::Rc;
//! use scrollscene::headless::MemoryDocument;
//! use scrollscene::{ControllerOptions, Engine, EventKind, SceneOptions};
//!
//! let doc = Rc::new(MemoryDocument::new(800.0, 500.0));
//! let engine = Engine::new(doc.clone());
//! let controller = engine.controller(ControllerOptions::default()).unwrap();
//! let scene = engine.scene(SceneOptions::new().with_offset(100.0).with_duration(200.0));
//! scene.on(EventKind::Enter, |e| println!("entered at {}", e.progress));
//! controller.add_scene(&scene);
//! ```
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod engine;
mod error;
mod events;
mod geometry;
pub mod headless;
mod host;
mod options;
mod pin;
mod scene;
mod state;
mod toggle;
mod types;

#[cfg(test)]
mod tests;

pub use controller::{Controller, ScrollPosFn, ScrollTarget, ScrollToFn};
pub use engine::{Engine, EngineBuilder, SceneExtension};
pub use error::{Error, OptionError, Result};
pub use events::{Callback, EventBus, EventDetail, EventKind, ListenerId, Off, SceneEvent, ShiftReason};
pub use geometry::parse_float;
pub use host::{Geometry, Host};
pub use options::{
    ControllerOptions, DEFAULT_REFRESH_INTERVAL_MS, OptionDescriptor, OptionValue, SceneOptions,
    Validator, ValueFn,
};
pub use pin::{DEFAULT_SPACER_CLASS, PinSettings};
pub use scene::Scene;
pub use state::{ControllerInfo, InfoValue, SceneInfo};
pub use types::{
    Container, ElementId, Extent, LogLevel, Point, SceneState, ScrollDirection, ScrollOffset, Size,
    Target, TriggerHook, WheelDelta,
};

/// Names of the built-in scene options, as used by keyed access.
pub mod option_names {
    pub use crate::options::{DURATION, LOGLEVEL, OFFSET, REVERSE, TRIGGER_ELEMENT, TRIGGER_HOOK};
}
