//! Capabilities the engine needs from its environment.
//!
//! A browser binding implements these over the DOM; [`crate::headless::MemoryDocument`] implements
//! them in memory. The engine holds the host as `Rc<dyn Host>` and never talks to anything else.

use crate::{Container, ElementId, Extent, Point, Target};

/// Measurement capability.
///
/// Hosts absorb their own platform quirks here (vendor prefixes, legacy box models); the engine
/// only ever asks these six questions.
pub trait Geometry {
    fn width(&self, target: Container, extent: Extent) -> f64;

    fn height(&self, target: Container, extent: Extent) -> f64;

    /// Position of the target's border box.
    ///
    /// Relative to the document unless `relative_to_viewport` is set. The window itself is
    /// always at the origin.
    fn offset(&self, target: Container, relative_to_viewport: bool) -> Point;

    fn scroll_top(&self, target: Container) -> f64;

    fn scroll_left(&self, target: Container) -> f64;

    /// Resolved value of a CSS property (kebab-case name), e.g. `"position"` or `"margin-top"`.
    fn computed_style(&self, element: ElementId, property: &str) -> String;
}

/// Full host capability: measurement, tree and style mutation, scrolling and frame scheduling.
pub trait Host: Geometry {
    /// Resolves a target into elements, in document order. Unknown targets resolve to nothing.
    fn resolve_elements(&self, target: &Target) -> Vec<ElementId>;

    /// The document body, if any.
    fn body(&self) -> Option<ElementId>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    fn first_child(&self, element: ElementId) -> Option<ElementId>;

    fn create_element(&self, tag: &str) -> ElementId;

    /// Inserts `node` into `parent` before `reference`, or at the end when `reference` is `None`.
    /// A node that already has a parent is moved.
    fn insert_before(&self, parent: ElementId, node: ElementId, reference: Option<ElementId>);

    fn append_child(&self, parent: ElementId, node: ElementId) {
        self.insert_before(parent, node, None);
    }

    fn remove_child(&self, parent: ElementId, node: ElementId);

    /// Inline style value (empty when unset).
    fn inline_style(&self, element: ElementId, property: &str) -> String;

    /// Sets an inline style value; an empty value removes the property.
    fn set_inline_style(&self, element: ElementId, property: &str, value: &str);

    fn add_class(&self, element: ElementId, class: &str);

    fn remove_class(&self, element: ElementId, class: &str);

    fn set_scroll_position(&self, target: Container, position: Point);

    /// Asks for one animation frame; the host answers by calling `Controller::tick`.
    fn request_frame(&self);

    fn cancel_frame(&self);
}
