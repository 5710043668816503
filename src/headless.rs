//! An in-memory [`Host`] for tests and non-browser embedding.
//!
//! Layout is explicit rather than computed: elements get a box with [`MemoryDocument::set_rect`],
//! in scroll-content coordinates. Elements without a box (pin spacers) take the position of their
//! first child and the size of their in-flow children plus padding, bounded by `min-width` /
//! `min-height`. A `px` `width` / `height` style overrides the box size. Fixed elements are placed
//! by their `top` / `left` styles relative to the viewport.
//!
//! Styles are read verbatim: inline styles first, then per-element "stylesheet" values set with
//! [`MemoryDocument::set_style`], then defaults. Shorthands are not expanded.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use crate::geometry::float_or_zero;
use crate::{Container, ElementId, Extent, Geometry, Host, Point, Size, Target};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Rect {
    top: f64,
    left: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Default)]
struct Node {
    tag: String,
    /// The element's `id` attribute.
    name: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    inline: BTreeMap<String, String>,
    sheet: BTreeMap<String, String>,
    classes: Vec<String>,
    rect: Option<Rect>,
    scroll: Point,
}

#[derive(Debug)]
struct Document {
    nodes: BTreeMap<ElementId, Node>,
    next_id: u64,
    body: ElementId,
    window: Size,
    window_scroll: Point,
    frames_requested: usize,
    frames_cancelled: usize,
}

fn default_style(tag: &str, property: &str) -> &'static str {
    match property {
        "position" => "static",
        "display" => match tag {
            "span" | "a" | "img" => "inline",
            _ => "block",
        },
        "box-sizing" => "content-box",
        "width" | "height" | "top" | "left" | "bottom" | "right" => "auto",
        "margin" | "margin-top" | "margin-bottom" | "margin-left" | "margin-right" => "0px",
        "padding-top" | "padding-bottom" | "padding-left" | "padding-right" => "0px",
        "min-width" | "min-height" => "0px",
        _ => "",
    }
}

/// Property names for one axis: size, min size, leading/trailing padding and margin.
struct Axis {
    size: &'static str,
    min: &'static str,
    padding: [&'static str; 2],
    margin: [&'static str; 2],
}

const HEIGHT: Axis = Axis {
    size: "height",
    min: "min-height",
    padding: ["padding-top", "padding-bottom"],
    margin: ["margin-top", "margin-bottom"],
};

const WIDTH: Axis = Axis {
    size: "width",
    min: "min-width",
    padding: ["padding-left", "padding-right"],
    margin: ["margin-left", "margin-right"],
};

impl Document {
    fn new(window: Size) -> Self {
        let body = ElementId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            body,
            Node {
                tag: "body".into(),
                rect: Some(Rect {
                    width: window.width,
                    height: window.height,
                    ..Rect::default()
                }),
                ..Node::default()
            },
        );
        Self {
            nodes,
            next_id: 1,
            body,
            window,
            window_scroll: Point::default(),
            frames_requested: 0,
            frames_cancelled: 0,
        }
    }

    fn create(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                tag: tag.into(),
                ..Node::default()
            },
        );
        id
    }

    fn detach(&mut self, node: ElementId) {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|&c| c != node);
        }
    }

    fn insert_before(&mut self, parent: ElementId, node: ElementId, reference: Option<ElementId>) {
        if !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&node) {
            return;
        }
        self.detach(node);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let index = reference
                .and_then(|r| parent_node.children.iter().position(|&c| c == r))
                .unwrap_or(parent_node.children.len());
            parent_node.children.insert(index, node);
        }
        if let Some(node) = self.nodes.get_mut(&node) {
            node.parent = Some(parent);
        }
    }

    fn style(&self, element: ElementId, property: &str) -> String {
        let Some(node) = self.nodes.get(&element) else {
            return String::new();
        };
        node.inline
            .get(property)
            .or_else(|| node.sheet.get(property))
            .cloned()
            .unwrap_or_else(|| default_style(&node.tag, property).to_string())
    }

    fn px(&self, element: ElementId, property: &str) -> f64 {
        float_or_zero(&self.style(element, property))
    }

    fn is_fixed(&self, element: ElementId) -> bool {
        self.style(element, "position") == "fixed"
    }

    /// Scroll-content position, ignoring fixed positioning and ancestor scrolling.
    fn flow_position(&self, element: ElementId) -> Point {
        let mut position = self.box_position(element);
        if self.style(element, "position") == "relative" {
            position.top += self.px(element, "top");
            position.left += self.px(element, "left");
        }
        position
    }

    /// Position of the element's own box, or of the box it wraps.
    fn box_position(&self, element: ElementId) -> Point {
        let Some(node) = self.nodes.get(&element) else {
            return Point::default();
        };
        match (node.rect, node.children.first()) {
            (Some(rect), _) => Point::new(rect.top, rect.left),
            (None, Some(&child)) => self.box_position(child),
            (None, None) => self.ancestor_position(node.parent),
        }
    }

    /// Position of the nearest ancestor with a box.
    fn ancestor_position(&self, mut ancestor: Option<ElementId>) -> Point {
        while let Some(node) = ancestor.and_then(|a| self.nodes.get(&a)) {
            if let Some(rect) = node.rect {
                return Point::new(rect.top, rect.left);
            }
            ancestor = node.parent;
        }
        Point::default()
    }

    fn content_size(&self, element: ElementId, axis: &Axis) -> f64 {
        let Some(node) = self.nodes.get(&element) else {
            return 0.0;
        };
        let declared = self.style(element, axis.size);
        let size = if declared.ends_with("px") {
            float_or_zero(&declared)
        } else if let Some(rect) = node.rect {
            if axis.size == "height" {
                rect.height
            } else {
                rect.width
            }
        } else {
            let in_flow = node.children.iter().filter(|&&c| !self.is_fixed(c));
            let sizes = in_flow.map(|&c| self.outer_size(c, axis, true));
            if axis.size == "height" {
                sizes.sum::<f64>()
            } else {
                sizes.fold(0.0, f64::max)
            }
        };
        size.max(self.px(element, axis.min))
    }

    fn outer_size(&self, element: ElementId, axis: &Axis, with_margin: bool) -> f64 {
        let mut size = self.content_size(element, axis)
            + self.px(element, axis.padding[0])
            + self.px(element, axis.padding[1]);
        if with_margin {
            size += self.px(element, axis.margin[0]) + self.px(element, axis.margin[1]);
        }
        size
    }

    fn dimension(&self, target: Container, extent: Extent, axis: &Axis) -> f64 {
        match target {
            Container::Window => {
                if axis.size == "height" {
                    self.window.height
                } else {
                    self.window.width
                }
            }
            Container::Element(element) => match extent {
                Extent::Client | Extent::Outer => self.outer_size(element, axis, false),
                Extent::OuterWithMargin => self.outer_size(element, axis, true),
            },
        }
    }

    fn offset(&self, target: Container, relative_to_viewport: bool) -> Point {
        let Container::Element(element) = target else {
            return Point::default();
        };
        let viewport = if self.is_fixed(element) {
            Point::new(self.px(element, "top"), self.px(element, "left"))
        } else {
            let mut position = self.flow_position(element);
            let mut ancestor = self.nodes.get(&element).and_then(|n| n.parent);
            while let Some(a) = ancestor {
                let Some(node) = self.nodes.get(&a) else {
                    break;
                };
                position.top -= node.scroll.top;
                position.left -= node.scroll.left;
                ancestor = node.parent;
            }
            Point::new(
                position.top - self.window_scroll.top,
                position.left - self.window_scroll.left,
            )
        };
        if relative_to_viewport {
            viewport
        } else {
            Point::new(
                viewport.top + self.window_scroll.top,
                viewport.left + self.window_scroll.left,
            )
        }
    }

    fn matches(&self, node: &Node, selector: &str) -> bool {
        if let Some(name) = selector.strip_prefix('#') {
            node.name.as_deref() == Some(name)
        } else if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else {
            node.tag == selector
        }
    }

    fn collect(&self, element: ElementId, selector: &str, out: &mut Vec<ElementId>) {
        let Some(node) = self.nodes.get(&element) else {
            return;
        };
        if self.matches(node, selector) {
            out.push(element);
        }
        for &child in &node.children {
            self.collect(child, selector, out);
        }
    }
}

/// A document held in memory.
///
/// Starts with an empty `body` sized like the window. Share it as `Rc<MemoryDocument>` between the
/// engine (as `Rc<dyn Host>`) and the code driving it.
pub struct MemoryDocument {
    doc: RefCell<Document>,
}

impl MemoryDocument {
    pub fn new(window_width: f64, window_height: f64) -> Self {
        Self {
            doc: RefCell::new(Document::new(Size::new(window_width, window_height))),
        }
    }

    pub fn body_element(&self) -> ElementId {
        self.doc.borrow().body
    }

    /// Creates an element and appends it to `parent`.
    pub fn append_element(&self, parent: ElementId, tag: &str) -> ElementId {
        let mut doc = self.doc.borrow_mut();
        let element = doc.create(tag);
        doc.insert_before(parent, element, None);
        element
    }

    /// Sets the element's `id` attribute, matched by `#name` selectors.
    pub fn set_name(&self, element: ElementId, name: &str) {
        if let Some(node) = self.doc.borrow_mut().nodes.get_mut(&element) {
            node.name = Some(name.into());
        }
    }

    /// Places the element's box in scroll-content coordinates.
    pub fn set_rect(&self, element: ElementId, top: f64, left: f64, width: f64, height: f64) {
        if let Some(node) = self.doc.borrow_mut().nodes.get_mut(&element) {
            node.rect = Some(Rect {
                top,
                left,
                width,
                height,
            });
        }
    }

    /// Sets a non-inline ("stylesheet") style value.
    pub fn set_style(&self, element: ElementId, property: &str, value: &str) {
        if let Some(node) = self.doc.borrow_mut().nodes.get_mut(&element) {
            node.sheet.insert(property.into(), value.into());
        }
    }

    pub fn set_window_size(&self, width: f64, height: f64) {
        self.doc.borrow_mut().window = Size::new(width, height);
    }

    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.doc
            .borrow()
            .nodes
            .get(&element)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.doc
            .borrow()
            .nodes
            .get(&element)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    /// All inline styles of the element, sorted by property.
    pub fn inline_styles(&self, element: ElementId) -> Vec<(String, String)> {
        self.doc
            .borrow()
            .nodes
            .get(&element)
            .map(|n| n.inline.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Number of `request_frame` calls so far.
    pub fn frames_requested(&self) -> usize {
        self.doc.borrow().frames_requested
    }

    pub fn frames_cancelled(&self) -> usize {
        self.doc.borrow().frames_cancelled
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.doc.borrow();
        f.debug_struct("MemoryDocument")
            .field("nodes", &doc.nodes.len())
            .field("window", &doc.window)
            .field("window_scroll", &doc.window_scroll)
            .finish_non_exhaustive()
    }
}

impl Geometry for MemoryDocument {
    fn width(&self, target: Container, extent: Extent) -> f64 {
        self.doc.borrow().dimension(target, extent, &WIDTH)
    }

    fn height(&self, target: Container, extent: Extent) -> f64 {
        self.doc.borrow().dimension(target, extent, &HEIGHT)
    }

    fn offset(&self, target: Container, relative_to_viewport: bool) -> Point {
        self.doc.borrow().offset(target, relative_to_viewport)
    }

    fn scroll_top(&self, target: Container) -> f64 {
        let doc = self.doc.borrow();
        match target {
            Container::Window => doc.window_scroll.top,
            Container::Element(element) => doc.nodes.get(&element).map_or(0.0, |n| n.scroll.top),
        }
    }

    fn scroll_left(&self, target: Container) -> f64 {
        let doc = self.doc.borrow();
        match target {
            Container::Window => doc.window_scroll.left,
            Container::Element(element) => doc.nodes.get(&element).map_or(0.0, |n| n.scroll.left),
        }
    }

    fn computed_style(&self, element: ElementId, property: &str) -> String {
        self.doc.borrow().style(element, property)
    }
}

impl Host for MemoryDocument {
    fn resolve_elements(&self, target: &Target) -> Vec<ElementId> {
        let doc = self.doc.borrow();
        match target {
            Target::Window => Vec::new(),
            Target::Element(element) => {
                if doc.nodes.contains_key(element) {
                    vec![*element]
                } else {
                    Vec::new()
                }
            }
            Target::Selector(selector) => {
                let mut out = Vec::new();
                doc.collect(doc.body, selector.trim(), &mut out);
                out
            }
        }
    }

    fn body(&self) -> Option<ElementId> {
        Some(self.doc.borrow().body)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let doc = self.doc.borrow();
        let mut current = Some(node);
        while let Some(element) = current {
            if element == ancestor {
                return true;
            }
            current = doc.nodes.get(&element).and_then(|n| n.parent);
        }
        false
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.doc.borrow().nodes.get(&element)?.parent
    }

    fn first_child(&self, element: ElementId) -> Option<ElementId> {
        self.doc.borrow().nodes.get(&element)?.children.first().copied()
    }

    fn create_element(&self, tag: &str) -> ElementId {
        self.doc.borrow_mut().create(tag)
    }

    fn insert_before(&self, parent: ElementId, node: ElementId, reference: Option<ElementId>) {
        self.doc.borrow_mut().insert_before(parent, node, reference);
    }

    fn remove_child(&self, parent: ElementId, node: ElementId) {
        let mut doc = self.doc.borrow_mut();
        if doc.nodes.get(&node).and_then(|n| n.parent) == Some(parent) {
            doc.detach(node);
        }
    }

    fn inline_style(&self, element: ElementId, property: &str) -> String {
        self.doc
            .borrow()
            .nodes
            .get(&element)
            .and_then(|n| n.inline.get(property).cloned())
            .unwrap_or_default()
    }

    fn set_inline_style(&self, element: ElementId, property: &str, value: &str) {
        let mut doc = self.doc.borrow_mut();
        let Some(node) = doc.nodes.get_mut(&element) else {
            return;
        };
        if value.is_empty() {
            node.inline.remove(property);
        } else {
            node.inline.insert(property.into(), value.into());
        }
    }

    fn add_class(&self, element: ElementId, class: &str) {
        if let Some(node) = self.doc.borrow_mut().nodes.get_mut(&element) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.into());
            }
        }
    }

    fn remove_class(&self, element: ElementId, class: &str) {
        if let Some(node) = self.doc.borrow_mut().nodes.get_mut(&element) {
            node.classes.retain(|c| c != class);
        }
    }

    fn set_scroll_position(&self, target: Container, position: Point) {
        let mut doc = self.doc.borrow_mut();
        match target {
            Container::Window => doc.window_scroll = position,
            Container::Element(element) => {
                if let Some(node) = doc.nodes.get_mut(&element) {
                    node.scroll = position;
                }
            }
        }
    }

    fn request_frame(&self) {
        self.doc.borrow_mut().frames_requested += 1;
    }

    fn cancel_frame(&self) {
        self.doc.borrow_mut().frames_cancelled += 1;
    }
}
