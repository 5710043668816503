//! Pinning: holding an element fixed in the viewport while a scene is active.
//!
//! A pinned element is wrapped in a spacer that keeps its place in the document flow. While the
//! scene is `During`, the spacer's first child (the element, or the spacer of a cascaded pin) is
//! switched to `position: fixed` and placed over the spacer; otherwise it sits in the spacer,
//! offset by the distance already scrolled when followers are not pushed.

use crate::geometry::{
    MARGIN_PROPERTIES, PIN_CSS_PROPERTIES, PIN_RESTORE_PROPERTIES, float_or_zero,
    is_margin_collapse_type, px, read_inline_styles, read_styles, style_value, write_styles,
};
use crate::{Container, ElementId, Extent, Scene, SceneState, Target, WheelDelta};

pub const DEFAULT_SPACER_CLASS: &str = "scrollmagic-pin-spacer";

/// Options for [`Scene::set_pin`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinSettings {
    /// Whether the spacer grows with the scene so following content is pushed down.
    ///
    /// `None` means the default (`true`). Ignored for absolutely positioned elements.
    pub push_followers: Option<bool>,
    pub spacer_class: String,
}

impl Default for PinSettings {
    fn default() -> Self {
        Self {
            push_followers: None,
            spacer_class: DEFAULT_SPACER_CLASS.into(),
        }
    }
}

impl PinSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_push_followers(mut self, push_followers: bool) -> Self {
        self.push_followers = Some(push_followers);
        self
    }

    pub fn with_spacer_class(mut self, spacer_class: impl Into<String>) -> Self {
        self.spacer_class = spacer_class.into();
        self
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PinBinding {
    pub(crate) element: ElementId,
    pub(crate) spacer: ElementId,
    pub(crate) push_followers: bool,
    /// Absolutely positioned elements are taken out of flow and never resize their spacer.
    pub(crate) in_flow: bool,
    pub(crate) rel_width: bool,
    pub(crate) rel_height: bool,
    pub(crate) auto_full_width: bool,
}

/// Paddings on the spacer that reserve the scroll distance, leading edge first.
fn padding_properties(vertical: bool) -> (&'static str, &'static str) {
    if vertical {
        ("padding-top", "padding-bottom")
    } else {
        ("padding-left", "padding-right")
    }
}

impl Scene {
    pub fn has_pin(&self) -> bool {
        self.core().pin.is_some()
    }

    /// The pinned element, if any.
    pub fn pin_element(&self) -> Option<ElementId> {
        self.core().pin.map(|p| p.element)
    }

    /// The spacer wrapping the pinned element, if any.
    pub fn pin_spacer(&self) -> Option<ElementId> {
        self.core().pin.map(|p| p.spacer)
    }

    pub(crate) fn pin_binding(&self) -> Option<PinBinding> {
        self.core().pin
    }

    /// Pins an element for the duration of the scene.
    ///
    /// Pinning the element that is already pinned does nothing; pinning another element releases
    /// the current pin first. Missing and `position: fixed` elements are rejected.
    pub fn set_pin(&self, target: impl Into<Target>, settings: PinSettings) {
        let level = self.loglevel();
        let host = self.host();
        let target = target.into();
        let Some(element) = host.resolve_elements(&target).first().copied() else {
            log_error!(level, scene = self.id(), "set_pin: invalid pin element {target:?}");
            return;
        };
        if host.computed_style(element, "position") == "fixed" {
            log_error!(
                level,
                scene = self.id(),
                "set_pin: pin element must not be position: fixed"
            );
            return;
        }
        let Some(parent) = host.parent(element) else {
            log_error!(level, scene = self.id(), "set_pin: pin element is not attached");
            return;
        };
        if let Some(pin) = self.pin_binding() {
            if pin.element == element {
                return;
            }
            self.remove_pin(false);
        }

        // hide the parent so styles come from the stylesheet rather than from layout
        let parent_display = host.inline_style(parent, "display");
        host.set_inline_style(parent, "display", "none");
        let in_flow = host.computed_style(element, "position") != "absolute";
        let pin_css = read_styles(host, element, &PIN_CSS_PROPERTIES);
        let size_css = read_styles(host, element, &["width", "height"]);
        host.set_inline_style(parent, "display", &parent_display);

        let mut push_followers = settings.push_followers.unwrap_or(true);
        if !in_flow && push_followers {
            log_warn!(
                level,
                scene = self.id(),
                "push_followers is disabled for absolutely positioned pin elements"
            );
            push_followers = false;
        }
        if settings.push_followers == Some(true) && self.duration() == 0.0 {
            log_warn!(
                level,
                scene = self.id(),
                "push_followers has no effect when the scene duration is 0"
            );
        }

        let spacer = host.create_element("div");
        host.insert_before(parent, spacer, Some(element));
        let mut spacer_css = pin_css.clone();
        spacer_css.push(("position", if in_flow { "relative" } else { "absolute" }.into()));
        spacer_css.push(("box-sizing", "content-box".into()));
        if !in_flow {
            spacer_css.extend(size_css.iter().cloned());
        }
        write_styles(host, spacer, &spacer_css);
        host.add_class(spacer, &settings.spacer_class);
        {
            let mut pins = self.engine().pins_mut();
            let parent_spacer = pins.is_spacer(parent).then_some(parent);
            pins.register(spacer, parent_spacer, self.downgrade());
            pins.record_orig_style(element, || {
                read_inline_styles(host, element, &PIN_RESTORE_PROPERTIES)
            });
        }

        let width = style_value(&size_css, "width");
        let height = style_value(&size_css, "height");
        let binding = PinBinding {
            element,
            spacer,
            push_followers,
            in_flow,
            rel_width: width.ends_with('%'),
            rel_height: height.ends_with('%'),
            auto_full_width: width == "auto"
                && in_flow
                && is_margin_collapse_type(style_value(&pin_css, "display")),
        };
        if binding.rel_width {
            host.set_inline_style(spacer, "width", width);
        }
        if binding.rel_height {
            host.set_inline_style(spacer, "height", height);
        }

        host.append_child(spacer, element);
        write_styles(
            host,
            element,
            &[
                ("position", if in_flow { "relative" } else { "absolute" }),
                ("margin", "auto"),
                ("top", "auto"),
                ("left", "auto"),
                ("bottom", "auto"),
                ("right", "auto"),
            ],
        );
        if binding.rel_width || binding.rel_height {
            host.set_inline_style(element, "box-sizing", "border-box");
        }

        self.core_mut().pin = Some(binding);
        log_debug!(level, scene = self.id(), element = element.0, "pin added");
        self.update_pin_state(false);
    }

    /// Releases the pin.
    ///
    /// The element is unpinned at its current position. With `reset` (or when the scene has no
    /// controller) the spacer is removed and the element's original inline styles are restored.
    pub fn remove_pin(&self, reset: bool) {
        let Some(pin) = self.pin_binding() else {
            return;
        };
        if self.state() == SceneState::During {
            self.update_pin_state(true);
        }
        if reset || self.controller().is_none() {
            let host = self.host();
            if let Some(pin_target) = host.first_child(pin.spacer) {
                if self.engine().pins().is_spacer(pin_target) {
                    // cascaded pin: the inner spacer takes over the outer spacer's margins
                    let margins = read_inline_styles(host, pin.spacer, &MARGIN_PROPERTIES);
                    write_styles(host, pin_target, &margins);
                }
                if let Some(parent) = host.parent(pin.spacer) {
                    host.insert_before(parent, pin_target, Some(pin.spacer));
                    host.remove_child(parent, pin.spacer);
                }
            }

            let mut pins = self.engine().pins_mut();
            pins.unregister(pin.spacer);
            let nested = host
                .parent(pin.element)
                .is_some_and(|parent| pins.is_spacer(parent));
            if !nested {
                if let Some(styles) = pins.take_orig_style(pin.element) {
                    write_styles(host, pin.element, &styles);
                }
            }
        }
        self.core_mut().pin = None;
        log_debug!(self.loglevel(), scene = self.id(), reset, "pin removed");
    }

    /// Positions the pin for the current state. `force_unpin` releases it regardless of state.
    pub(crate) fn update_pin_state(&self, force_unpin: bool) {
        let Some(pin) = self.pin_binding() else {
            return;
        };
        let Some(controller) = self.controller() else {
            return;
        };
        let host = self.host();
        let Some(pin_target) = host.first_child(pin.spacer) else {
            return;
        };
        let vertical = controller.vertical();
        let (state, progress, duration, reverse, start) = {
            let core = self.core();
            (
                core.state,
                core.progress,
                core.duration,
                core.reverse,
                core.scroll_offset.start,
            )
        };

        if !force_unpin && state == SceneState::During {
            let was_fixed = host.computed_style(pin_target, "position") == "fixed";
            if !was_fixed {
                host.set_inline_style(pin_target, "position", "fixed");
            }
            if !was_fixed || pin.push_followers {
                self.update_pin_dimensions();
            }
            let mut fixed = host.offset(Container::Element(pin.spacer), true);
            let scrolled = if reverse || duration == 0.0 {
                controller.cached_scroll_pos() - start
            } else {
                // derived from progress so the pin stays put when scrolling back is ignored
                (progress * duration * 10.0).round() / 10.0
            };
            *fixed.along_mut(vertical) += scrolled;
            write_styles(
                host,
                pin_target,
                &[("top", px(fixed.top)), ("left", px(fixed.left))],
            );
        } else {
            let position = if pin.in_flow { "relative" } else { "absolute" };
            let mut change = host.computed_style(pin_target, "position") != position;
            let mut offset = crate::Point::default();
            if !pin.push_followers {
                *offset.along_mut(vertical) = duration * progress;
            } else if duration > 0.0 {
                // the spacer has not been resized since the pin was jumped over
                let (leading, trailing) = padding_properties(vertical);
                if state == SceneState::After
                    && float_or_zero(&host.computed_style(pin.spacer, leading)) == 0.0
                {
                    change = true;
                } else if state == SceneState::Before
                    && float_or_zero(&host.computed_style(pin.spacer, trailing)) == 0.0
                {
                    change = true;
                }
            }
            write_styles(
                host,
                pin_target,
                &[
                    ("position", position.to_string()),
                    ("top", px(offset.top)),
                    ("left", px(offset.left)),
                ],
            );
            if change {
                self.update_pin_dimensions();
            }
        }
    }

    /// Resizes the spacer (or, for relatively sized pins, the element) for the current state.
    pub(crate) fn update_pin_dimensions(&self) {
        let Some(pin) = self.pin_binding() else {
            return;
        };
        if !pin.in_flow {
            return;
        }
        let Some(controller) = self.controller() else {
            return;
        };
        let host = self.host();
        let Some(pin_target) = host.first_child(pin.spacer) else {
            return;
        };
        let vertical = controller.vertical();
        let (during, progress, duration) = {
            let core = self.core();
            (core.state == SceneState::During, core.progress, core.duration)
        };
        let margin_collapse = is_margin_collapse_type(&host.computed_style(pin.spacer, "display"));
        let mut css: Vec<(&'static str, String)> = Vec::new();

        if pin.rel_width || pin.auto_full_width {
            let width = if during {
                px(host.width(Container::Element(pin.spacer), Extent::Client))
            } else {
                "100%".into()
            };
            host.set_inline_style(pin.element, "width", &width);
        } else {
            let measured = if vertical { pin.element } else { pin_target };
            let min_width = host.width(Container::Element(measured), Extent::OuterWithMargin);
            css.push(("min-width", px(min_width)));
            css.push(("width", if during { px(min_width) } else { "auto".into() }));
        }

        if pin.rel_height {
            let height = if during {
                // the spacer's only padding is the pushed scroll distance
                let pushed = if pin.push_followers { duration } else { 0.0 };
                px(host.height(Container::Element(pin.spacer), Extent::Client) - pushed)
            } else {
                "100%".into()
            };
            host.set_inline_style(pin.element, "height", &height);
        } else {
            let measured = if vertical { pin_target } else { pin.element };
            let extent = if margin_collapse {
                Extent::Outer
            } else {
                Extent::OuterWithMargin
            };
            let min_height = host.height(Container::Element(measured), extent);
            css.push(("min-height", px(min_height)));
            css.push(("height", if during { px(min_height) } else { "auto".into() }));
        }

        if pin.push_followers {
            let (leading, trailing) = padding_properties(vertical);
            css.push((leading, px(duration * progress)));
            css.push((trailing, px(duration * (1.0 - progress))));
        }
        write_styles(host, pin.spacer, &css);

        let parent_owner = self.engine().pins().parent_owner(pin.spacer);
        if let Some(owner) = parent_owner.filter(|owner| owner != self) {
            owner.update_pin_dimensions();
        }
    }

    /// Repositions an active pin after the document (not the container) scrolled or resized.
    pub(crate) fn update_pin_in_container(&self) {
        let in_container = self.controller().is_some_and(|c| !c.is_document());
        if in_container && self.has_pin() && self.state() == SceneState::During {
            self.update_pin_state(false);
        }
    }

    /// Re-measures a relatively sized active pin whose spacer no longer spans the window.
    pub(crate) fn update_relative_pin_spacer(&self) {
        let Some(pin) = self.pin_binding() else {
            return;
        };
        if self.controller().is_none() || self.state() != SceneState::During {
            return;
        }
        let host = self.host();
        let Some(parent) = host.parent(pin.spacer) else {
            return;
        };
        let parent = Container::Element(parent);
        let width_mismatch = (pin.rel_width || pin.auto_full_width)
            && host.width(Container::Window, Extent::Client) != host.width(parent, Extent::Client);
        let height_mismatch = pin.rel_height
            && host.height(Container::Window, Extent::Client) != host.height(parent, Extent::Client);
        if width_mismatch || height_mismatch {
            self.update_pin_dimensions();
        }
    }

    /// Turns wheel input over the pinned element into a scroll of the container.
    ///
    /// Only applies while the pin is active and the container is not the document, where the
    /// host would otherwise scroll the wrong element. Returns whether the input was consumed.
    pub(crate) fn handle_wheel(&self, delta: WheelDelta) -> bool {
        let Some(controller) = self.controller() else {
            return false;
        };
        if !self.has_pin() || self.state() != SceneState::During || controller.is_document() {
            return false;
        }
        let step = delta.scroll_step(controller.vertical());
        controller.set_scroll_pos(controller.cached_scroll_pos() - step, None);
        true
    }
}
