/// Opaque handle to a host element.
///
/// The engine never inspects the value; hosts map it to their own node representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u64);

/// Something the host can resolve into elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// The browser window / document viewport.
    Window,
    Element(ElementId),
    /// A selector understood by the host (`#id`, `.class`, tag name, ...).
    Selector(String),
}

impl From<ElementId> for Target {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.into())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// A scroll viewport, after resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Container {
    Window,
    Element(ElementId),
}

impl Container {
    pub fn element(self) -> Option<ElementId> {
        match self {
            Self::Window => None,
            Self::Element(id) => Some(id),
        }
    }
}

impl From<ElementId> for Container {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub top: f64,
    pub left: f64,
}

impl Point {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }

    /// The coordinate on the scroll axis.
    pub fn along(&self, vertical: bool) -> f64 {
        if vertical { self.top } else { self.left }
    }

    pub fn along_mut(&mut self, vertical: bool) -> &mut f64 {
        if vertical {
            &mut self.top
        } else {
            &mut self.left
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Which box a dimension query measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extent {
    /// Content + padding (`clientWidth` / `innerWidth`).
    Client,
    /// Border box (`offsetWidth` / `outerWidth`).
    Outer,
    /// Border box plus margins. Windows have no margins.
    OuterWithMargin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Forward,
    Reverse,
    #[default]
    Paused,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SceneState {
    #[default]
    Before,
    During,
    After,
}

/// Absolute scroll-container coordinates covered by a scene.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollOffset {
    pub start: f64,
    pub end: f64,
}

/// Log verbosity of a controller or scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogLevel {
    Silent = 0,
    Errors = 1,
    #[default]
    Warnings = 2,
    Verbose = 3,
}

impl LogLevel {
    pub fn from_number(n: f64) -> Option<Self> {
        if n.fract() != 0.0 {
            return None;
        }
        match n as i64 {
            0 => Some(Self::Silent),
            1 => Some(Self::Errors),
            2 => Some(Self::Warnings),
            3 => Some(Self::Verbose),
            _ => None,
        }
    }

    pub fn as_number(self) -> f64 {
        self as u8 as f64
    }
}

/// Where on the viewport a trigger fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerHook {
    /// Bottom edge of the viewport (1.0).
    OnEnter,
    /// Middle of the viewport (0.5).
    OnCenter,
    /// Top edge of the viewport (0.0).
    OnLeave,
    /// A fraction of the viewport; clamped to `[0, 1]` on validation.
    At(f64),
}

impl TriggerHook {
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::OnEnter => Some("onEnter"),
            Self::OnCenter => Some("onCenter"),
            Self::OnLeave => Some("onLeave"),
            Self::At(_) => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "onEnter" => Some(Self::OnEnter),
            "onCenter" => Some(Self::OnCenter),
            "onLeave" => Some(Self::OnLeave),
            _ => None,
        }
    }

    pub fn fraction(self) -> f64 {
        match self {
            Self::OnEnter => 1.0,
            Self::OnCenter => 0.5,
            Self::OnLeave => 0.0,
            Self::At(v) => v.clamp(0.0, 1.0),
        }
    }
}

/// Raw wheel input over a pinned element, in DOM `mousewheel` / `DOMMouseScroll` units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelDelta {
    pub wheel_delta: f64,
    pub wheel_delta_x: f64,
    pub wheel_delta_y: f64,
    /// Legacy line-based delta (`DOMMouseScroll`).
    pub detail: f64,
}

impl WheelDelta {
    /// Pixel distance to move the scroll position by (positive scrolls backwards).
    pub(crate) fn scroll_step(&self, vertical: bool) -> f64 {
        let raw = if self.wheel_delta != 0.0 {
            self.wheel_delta
        } else if vertical {
            self.wheel_delta_y
        } else {
            self.wheel_delta_x
        };
        let step = raw / 3.0;
        if step != 0.0 { step } else { -self.detail * 30.0 }
    }
}
