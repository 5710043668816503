use crate::{Container, Scene, SceneState, ScrollDirection, ScrollOffset};

/// A serializable snapshot of a controller's cached state.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerInfo {
    /// Viewport size along the scroll axis.
    pub size: f64,
    pub vertical: bool,
    /// Scroll position as of the last update pass.
    pub scroll_pos: f64,
    pub scroll_direction: ScrollDirection,
    pub container: Container,
    pub is_document: bool,
}

/// One field of [`ControllerInfo`], as returned by keyed access.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InfoValue {
    Size(f64),
    Vertical(bool),
    ScrollPos(f64),
    ScrollDirection(ScrollDirection),
    Container(Container),
    IsDocument(bool),
}

impl ControllerInfo {
    /// Field by name (`"size"`, `"vertical"`, `"scroll_pos"`, `"scroll_direction"`, `"container"`,
    /// `"is_document"`; camelCase spellings are accepted too).
    pub fn get(&self, key: &str) -> Option<InfoValue> {
        match key {
            "size" => Some(InfoValue::Size(self.size)),
            "vertical" => Some(InfoValue::Vertical(self.vertical)),
            "scroll_pos" | "scrollPos" => Some(InfoValue::ScrollPos(self.scroll_pos)),
            "scroll_direction" | "scrollDirection" => {
                Some(InfoValue::ScrollDirection(self.scroll_direction))
            }
            "container" => Some(InfoValue::Container(self.container)),
            "is_document" | "isDocument" => Some(InfoValue::IsDocument(self.is_document)),
            _ => None,
        }
    }
}

/// A serializable snapshot of a scene.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneInfo {
    pub state: SceneState,
    pub progress: f64,
    pub scroll_offset: ScrollOffset,
    pub duration: f64,
    pub enabled: bool,
    pub pinned: bool,
}

impl Scene {
    pub fn info(&self) -> SceneInfo {
        let core = self.core();
        SceneInfo {
            state: core.state,
            progress: core.progress,
            scroll_offset: core.scroll_offset,
            duration: core.duration,
            enabled: core.enabled,
            pinned: core.pin.is_some(),
        }
    }
}
