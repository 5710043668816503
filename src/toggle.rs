use crate::{ElementId, Scene, Target};

/// Classes added to a set of elements while a scene is active.
#[derive(Clone, Debug)]
pub(crate) struct ClassToggle {
    elements: Vec<ElementId>,
    classes: Vec<String>,
}

impl Scene {
    /// Adds `classes` (whitespace separated) to the target elements on `enter` and removes them on
    /// `leave`. Replaces a previous toggle.
    pub fn set_class_toggle(&self, target: impl Into<Target>, classes: &str) {
        let level = self.loglevel();
        let target = target.into();
        let elements = self.host().resolve_elements(&target);
        let classes: Vec<String> = classes.split_whitespace().map(String::from).collect();
        if elements.is_empty() {
            log_error!(level, scene = self.id(), "set_class_toggle: invalid element {target:?}");
            return;
        }
        if classes.is_empty() {
            log_error!(level, scene = self.id(), "set_class_toggle: invalid classes");
            return;
        }
        if self.core().class_toggle.is_some() {
            self.remove_class_toggle(false);
        }
        self.core_mut().class_toggle = Some(ClassToggle { elements, classes });
    }

    /// Drops the class toggle. With `reset` the classes are removed from the elements.
    pub fn remove_class_toggle(&self, reset: bool) {
        let Some(toggle) = self.core_mut().class_toggle.take() else {
            return;
        };
        if reset {
            toggle.apply(self, false);
        }
    }

    pub(crate) fn apply_class_toggle(&self, add: bool) {
        let toggle = self.core().class_toggle.clone();
        if let Some(toggle) = toggle {
            toggle.apply(self, add);
        }
    }
}

impl ClassToggle {
    fn apply(&self, scene: &Scene, add: bool) {
        let host = scene.host();
        for &element in &self.elements {
            for class in &self.classes {
                if add {
                    host.add_class(element, class);
                } else {
                    host.remove_class(element, class);
                }
            }
        }
    }
}
