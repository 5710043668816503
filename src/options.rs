use std::fmt;
use std::rc::Rc;

use crate::error::OptionError;
use crate::geometry::parse_float;
use crate::{ElementId, Host, LogLevel, Target, TriggerHook};

pub const DURATION: &str = "duration";
pub const OFFSET: &str = "offset";
pub const TRIGGER_ELEMENT: &str = "trigger_element";
pub const TRIGGER_HOOK: &str = "trigger_hook";
pub const REVERSE: &str = "reverse";
pub const LOGLEVEL: &str = "loglevel";

/// A lazily evaluated number (durations that follow layout).
pub type ValueFn = Rc<dyn Fn() -> f64>;

/// Validator for an extension option. Errors make the option fall back to its default.
pub type Validator = Rc<dyn Fn(&OptionValue) -> Result<OptionValue, OptionError>>;

/// A loosely typed option value, as accepted by keyed configuration.
///
/// Typed builders (`SceneOptions::with_duration`, ...) convert into this; validators turn it back
/// into the strongly typed value the scene stores.
#[derive(Clone, Default)]
pub enum OptionValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Element(ElementId),
    Function(ValueFn),
}

impl OptionValue {
    pub fn function(f: impl Fn() -> f64 + 'static) -> Self {
        Self::Function(Rc::new(f))
    }

    /// Loose truthiness (`0`, `NaN`, `""`, `false` and null are false).
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::Element(_) | Self::Function(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Element(a), Self::Element(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Element(e) => f.debug_tuple("Element").field(e).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Element(e) => write!(f, "element #{}", e.0),
            Self::Function(_) => f.write_str("function"),
        }
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<ElementId> for OptionValue {
    fn from(v: ElementId) -> Self {
        Self::Element(v)
    }
}

impl From<Option<ElementId>> for OptionValue {
    fn from(v: Option<ElementId>) -> Self {
        v.map_or(Self::Null, Self::Element)
    }
}

impl From<Target> for OptionValue {
    fn from(v: Target) -> Self {
        match v {
            Target::Window => Self::Null,
            Target::Element(id) => Self::Element(id),
            Target::Selector(s) => Self::Text(s),
        }
    }
}

impl From<TriggerHook> for OptionValue {
    fn from(v: TriggerHook) -> Self {
        match v.name() {
            Some(name) => Self::Text(name.into()),
            None => Self::Number(v.fraction()),
        }
    }
}

impl From<LogLevel> for OptionValue {
    fn from(v: LogLevel) -> Self {
        Self::Number(v.as_number())
    }
}

/// Maps accepted spellings of a built-in scene option to its canonical name.
pub(crate) fn canonical_scene_option(name: &str) -> Option<&'static str> {
    match name {
        "duration" => Some(DURATION),
        "offset" => Some(OFFSET),
        "trigger_element" | "triggerElement" => Some(TRIGGER_ELEMENT),
        "trigger_hook" | "triggerHook" => Some(TRIGGER_HOOK),
        "reverse" => Some(REVERSE),
        "loglevel" => Some(LOGLEVEL),
        _ => None,
    }
}

/// Source of a scene's duration after validation.
#[derive(Clone)]
pub(crate) enum DurationInput {
    Fixed(f64),
    /// Fraction of the controller's viewport size.
    Percent(f64),
    Dynamic(ValueFn),
}

fn invalid(option: &str, value: &OptionValue) -> OptionError {
    OptionError::InvalidValue {
        option: option.into(),
        value: value.to_string(),
    }
}

/// Whether the whole text is a number (not just a numeric prefix).
fn numeric_text(s: &str) -> Option<f64> {
    let v: f64 = s.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

fn is_percentage(s: &str) -> bool {
    let Some(body) = s.strip_suffix('%') else {
        return false;
    };
    !body.is_empty()
        && body.ends_with(|c: char| c.is_ascii_digit())
        && body.chars().all(|c| c == '.' || c.is_ascii_digit())
}

pub(crate) fn validate_duration(value: &OptionValue) -> Result<DurationInput, OptionError> {
    match value {
        OptionValue::Text(s) if is_percentage(s) => Ok(DurationInput::Percent(parse_float(s) / 100.0)),
        OptionValue::Function(f) => Ok(DurationInput::Dynamic(Rc::clone(f))),
        OptionValue::Number(n) => validate_duration_value(*n, false).map(DurationInput::Fixed),
        OptionValue::Text(s) => {
            let n = parse_float(s);
            if n.is_finite() && n >= 0.0 {
                Ok(DurationInput::Fixed(n))
            } else {
                Err(invalid(DURATION, value))
            }
        }
        _ => Err(invalid(DURATION, value)),
    }
}

/// Checks a concrete duration, including values produced by a duration function.
pub(crate) fn validate_duration_value(n: f64, from_function: bool) -> Result<f64, OptionError> {
    if n.is_finite() && n >= 0.0 {
        return Ok(n);
    }
    if from_function {
        Err(OptionError::InvalidFunctionResult {
            option: DURATION.into(),
            value: n.to_string(),
        })
    } else {
        Err(invalid(DURATION, &OptionValue::Number(n)))
    }
}

pub(crate) fn validate_offset(value: &OptionValue) -> Result<f64, OptionError> {
    let n = match value {
        OptionValue::Number(n) => *n,
        OptionValue::Text(s) => parse_float(s),
        _ => f64::NAN,
    };
    if n.is_finite() {
        Ok(n)
    } else {
        Err(invalid(OFFSET, value))
    }
}

pub(crate) fn validate_trigger_hook(value: &OptionValue) -> Result<f64, OptionError> {
    match value {
        OptionValue::Number(n) if n.is_finite() => Ok(TriggerHook::At(*n).fraction()),
        OptionValue::Text(s) => {
            if let Some(n) = numeric_text(s) {
                Ok(TriggerHook::At(n).fraction())
            } else if let Some(hook) = TriggerHook::from_name(s) {
                Ok(hook.fraction())
            } else {
                Err(invalid(TRIGGER_HOOK, value))
            }
        }
        _ => Err(invalid(TRIGGER_HOOK, value)),
    }
}

pub(crate) fn validate_reverse(value: &OptionValue) -> bool {
    value.truthy()
}

pub(crate) fn validate_loglevel(value: &OptionValue) -> Result<LogLevel, OptionError> {
    let n = match value {
        OptionValue::Number(n) => n.trunc(),
        OptionValue::Text(s) => parse_float(s).trunc(),
        _ => f64::NAN,
    };
    LogLevel::from_number(n).ok_or_else(|| invalid(LOGLEVEL, value))
}

/// Resolves a trigger element. Falsy values mean "no trigger element".
pub(crate) fn validate_trigger_element(
    value: &OptionValue,
    host: &dyn Host,
) -> Result<Option<ElementId>, OptionError> {
    if !value.truthy() {
        return Ok(None);
    }
    let target = match value {
        OptionValue::Element(id) => Target::Element(*id),
        OptionValue::Text(s) => Target::Selector(s.clone()),
        _ => return Err(invalid(TRIGGER_ELEMENT, value)),
    };
    host.resolve_elements(&target)
        .first()
        .copied()
        .filter(|&el| host.parent(el).is_some())
        .map(Some)
        .ok_or_else(|| OptionError::ElementNotFound {
            option: TRIGGER_ELEMENT.into(),
            target: value.to_string(),
        })
}

/// Options a scene is constructed with.
///
/// Entries are kept as keyed values so that configuration read from elsewhere and extension
/// options go through the same validators as the typed builders. Unknown keys are dropped (with a
/// warning) when the scene is created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneOptions {
    entries: Vec<(String, OptionValue)>,
}

impl SceneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<K: Into<String>>(
        entries: impl IntoIterator<Item = (K, OptionValue)>,
    ) -> Self {
        let mut options = Self::new();
        for (key, value) in entries {
            options.set(key, value);
        }
        options
    }

    /// Sets an entry, replacing a previous value for the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        let key = key.into();
        let value = value.into();
        let key = canonical_scene_option(&key).map_or(key, String::from);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    /// A fixed length (`300.0`) or a viewport percentage (`"50%"`).
    pub fn with_duration(self, duration: impl Into<OptionValue>) -> Self {
        self.with(DURATION, duration)
    }

    /// A duration recomputed on every `Scene::refresh`.
    pub fn with_duration_fn(self, duration: impl Fn() -> f64 + 'static) -> Self {
        self.with(DURATION, OptionValue::function(duration))
    }

    pub fn with_offset(self, offset: f64) -> Self {
        self.with(OFFSET, offset)
    }

    pub fn with_trigger_element(self, target: impl Into<Target>) -> Self {
        self.with(TRIGGER_ELEMENT, OptionValue::from(target.into()))
    }

    /// A [`TriggerHook`], a number, or one of `"onEnter"`, `"onCenter"`, `"onLeave"`.
    pub fn with_trigger_hook(self, hook: impl Into<OptionValue>) -> Self {
        self.with(TRIGGER_HOOK, hook)
    }

    pub fn with_reverse(self, reverse: bool) -> Self {
        self.with(REVERSE, reverse)
    }

    pub fn with_loglevel(self, loglevel: LogLevel) -> Self {
        self.with(LOGLEVEL, loglevel)
    }

    pub fn entries(&self) -> &[(String, OptionValue)] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        let key = canonical_scene_option(key).unwrap_or(key);
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 100;

/// Configuration for [`crate::Controller`].
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerOptions {
    /// The scroll viewport. Defaults to the window.
    pub container: Target,
    /// Whether scenes follow vertical (default) or horizontal scrolling.
    pub vertical: bool,
    /// Options applied to every scene added to the controller, overriding the scene's own.
    pub global_scene_options: SceneOptions,
    pub loglevel: LogLevel,
    /// Interval of the structural refresh driven by `Controller::tick`, in milliseconds.
    /// `0` disables it.
    pub refresh_interval: u64,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            container: Target::Window,
            vertical: true,
            global_scene_options: SceneOptions::new(),
            loglevel: LogLevel::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
        }
    }
}

impl ControllerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from keyed entries.
    ///
    /// Unknown keys are dropped with a warning; invalid values keep their default.
    /// `global_scene_options` has no keyed form and must be set with
    /// [`Self::with_global_scene_options`].
    pub fn from_entries<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, OptionValue)>) -> Self {
        let mut options = Self::default();
        let level = LogLevel::default();
        for (key, value) in entries {
            match key.as_ref() {
                "container" => {
                    options.container = match value {
                        OptionValue::Element(id) => Target::Element(id),
                        OptionValue::Text(s) => Target::Selector(s),
                        _ => Target::Window,
                    }
                }
                "vertical" => options.vertical = value.truthy(),
                "loglevel" => match validate_loglevel(&value) {
                    Ok(l) => options.loglevel = l,
                    Err(e) => log_error!(level, "{e}"),
                },
                "refresh_interval" | "refreshInterval" => {
                    let n = match &value {
                        OptionValue::Number(n) => *n,
                        OptionValue::Text(s) => parse_float(s),
                        _ => f64::NAN,
                    };
                    if n.is_finite() {
                        options.refresh_interval = n.trunc().max(0.0) as u64;
                    } else {
                        log_warn!(level, "invalid refresh interval {value}, using default");
                    }
                }
                other => log_warn!(level, "unknown controller option {other:?} dropped"),
            }
        }
        options
    }

    pub fn with_container(mut self, container: impl Into<Target>) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_vertical(mut self, vertical: bool) -> Self {
        self.vertical = vertical;
        self
    }

    pub fn with_global_scene_options(mut self, options: SceneOptions) -> Self {
        self.global_scene_options = options;
        self
    }

    pub fn with_loglevel(mut self, loglevel: LogLevel) -> Self {
        self.loglevel = loglevel;
        self
    }

    pub fn with_refresh_interval(mut self, interval_ms: u64) -> Self {
        self.refresh_interval = interval_ms;
        self
    }
}

/// An extra scene option registered on an [`crate::Engine`].
#[derive(Clone)]
pub struct OptionDescriptor {
    pub name: String,
    pub default: OptionValue,
    pub validate: Validator,
    /// Whether a change moves the scene's scroll bounds (emits `shift`).
    pub shifts: bool,
}

impl OptionDescriptor {
    /// A descriptor accepting any value.
    pub fn new(name: impl Into<String>, default: impl Into<OptionValue>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            validate: Rc::new(|v| Ok(v.clone())),
            shifts: false,
        }
    }

    pub fn with_validator(
        mut self,
        validate: impl Fn(&OptionValue) -> Result<OptionValue, OptionError> + 'static,
    ) -> Self {
        self.validate = Rc::new(validate);
        self
    }

    pub fn with_shifts(mut self, shifts: bool) -> Self {
        self.shifts = shifts;
        self
    }
}

impl fmt::Debug for OptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDescriptor")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("shifts", &self.shifts)
            .finish_non_exhaustive()
    }
}
