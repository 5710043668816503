use thiserror::Error;

/// Errors surfaced to callers.
///
/// Misconfigured scenes never produce one of these: option problems are logged and the option
/// falls back to its default. Only a controller without a usable scroll container fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("no valid scroll container supplied")]
    NoScrollContainer,
}

/// Why an option value was rejected by its validator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionError {
    #[error("invalid value for option \"{option}\": {value}")]
    InvalidValue { option: String, value: String },

    #[error("invalid return value of supplied function for option \"{option}\": {value}")]
    InvalidFunctionResult { option: String, value: String },

    #[error("element defined in option \"{option}\" was not found: {target}")]
    ElementNotFound { option: String, target: String },
}

pub type Result<T> = core::result::Result<T, Error>;
