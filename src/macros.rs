// Leveled logging. Every message is filtered by the emitting instance's `LogLevel` first and is
// then forwarded to `tracing` (target "scrollscene") when the `tracing` feature is enabled.

#[cfg(feature = "tracing")]
macro_rules! log_error {
    ($level:expr, $($tt:tt)*) => {
        if $level >= $crate::LogLevel::Errors {
            tracing::error!(target: "scrollscene", $($tt)*)
        }
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_error {
    ($level:expr, $($tt:tt)*) => {{
        let _ = $level;
    }};
}

#[cfg(feature = "tracing")]
macro_rules! log_warn {
    ($level:expr, $($tt:tt)*) => {
        if $level >= $crate::LogLevel::Warnings {
            tracing::warn!(target: "scrollscene", $($tt)*)
        }
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_warn {
    ($level:expr, $($tt:tt)*) => {{
        let _ = $level;
    }};
}

#[cfg(feature = "tracing")]
macro_rules! log_debug {
    ($level:expr, $($tt:tt)*) => {
        if $level >= $crate::LogLevel::Verbose {
            tracing::debug!(target: "scrollscene", $($tt)*)
        }
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_debug {
    ($level:expr, $($tt:tt)*) => {{
        let _ = $level;
    }};
}

#[cfg(feature = "tracing")]
macro_rules! log_trace {
    ($level:expr, $($tt:tt)*) => {
        if $level >= $crate::LogLevel::Verbose {
            tracing::trace!(target: "scrollscene", $($tt)*)
        }
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_trace {
    ($level:expr, $($tt:tt)*) => {{
        let _ = $level;
    }};
}
