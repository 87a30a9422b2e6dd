//! Convenience macros for structured logging.

/// Time a synchronous block, logging its duration at `debug` level under
/// the given name.
#[macro_export]
macro_rules! timed {
    ($name:expr, $body:expr) => {{
        let __start = ::std::time::Instant::now();
        let __result = $body;
        tracing::debug!(name = $name, elapsed_ms = __start.elapsed().as_millis() as u64, "timed block");
        __result
    }};
}

/// Time an async block, logging its duration at `debug` level under the
/// given name once it resolves.
#[macro_export]
macro_rules! async_timed {
    ($name:expr, $body:expr) => {{
        let __start = ::std::time::Instant::now();
        let __result = $body.await;
        tracing::debug!(name = $name, elapsed_ms = __start.elapsed().as_millis() as u64, "timed block");
        __result
    }};
}

/// Log an error at `error` level via its `Debug` representation, then
/// return it unchanged — for use at a `?`-propagation site you also want
/// logged.
#[macro_export]
macro_rules! log_error {
    ($err:expr) => {{
        let __e = $err;
        tracing::error!(error = ?__e, "operation failed");
        __e
    }};
    ($err:expr, $($arg:tt)*) => {{
        let __e = $err;
        tracing::error!(error = ?__e, $($arg)*);
        __e
    }};
}

/// Create a span pre-declared with an `elapsed_ms` field, filled in by the
/// caller once the span's work completes.
#[macro_export]
macro_rules! timed_span {
    ($name:expr) => {
        tracing::info_span!($name, elapsed_ms = tracing::field::Empty)
    };
    ($level:expr, $name:expr) => {
        tracing::span!($level, $name, elapsed_ms = tracing::field::Empty)
    };
    ($level:expr, $name:expr, $($field:tt)*) => {
        tracing::span!($level, $name, elapsed_ms = tracing::field::Empty, $($field)*)
    };
}
