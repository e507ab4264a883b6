#![allow(unused_macros)]

//! Log shims. Without the `logging` feature every call compiles away,
//! arguments included.

macro_rules! log_at {
    ($level:ident, $($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::$level!(target: "sequence", $($arg)+);
    )
}

/// Block lifetime: allocation, reallocation, rollback.
macro_rules! debug {
    ($($arg:tt)+) => (
        log_at!(debug, $($arg)+)
    )
}

/// Per-element events.
macro_rules! trace {
    ($($arg:tt)+) => (
        log_at!(trace, $($arg)+)
    )
}
