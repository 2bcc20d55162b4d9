//! Unified logging support for ntio-async
//!
//! These macros forward to the `log` crate when the `log` feature is
//! enabled. Without it the arguments are still type-checked and borrowed, so
//! values that are only logged do not trigger unused warnings.

/// Unified trace-level logging
#[macro_export]
macro_rules! aio_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::trace!($($arg)*);
        #[cfg(not(feature = "log"))]
        { let _ = format_args!($($arg)*); }
    }
}

/// Unified debug-level logging
#[macro_export]
macro_rules! aio_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::debug!($($arg)*);
        #[cfg(not(feature = "log"))]
        { let _ = format_args!($($arg)*); }
    }
}

/// Unified info-level logging
#[macro_export]
macro_rules! aio_info {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::info!($($arg)*);
        #[cfg(not(feature = "log"))]
        { let _ = format_args!($($arg)*); }
    }
}

/// Unified warn-level logging
#[macro_export]
macro_rules! aio_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::warn!($($arg)*);
        #[cfg(not(feature = "log"))]
        { let _ = format_args!($($arg)*); }
    }
}

/// Unified error-level logging
#[macro_export]
macro_rules! aio_error {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::error!($($arg)*);
        #[cfg(not(feature = "log"))]
        { let _ = format_args!($($arg)*); }
    }
}
