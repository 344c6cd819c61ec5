#![deny(missing_docs)]
//! Shared logging utilities for the jobwatch workspace.
//!
//! This crate provides the `watch_*` logging macros used across the codebase.
//! Every line is prefixed with the poll cycle the current thread is working
//! on, so a log file reads as a sequence of cycles.

use std::cell::Cell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Thread-local storage for the current poll cycle number.
    static POLL_CYCLE: Cell<u64> = const { Cell::new(0) };
}

/// Sets the poll cycle number for the current thread.
/// The run loop calls this once at the start of every cycle.
pub fn set_cycle(cycle: u64) {
    POLL_CYCLE.with(|v| v.set(cycle));
}

/// Retrieves the poll cycle number for the current thread.
/// Returns 0 before the first cycle has started.
pub fn current_cycle() -> u64 {
    POLL_CYCLE.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current cycle.
#[macro_export]
macro_rules! watch_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("[cycle {}] {}", $crate::current_cycle(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current cycle.
#[macro_export]
macro_rules! watch_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("[cycle {}] {}", $crate::current_cycle(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current cycle.
#[macro_export]
macro_rules! watch_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("[cycle {}] {}", $crate::current_cycle(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current cycle.
#[macro_export]
macro_rules! watch_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("[cycle {}] {}", $crate::current_cycle(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current cycle.
#[macro_export]
macro_rules! watch_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("[cycle {}] {}", $crate::current_cycle(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{current_cycle, set_cycle};

    #[test]
    fn cycle_counter_is_per_thread() {
        set_cycle(7);
        assert_eq!(current_cycle(), 7);

        let other = std::thread::spawn(current_cycle).join().unwrap();
        assert_eq!(other, 0);
    }
}
