#![deny(missing_docs)]
//! Shared logging utilities for the explorer workspace.
//!
//! This crate provides the `explorer_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every record is tagged
//! with the root generation active on the emitting thread, so output produced
//! by a late response from a previously browsed root can be told apart from
//! output for the current one.

use std::cell::Cell;

thread_local! {
    /// Root generation active on the current thread.
    static ROOT_GENERATION: Cell<u64> = const { Cell::new(0) };
}

/// Sets the root generation for the current thread.
/// The controller calls this whenever a root is opened or switched.
pub fn set_root_generation(generation: u64) {
    ROOT_GENERATION.with(|v| v.set(generation));
}

/// Retrieves the root generation for the current thread.
/// Returns 0 before any root has been opened.
pub fn root_generation() -> u64 {
    ROOT_GENERATION.with(|v| v.get())
}

/// Logs a trace-level message tagged with the root generation.
#[macro_export]
macro_rules! explorer_trace {
    ($($arg:tt)*) => {{
        log::trace!("[root#{}] {}", $crate::root_generation(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the root generation.
#[macro_export]
macro_rules! explorer_info {
    ($($arg:tt)*) => {{
        log::info!("[root#{}] {}", $crate::root_generation(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the root generation.
#[macro_export]
macro_rules! explorer_debug {
    ($($arg:tt)*) => {{
        log::debug!("[root#{}] {}", $crate::root_generation(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the root generation.
#[macro_export]
macro_rules! explorer_warn {
    ($($arg:tt)*) => {{
        log::warn!("[root#{}] {}", $crate::root_generation(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the root generation.
#[macro_export]
macro_rules! explorer_error {
    ($($arg:tt)*) => {{
        log::error!("[root#{}] {}", $crate::root_generation(), format_args!($($arg)*));
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

    // Another test binary thread may have won the race.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
