// ornate-core/src/diagnostics.rs
//! Process-wide debug switch. Diagnostics are only emitted while it is on;
//! nothing in the engine changes behaviour based on it.

use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG: AtomicBool = AtomicBool::new(false);

pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Emits a `tracing` warning under the `ornate` target when debug mode is on.
#[macro_export]
macro_rules! diagnostic {
    ($($arg:tt)+) => {
        if $crate::diagnostics::debug_enabled() {
            $crate::__tracing::warn!(target: "ornate", $($arg)+);
        }
    };
}
