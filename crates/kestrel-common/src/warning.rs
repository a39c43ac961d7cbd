//! Engine warnings with colored terminal output.
//!
//! Provides deduplication to avoid spamming the same warning multiple times.
//! A hostile stylesheet can trigger the same problem thousands of times, so
//! each distinct message is printed once and the set of remembered messages
//! is itself bounded.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use owo_colors::OwoColorize;

/// Upper bound on the number of distinct messages remembered.
const MAX_DISTINCT_WARNINGS: usize = 1024;

/// Messages already printed, plus whether the overflow notice was shown.
struct WarningLog {
    seen: HashSet<String>,
    overflowed: bool,
}

/// Global log of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<WarningLog>> = Mutex::new(None);

/// A poisoned lock only means another thread panicked while printing; the
/// set itself is still usable.
fn lock_log() -> MutexGuard<'static, Option<WarningLog>> {
    WARNED.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Warn about a recoverable problem (prints once per unique message)
///
/// # Example
/// ```ignore
/// warn_once("CSS", "rule limit of 5000 reached; further rules ignored");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");

    let mut guard = lock_log();
    let log = guard.get_or_insert_with(|| WarningLog {
        seen: HashSet::new(),
        overflowed: false,
    });

    if log.seen.contains(&key) {
        return;
    }

    if log.seen.len() >= MAX_DISTINCT_WARNINGS {
        if !log.overflowed {
            log.overflowed = true;
            eprintln!(
                "{}",
                "[Kestrel] ⚠ too many distinct warnings; further warnings suppressed".yellow()
            );
        }
        return;
    }

    let _ = log.seen.insert(key);
    drop(guard);

    eprintln!("{}", format!("[Kestrel {component}] ⚠ {message}").yellow());
}

/// Returns true if this exact warning has already been printed.
#[cfg(test)]
fn has_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    lock_log()
        .as_ref()
        .is_some_and(|log| log.seen.contains(&key))
}

/// Clear all recorded warnings (call when loading a new document)
pub fn clear_warnings() {
    if let Some(log) = lock_log().as_mut() {
        log.seen.clear();
        log.overflowed = false;
    }
}
