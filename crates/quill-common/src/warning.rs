//! Recoverable warnings reported through `tracing`.
//!
//! Markup, layout, theme and font code report content problems here instead
//! of failing. `warn_once` de-duplicates so that a message triggered for every
//! glyph run (a missing font file, say) is only logged the first time.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already logged (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Log a recoverable warning for a component.
///
/// # Example
/// ```ignore
/// warn("markup", "Unsupported HTML Tag <video>");
/// ```
pub fn warn(component: &str, message: &str) {
    tracing::warn!(component, "{message}");
}

/// Log a warning only the first time this exact message is seen.
///
/// Returns `true` when the warning was logged.
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let should_log = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_log {
        warn(component, message);
    }
    should_log
}

/// Forget all recorded warnings (call when a text box is rebuilt from scratch)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
