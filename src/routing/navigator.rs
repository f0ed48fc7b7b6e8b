//! Navigator port: current location plus programmatic redirects.

#[cfg(test)]
#[path = "navigator_test.rs"]
mod navigator_test;

use std::sync::{Mutex, PoisonError};

/// The router as seen by the client and session store.
pub trait Navigator: Send + Sync {
    /// Path of the page currently shown.
    fn current_path(&self) -> String;
    /// Move to `path`.
    fn push(&self, path: &str);
}

/// Navigator that only tracks location and history. Backs the CLI and tests.
#[derive(Debug)]
pub struct MemoryNavigator {
    state: Mutex<NavState>,
}

#[derive(Debug)]
struct NavState {
    current: String,
    history: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self { state: Mutex::new(NavState { current: initial.into(), history: Vec::new() }) }
    }

    /// Every path pushed so far, oldest first. The initial location is not included.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).history.clone()
    }

    /// The most recent push, if any.
    #[must_use]
    pub fn last_push(&self) -> Option<String> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).history.last().cloned()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(super::ROOT)
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).current.clone()
    }

    fn push(&self, path: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        path.clone_into(&mut state.current);
        state.history.push(path.to_owned());
    }
}
