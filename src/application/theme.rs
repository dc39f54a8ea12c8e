//! Process-wide active theme set.

use std::sync::RwLock;

use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "application::theme";

/// Ordered theme stack used by the renderer to resolve templates and styles.
#[derive(Debug)]
pub struct ThemeState {
    active: RwLock<Vec<String>>,
}

impl ThemeState {
    pub fn new(themes: Vec<String>) -> Self {
        Self {
            active: RwLock::new(themes),
        }
    }

    pub fn active(&self) -> Vec<String> {
        rw_read(&self.active, SOURCE, "active").clone()
    }

    fn replace(&self, themes: Vec<String>) -> Vec<String> {
        std::mem::replace(&mut *rw_write(&self.active, SOURCE, "replace"), themes)
    }

    /// Activate `themes` until the returned guard drops, then restore the
    /// previous set. Restoration also runs when the scope exits by error or
    /// unwinding.
    pub fn scoped(&self, themes: Vec<String>) -> ThemeGuard<'_> {
        let previous = self.replace(themes);
        ThemeGuard {
            state: self,
            previous: Some(previous),
        }
    }
}

impl Default for ThemeState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[must_use = "dropping the guard immediately restores the previous themes"]
#[derive(Debug)]
pub struct ThemeGuard<'a> {
    state: &'a ThemeState,
    previous: Option<Vec<String>>,
}

impl Drop for ThemeGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.state.replace(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn themes(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn guard_restores_on_scope_exit() {
        let state = ThemeState::new(themes(&["admin"]));
        {
            let _guard = state.scoped(themes(&["simple", "base"]));
            assert_eq!(state.active(), themes(&["simple", "base"]));
        }
        assert_eq!(state.active(), themes(&["admin"]));
    }

    #[test]
    fn guard_restores_on_early_error_return() {
        fn failing(state: &ThemeState) -> Result<(), &'static str> {
            let _guard = state.scoped(themes(&["simple"]));
            Err("render failed")
        }

        let state = ThemeState::new(themes(&["admin"]));
        assert!(failing(&state).is_err());
        assert_eq!(state.active(), themes(&["admin"]));
    }

    #[test]
    fn guard_restores_on_panic() {
        let state = ThemeState::new(themes(&["admin"]));
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = state.scoped(themes(&["simple"]));
            panic!("renderer blew up");
        }));
        assert!(result.is_err());
        assert_eq!(state.active(), themes(&["admin"]));
    }
}
