use std::sync::{Mutex, PoisonError};

use explorer_core::{update, AppState, AppViewModel, Effect, Msg};

/// The controller's single application-state object. The lock is never held
/// across an await point.
#[derive(Debug, Default)]
pub struct SharedState {
    state: Mutex<AppState>,
}

impl SharedState {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Runs the pure update and returns its effects.
    pub fn apply(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let current = std::mem::take(&mut *guard);
        let (next, effects) = update(current, msg);
        *guard = next;
        effects
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn view(&self) -> AppViewModel {
        self.read(AppState::view)
    }
}
