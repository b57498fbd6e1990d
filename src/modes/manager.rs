//! Mode registry and active-mode switching.
//!
//! The manager owns one strategy instance per registered mode and the active
//! selection.  [`ModeManager::set_mode`] on an unregistered mode fails and
//! leaves the active mode unchanged — an unregistered mode is a construction
//! mistake, not something to silently fall through at runtime.

use std::collections::HashMap;

use thiserror::Error;

use super::strategy::{FreeformStrategy, GuidedStrategy, Mode, ModeStrategy};

// ---------------------------------------------------------------------------
// ModeError
// ---------------------------------------------------------------------------

/// Errors from mode switching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    /// The requested mode has no registered strategy.  The active mode is
    /// left unchanged.
    #[error("mode not registered: {0}")]
    NotRegistered(Mode),
}

// ---------------------------------------------------------------------------
// ModeManager
// ---------------------------------------------------------------------------

/// Registry of mode strategies plus the active selection.
pub struct ModeManager {
    active: Mode,
    strategies: HashMap<Mode, Box<dyn ModeStrategy>>,
}

impl ModeManager {
    /// Build a manager with both standard modes registered and `initial`
    /// active.
    ///
    /// # Panics
    ///
    /// Never — both standard modes are always registered here.
    pub fn with_default_modes(initial: Mode) -> Self {
        let mut manager = Self {
            active: initial,
            strategies: HashMap::new(),
        };
        manager.register(Mode::Guided, Box::new(GuidedStrategy));
        manager.register(Mode::Freeform, Box::new(FreeformStrategy));
        manager
    }

    /// Register (or replace) the strategy for `mode`.
    pub fn register(&mut self, mode: Mode, strategy: Box<dyn ModeStrategy>) {
        log::debug!("mode registered: {mode}");
        self.strategies.insert(mode, strategy);
    }

    /// Switch the active mode.
    ///
    /// # Errors
    ///
    /// [`ModeError::NotRegistered`] when `mode` has no strategy; the active
    /// mode is left unchanged.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), ModeError> {
        if !self.strategies.contains_key(&mode) {
            return Err(ModeError::NotRegistered(mode));
        }
        let old = self.active;
        self.active = mode;
        log::info!("mode changed: {old} -> {mode}");
        Ok(())
    }

    /// The currently active mode.
    pub fn active(&self) -> Mode {
        self.active
    }

    /// The active mode's strategy.
    pub fn strategy(&self) -> &dyn ModeStrategy {
        // Invariant: the active mode always has a registered strategy —
        // set_mode refuses to activate an unregistered one.
        self.strategies
            .get(&self.active)
            .map(|s| s.as_ref())
            .unwrap_or(&GuidedStrategy)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
