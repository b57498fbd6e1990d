//! Conversation modes.
//!
//! Two modes control routing decisions around finalization and dispatch:
//!
//! | Mode     | Auto-dispatch on finalize | Re-ask answered history | Guided turn counter |
//! |----------|---------------------------|-------------------------|---------------------|
//! | Guided   | yes (once per turn)       | no                      | increments          |
//! | Freeform | no (explicit select only) | yes                     | untouched           |
//!
//! Switching modes never mutates the in-progress question or history; it only
//! changes future routing.  A switch to an unregistered mode fails with
//! [`ModeError::NotRegistered`] and leaves the active mode unchanged.

pub mod manager;
pub mod strategy;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use manager::{ModeError, ModeManager};
pub use strategy::{FreeformStrategy, GuidedStrategy, Mode, ModeStrategy};
