//! Debounced silence detection for one audio source.
//!
//! [`SilenceTracker`] converts the per-tick speech/silence booleans from the
//! detector into a single edge-triggered finalize signal.  The edge fires at
//! most once per silence episode; the next detected speech re-arms it.
//!
//! Timing is purely a function of `(now, last_active_at, timeout)` — no OS
//! timers.  `now` comes from the caller on every tick, so the tracker is
//! fully deterministic under test.

// ---------------------------------------------------------------------------
// SilenceEdge
// ---------------------------------------------------------------------------

/// Result of observing one classified tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceEdge {
    /// Nothing changed, or a state change with no action required.
    None,
    /// Stable silence was just detected.  The owner must ask the STT
    /// collaborator to flush buffered audio as a final result, and the
    /// finalize flag is now armed.
    Finalize,
}

// ---------------------------------------------------------------------------
// SilenceTracker
// ---------------------------------------------------------------------------

/// Per-source debounce state.
///
/// One instance per audio source; local and remote streams never share one.
#[derive(Debug)]
pub struct SilenceTracker {
    timeout_ms: u64,
    label: &'static str,
    last_active_at: Option<u64>,
    in_silence: bool,
    should_finalize: bool,
}

impl SilenceTracker {
    /// Create a tracker with the given debounce timeout.
    ///
    /// `label` is used only in log lines (`"local"` / `"remote"`).
    pub fn new(timeout_ms: u64, label: &'static str) -> Self {
        Self {
            timeout_ms,
            label,
            last_active_at: None,
            in_silence: false,
            should_finalize: false,
        }
    }

    /// Feed one classified tick.
    ///
    /// On speech: re-arms the debounce and clears the finalize flag.
    /// On silence: once `now - last_active_at` reaches the timeout, enters
    /// the silence state and returns [`SilenceEdge::Finalize`] — exactly once
    /// per episode.
    pub fn observe(&mut self, is_speech: bool, now_ms: u64) -> SilenceEdge {
        if is_speech {
            if self.in_silence {
                let quiet_for = self
                    .last_active_at
                    .map(|t| now_ms.saturating_sub(t))
                    .unwrap_or(0);
                log::debug!(
                    "[{}] speech resumed after {} ms of silence",
                    self.label,
                    quiet_for
                );
            }
            self.in_silence = false;
            self.should_finalize = false;
            self.last_active_at = Some(now_ms);
            return SilenceEdge::None;
        }

        // Silence before any speech was ever heard: nothing to time against.
        let Some(last_active) = self.last_active_at else {
            return SilenceEdge::None;
        };

        let elapsed = now_ms.saturating_sub(last_active);
        if elapsed >= self.timeout_ms && !self.in_silence {
            self.in_silence = true;
            self.should_finalize = true;
            log::debug!(
                "[{}] stable silence detected ({} ms) — finalize armed",
                self.label,
                elapsed
            );
            return SilenceEdge::Finalize;
        }

        SilenceEdge::None
    }

    /// Whether the finalize flag is currently armed.
    pub fn should_finalize(&self) -> bool {
        self.should_finalize
    }

    /// Clear the finalize flag after it has been consumed by the question
    /// lifecycle (a final transcript arrived while armed).
    pub fn consume_finalize(&mut self) {
        self.should_finalize = false;
    }

    /// Reset all state (stream stop/start).
    pub fn reset(&mut self) {
        self.last_active_at = None;
        self.in_silence = false;
        self.should_finalize = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
