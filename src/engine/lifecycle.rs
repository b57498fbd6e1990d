//! Question lifecycle: the finalize trigger and the promotion procedure.
//!
//! States: **Empty** → **Accumulating** → **Promoted** (appended to history,
//! current question reset to Empty for the next turn).
//!
//! There is exactly one finalize trigger, [`should_finalize_now`].  The
//! second clause exists because a backend may emit one long utterance as two
//! consecutive final messages without re-arming the silence debounce in
//! between — without it, the second fragment would sit in the live question
//! indefinitely.  Do not add a second trigger path.

use crate::modes::ModeStrategy;
use crate::question::{normalize_for_compare, HistoryEntry, QuestionId};

use super::state::EngineState;

// ---------------------------------------------------------------------------
// Finalize trigger
// ---------------------------------------------------------------------------

/// The reconciled finalize rule:
///
/// `(debounce_armed || (!is_interim && has_text)) && !is_interim`
///
/// | debounce_armed | is_interim | fires |
/// |----------------|------------|-------|
/// | true           | false      | yes   |
/// | false          | false      | yes (when text is present) |
/// | false          | true       | no    |
/// | true           | true       | no    |
pub fn should_finalize_now(debounce_armed: bool, is_interim: bool, has_text: bool) -> bool {
    (debounce_armed || (!is_interim && has_text)) && !is_interim
}

// ---------------------------------------------------------------------------
// Promotion
// ---------------------------------------------------------------------------

/// What `finalize_current` did.
#[derive(Debug, Clone, PartialEq)]
pub enum Promotion {
    /// Guards rejected the finalize: nothing to promote, or the question was
    /// already finalized.  Idempotent no-op, not a failure.
    Skipped,
    /// The text equals the previous history entry (normalized); the live
    /// question was discarded instead of re-appended.
    Deduplicated,
    /// A new history entry was appended.
    Promoted {
        id: String,
        turn_id: u64,
        /// An in-flight dispatch against CURRENT was re-targeted to `id`.
        remapped_in_flight: bool,
    },
}

/// Finalize the live question and promote it into history.
///
/// Guards run before any mutation: an empty question or an already-finalized
/// one leaves all state untouched.  On promotion:
///
/// 1. mint `new_id` from the global counter; `turn_id = new_id` numerically;
/// 2. advance the guided turn counter when the active mode says so;
/// 3. duplicate-history suppression against the previous entry;
/// 4. migrate any CURRENT membership in the answered set to `new_id`;
/// 5. re-target in-flight dispatches still aimed at CURRENT;
/// 6. reset the live question and select the new entry.
pub fn finalize_current(
    state: &mut EngineState,
    strategy: &dyn ModeStrategy,
    now_ms: u64,
) -> Promotion {
    let text = state.current.text().trim().to_string();

    if text.is_empty() {
        log::debug!("finalize skipped: no text");
        return Promotion::Skipped;
    }
    if state.current.finalized {
        log::debug!("finalize skipped: already finalized");
        return Promotion::Skipped;
    }

    // Duplicate-history suppression: the backend sometimes echoes a final
    // utterance twice.
    if let Some(last) = state.history.last() {
        if normalize_for_compare(&last.text) == normalize_for_compare(&text) {
            log::debug!("promotion deduplicated against entry {}", last.id);
            state.current.reset();
            if state.selected_id.is_none() {
                state.selected_id = Some(QuestionId::Current);
            }
            return Promotion::Deduplicated;
        }
    }

    state.current.finalized = true;
    state.current.last_update = Some(now_ms);

    let (new_id, turn_id) = state.next_global_id();
    if strategy.increments_guided_turn() {
        state.guided_turn_id += 1;
    }

    state.history.push(HistoryEntry {
        id: new_id.clone(),
        text,
        turn_id,
        created_at: state.current.created_at.unwrap_or(now_ms),
        last_update: state.current.last_update.unwrap_or(now_ms),
        answered: false,
        incomplete: false,
    });

    // A dispatch fired against the live question may already have resolved;
    // its answered-set membership moves to the permanent id.
    if state.answered.remove(&QuestionId::Current) {
        state.answered.insert(QuestionId::history(new_id.clone()));
        if let Some(entry) = state.entry_mut(&new_id) {
            entry.answered = true;
        }
        log::debug!("answered-set membership migrated CURRENT -> {new_id}");
    }

    // Re-target still-streaming dispatches so the answer lands on the
    // permanent entry, not the sentinel.
    let mut remapped = false;
    for flight in &mut state.in_flight {
        if flight.target.is_current() {
            flight.target = QuestionId::history(new_id.clone());
            remapped = true;
            log::debug!("in-flight dispatch re-targeted CURRENT -> {new_id}");
        }
    }

    state.current.reset();
    state.selected_id = Some(QuestionId::history(new_id.clone()));

    log::info!("question {new_id} promoted to history (turn {turn_id})");
    Promotion::Promoted {
        id: new_id,
        turn_id,
        remapped_in_flight: remapped,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::InFlightDispatch;
    use crate::modes::{FreeformStrategy, GuidedStrategy};

    fn accumulating(text: &str) -> EngineState {
        let mut state = EngineState::new();
        state.current.consolidate(text, false, 100);
        state
    }

    // ---- Finalize truth table ----------------------------------------------

    #[test]
    fn finalize_trigger_truth_table() {
        // (debounce_armed, is_interim) → fires, with text present
        assert!(should_finalize_now(true, false, true));
        assert!(should_finalize_now(false, false, true));
        assert!(!should_finalize_now(false, true, true));
        assert!(!should_finalize_now(true, true, true));
    }

    #[test]
    fn final_without_text_needs_the_debounce_edge() {
        assert!(!should_finalize_now(false, false, false));
        assert!(should_finalize_now(true, false, false));
    }

    // ---- Guards ------------------------------------------------------------

    #[test]
    fn empty_question_is_not_promoted() {
        let mut state = EngineState::new();
        let result = finalize_current(&mut state, &GuidedStrategy, 200);
        assert_eq!(result, Promotion::Skipped);
        assert!(state.history.is_empty());
        assert_eq!(state.global_id_counter, 0);
    }

    #[test]
    fn whitespace_only_question_is_not_promoted() {
        let mut state = accumulating("   ");
        let result = finalize_current(&mut state, &GuidedStrategy, 200);
        assert_eq!(result, Promotion::Skipped);
        assert!(state.history.is_empty());
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut state = accumulating("what is rust");
        let first = finalize_current(&mut state, &GuidedStrategy, 200);
        assert!(matches!(first, Promotion::Promoted { .. }));

        // Current question is now empty; a racing duplicate signal must not
        // promote a second entry.
        let second = finalize_current(&mut state, &GuidedStrategy, 201);
        assert_eq!(second, Promotion::Skipped);
        assert_eq!(state.history.len(), 1);
    }

    // ---- Promotion ---------------------------------------------------------

    #[test]
    fn promotion_assigns_id_and_resets_current() {
        let mut state = accumulating("what is rust");
        let result = finalize_current(&mut state, &GuidedStrategy, 200);

        assert_eq!(
            result,
            Promotion::Promoted {
                id: "1".into(),
                turn_id: 1,
                remapped_in_flight: false
            }
        );
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].text, "what is rust");
        assert_eq!(state.history[0].turn_id, 1);
        assert_eq!(state.history[0].created_at, 100);
        assert!(!state.current.has_text());
        assert_eq!(state.selected_id, Some(QuestionId::history("1")));
    }

    #[test]
    fn turn_ids_are_strictly_increasing_without_gaps() {
        let mut state = EngineState::new();
        for i in 0..5 {
            state.current.consolidate(&format!("question {i}"), false, i);
            finalize_current(&mut state, &GuidedStrategy, i);
        }
        let turns: Vec<u64> = state.history.iter().map(|e| e.turn_id).collect();
        assert_eq!(turns, vec![1, 2, 3, 4, 5]);
        let ids: Vec<&str> = state.history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn guided_turn_counter_advances_only_in_guided_mode() {
        let mut state = accumulating("first");
        finalize_current(&mut state, &GuidedStrategy, 0);
        assert_eq!(state.guided_turn_id, 1);

        state.current.consolidate("second", false, 1);
        finalize_current(&mut state, &FreeformStrategy, 1);
        assert_eq!(state.guided_turn_id, 1); // untouched
        assert_eq!(state.history.len(), 2);
    }

    // ---- Split finals (the CURRENT-stuck regression) -----------------------

    #[test]
    fn split_finals_promote_as_two_entries() {
        let mut state = EngineState::new();

        // First final fragment, debounce armed.
        state.current.consolidate("ir a", false, 10);
        assert!(should_finalize_now(true, false, state.current.has_text()));
        finalize_current(&mut state, &GuidedStrategy, 10);

        // Second final arrives with the debounce flag re-set by a speech
        // false-positive; clause (b) of the trigger must still fire.
        state.current.consolidate("pé", false, 20);
        assert!(should_finalize_now(false, false, state.current.has_text()));
        finalize_current(&mut state, &GuidedStrategy, 20);

        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].text, "ir a");
        assert_eq!(state.history[1].text, "pé");
        assert_eq!(state.current.text(), "");
    }

    // ---- Dedup -------------------------------------------------------------

    #[test]
    fn duplicate_of_last_entry_is_discarded() {
        let mut state = accumulating("What is Rust?");
        finalize_current(&mut state, &GuidedStrategy, 10);

        // The backend echoes the same utterance, differently cased/punctuated.
        state.current.consolidate("what is rust", false, 20);
        let result = finalize_current(&mut state, &GuidedStrategy, 20);

        assert_eq!(result, Promotion::Deduplicated);
        assert_eq!(state.history.len(), 1);
        assert!(!state.current.has_text());
        // No id was minted for the discarded promotion.
        assert_eq!(state.global_id_counter, 1);
    }

    #[test]
    fn dedup_only_compares_against_immediately_preceding_entry() {
        let mut state = accumulating("alpha");
        finalize_current(&mut state, &GuidedStrategy, 0);
        state.current.consolidate("beta", false, 1);
        finalize_current(&mut state, &GuidedStrategy, 1);

        // "alpha" again — previous entry is "beta", so this is a new entry.
        state.current.consolidate("alpha", false, 2);
        finalize_current(&mut state, &GuidedStrategy, 2);
        assert_eq!(state.history.len(), 3);
    }

    // ---- In-flight remap and answered-set migration ------------------------

    #[test]
    fn promotion_remaps_in_flight_current_dispatch() {
        let mut state = accumulating("what is ownership");
        state.in_flight.push(InFlightDispatch {
            origin: QuestionId::Current,
            target: QuestionId::Current,
            turn_id: 0,
        });

        let result = finalize_current(&mut state, &GuidedStrategy, 10);
        match result {
            Promotion::Promoted {
                id,
                remapped_in_flight,
                ..
            } => {
                assert!(remapped_in_flight);
                assert_eq!(state.in_flight[0].target, QuestionId::history(id));
                assert_eq!(state.in_flight[0].origin, QuestionId::Current);
            }
            other => panic!("expected promotion, got {other:?}"),
        }
    }

    #[test]
    fn promotion_migrates_answered_sentinel() {
        let mut state = accumulating("already answered live");
        state.answered.insert(QuestionId::Current);

        finalize_current(&mut state, &GuidedStrategy, 10);

        assert!(!state.answered.contains(&QuestionId::Current));
        assert!(state.answered.contains(&QuestionId::history("1")));
        assert!(state.history[0].answered);
    }
}
