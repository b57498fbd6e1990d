//! `EngineState` — the single owner of every mutable entity in the engine.
//!
//! Design goal: no ambient globals.  The current question,
//! history, turn counters, answered set and in-flight dispatch records all
//! live here and are only ever mutated from the engine's event loop.

use std::collections::HashSet;

use crate::question::{CurrentQuestion, HistoryEntry, QuestionId};

// ---------------------------------------------------------------------------
// InFlightDispatch
// ---------------------------------------------------------------------------

/// One outstanding request to the answer generator.
///
/// `origin` is the id the producer was invoked with and will tag its
/// completion with; `target` is where the answer must land, which promotion
/// may rewrite from the CURRENT sentinel to a permanent history id while the
/// request is still streaming.
#[derive(Debug, Clone, PartialEq)]
pub struct InFlightDispatch {
    pub origin: QuestionId,
    pub target: QuestionId,
    /// Guided turn counter value at dispatch time.
    pub turn_id: u64,
}

// ---------------------------------------------------------------------------
// EngineState
// ---------------------------------------------------------------------------

/// All mutable engine state.  Reset as a unit by [`EngineState::reset`].
#[derive(Debug, Default)]
pub struct EngineState {
    /// The live question being accumulated from remote transcripts.
    pub current: CurrentQuestion,
    /// Append-only promoted questions, oldest first.
    pub history: Vec<HistoryEntry>,
    /// User/engine selection; `None` until the first remote fragment.
    pub selected_id: Option<QuestionId>,

    /// Sole authority for "already answered".  May transiently contain the
    /// CURRENT sentinel while a dispatch against the live question resolves
    /// before promotion.
    pub answered: HashSet<QuestionId>,

    /// Source of all history ids and turn numbers.  Incremented only at
    /// successful promotion, so ids are gapless.
    pub global_id_counter: u64,
    /// Mode-local turn counter, advanced only by guided promotions.
    pub guided_turn_id: u64,
    /// Guided turn of the most recent dispatch, cleared on completion.
    pub dispatched_turn_id: Option<u64>,
    /// Guided turn of the most recent completed answer.
    pub answered_turn_id: Option<u64>,
    /// Normalized text of the last live-question dispatch (double-fire guard).
    pub last_dispatched_normalized: Option<String>,

    /// Outstanding answer requests.  Guided mode holds at most one; freeform
    /// may hold several against distinct history ids.
    pub in_flight: Vec<InFlightDispatch>,
}

impl EngineState {
    /// Fresh state with all counters at their initial values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next global id.  Returns the decimal string form; the same
    /// number is the entry's turn id.
    pub fn next_global_id(&mut self) -> (String, u64) {
        self.global_id_counter += 1;
        (self.global_id_counter.to_string(), self.global_id_counter)
    }

    /// Look up a history entry by id.
    pub fn entry(&self, id: &str) -> Option<&HistoryEntry> {
        self.history.iter().find(|e| e.id == id)
    }

    /// Mutable history entry lookup.
    pub fn entry_mut(&mut self, id: &str) -> Option<&mut HistoryEntry> {
        self.history.iter_mut().find(|e| e.id == id)
    }

    /// Whether `id` has a completed answer.
    pub fn is_answered(&self, id: &QuestionId) -> bool {
        self.answered.contains(id)
    }

    /// The text a dispatch of `id` would carry.
    pub fn question_text(&self, id: &QuestionId) -> String {
        match id {
            QuestionId::Current => self.current.text(),
            QuestionId::History(h) => self
                .entry(h)
                .map(|e| e.text.clone())
                .unwrap_or_default(),
        }
    }

    /// Target of the most recent outstanding dispatch, post-remap.
    pub fn dispatched_question_id(&self) -> Option<&QuestionId> {
        self.in_flight.last().map(|f| &f.target)
    }

    /// Restore every field to its initial value.
    pub fn reset(&mut self) {
        *self = EngineState::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_decimal_strings() {
        let mut state = EngineState::new();
        assert_eq!(state.next_global_id(), ("1".to_string(), 1));
        assert_eq!(state.next_global_id(), ("2".to_string(), 2));
        assert_eq!(state.next_global_id(), ("3".to_string(), 3));
    }

    #[test]
    fn entry_lookup_by_id() {
        let mut state = EngineState::new();
        state.history.push(HistoryEntry {
            id: "1".into(),
            text: "what is rust".into(),
            turn_id: 1,
            created_at: 0,
            last_update: 0,
            answered: false,
            incomplete: false,
        });

        assert!(state.entry("1").is_some());
        assert!(state.entry("2").is_none());

        state.entry_mut("1").unwrap().answered = true;
        assert!(state.entry("1").unwrap().answered);
    }

    #[test]
    fn question_text_resolves_current_and_history() {
        let mut state = EngineState::new();
        state.current.consolidate("live question", false, 10);
        state.history.push(HistoryEntry {
            id: "1".into(),
            text: "old question".into(),
            turn_id: 1,
            created_at: 0,
            last_update: 0,
            answered: false,
            incomplete: false,
        });

        assert_eq!(state.question_text(&QuestionId::Current), "live question");
        assert_eq!(
            state.question_text(&QuestionId::history("1")),
            "old question"
        );
        assert_eq!(state.question_text(&QuestionId::history("99")), "");
    }

    #[test]
    fn reset_restores_initial_values() {
        let mut state = EngineState::new();
        state.next_global_id();
        state.guided_turn_id = 4;
        state.answered_turn_id = Some(4);
        state.last_dispatched_normalized = Some("x".into());
        state.answered.insert(QuestionId::Current);
        state.current.consolidate("text", false, 1);
        state.selected_id = Some(QuestionId::Current);
        state.in_flight.push(InFlightDispatch {
            origin: QuestionId::Current,
            target: QuestionId::Current,
            turn_id: 4,
        });

        state.reset();

        assert_eq!(state.global_id_counter, 0);
        assert_eq!(state.guided_turn_id, 0);
        assert!(state.answered_turn_id.is_none());
        assert!(state.dispatched_turn_id.is_none());
        assert!(state.last_dispatched_normalized.is_none());
        assert!(state.answered.is_empty());
        assert!(state.history.is_empty());
        assert!(state.in_flight.is_empty());
        assert!(state.selected_id.is_none());
        assert!(!state.current.has_text());
    }
}
