//! Question data model: the live current question, promoted history entries,
//! and the id type that distinguishes them.

use std::fmt;

// ---------------------------------------------------------------------------
// QuestionId
// ---------------------------------------------------------------------------

/// Identifies a question: either the live, not-yet-promoted current question
/// or a permanent history entry.
///
/// History ids are monotonically increasing decimal strings minted from a
/// single global counter, so they double as turn numbers once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionId {
    /// The live question still being accumulated.
    Current,
    /// A promoted, immutable history entry.
    History(String),
}

impl QuestionId {
    /// Returns `true` for the CURRENT sentinel.
    pub fn is_current(&self) -> bool {
        matches!(self, QuestionId::Current)
    }

    /// Build a history id from its string form.
    pub fn history(id: impl Into<String>) -> Self {
        QuestionId::History(id.into())
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Current => write!(f, "CURRENT"),
            QuestionId::History(id) => write!(f, "{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// CurrentQuestion
// ---------------------------------------------------------------------------

/// The single live question, owned exclusively by the question lifecycle.
///
/// `interim_text` holds the backend's latest provisional fragment (each
/// interim payload is the full current partial, not a delta) and is replaced
/// wholesale.  `final_text` accumulates, because some backends emit one long
/// utterance as several sequential final messages.
///
/// The display text is always derived via [`CurrentQuestion::text`]; it is
/// never stored, so it can never drift out of sync with the fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentQuestion {
    /// Latest interim fragment; replaced on every interim event.
    pub interim_text: String,
    /// Accumulated final fragments, space-joined.
    pub final_text: String,
    /// Timestamp of the first fragment that touched this question.
    pub created_at: Option<u64>,
    /// Timestamp of the most recent fragment.
    pub last_update: Option<u64>,
    /// Set during promotion; guards against double promotion.
    pub finalized: bool,
}

impl CurrentQuestion {
    /// The derived display text: trimmed finals, plus the interim fragment
    /// when one is pending.
    pub fn text(&self) -> String {
        let finals = self.final_text.trim();
        if self.interim_text.is_empty() {
            finals.to_string()
        } else if finals.is_empty() {
            self.interim_text.clone()
        } else {
            format!("{} {}", finals, self.interim_text)
        }
    }

    /// Whether any text has accumulated.
    pub fn has_text(&self) -> bool {
        !self.text().trim().is_empty()
    }

    /// Apply one cleaned transcript fragment.
    ///
    /// * interim — replaces `interim_text` wholesale;
    /// * final — clears `interim_text` and appends to `final_text`.
    ///
    /// Stamps `created_at` on the first fragment that makes the question
    /// non-empty and `last_update` on every fragment.
    pub fn consolidate(&mut self, cleaned: &str, is_interim: bool, now_ms: u64) {
        if !self.has_text() {
            self.created_at = Some(now_ms);
        }
        self.last_update = Some(now_ms);

        if is_interim {
            self.interim_text = cleaned.to_string();
        } else {
            self.interim_text.clear();
            if self.final_text.is_empty() {
                self.final_text = cleaned.to_string();
            } else {
                self.final_text = format!("{} {}", self.final_text, cleaned);
            }
        }
    }

    /// Reset to the empty state (after promotion or on engine reset).
    pub fn reset(&mut self) {
        *self = CurrentQuestion::default();
    }
}

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// A promoted question.  `id`, `text`, `turn_id` and the timestamps are
/// immutable once appended; only `answered` and `incomplete` mutate later.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Monotonically increasing decimal id from the global counter.
    pub id: String,
    /// Finalized question text.
    pub text: String,
    /// Turn number, numerically equal to `id`.
    pub turn_id: u64,
    /// When the question started accumulating.
    pub created_at: u64,
    /// When the question last changed before promotion.
    pub last_update: u64,
    /// Set once an answer has completed for this entry.
    pub answered: bool,
    /// Entry was closed without usable text; selecting it only notifies.
    pub incomplete: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- QuestionId --------------------------------------------------------

    #[test]
    fn current_sentinel_displays_as_current() {
        assert_eq!(QuestionId::Current.to_string(), "CURRENT");
        assert!(QuestionId::Current.is_current());
    }

    #[test]
    fn history_id_displays_its_number() {
        let id = QuestionId::history("7");
        assert_eq!(id.to_string(), "7");
        assert!(!id.is_current());
    }

    #[test]
    fn ids_are_hashable_and_comparable() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(QuestionId::Current);
        set.insert(QuestionId::history("1"));
        set.insert(QuestionId::history("1"));
        assert_eq!(set.len(), 2);
    }

    // ---- CurrentQuestion: derived text -------------------------------------

    #[test]
    fn empty_question_has_empty_text() {
        let q = CurrentQuestion::default();
        assert_eq!(q.text(), "");
        assert!(!q.has_text());
    }

    #[test]
    fn interim_replaces_wholesale() {
        let mut q = CurrentQuestion::default();
        q.consolidate("what is", true, 10);
        q.consolidate("what is a mutex", true, 20);
        assert_eq!(q.text(), "what is a mutex");
        assert_eq!(q.final_text, "");
    }

    #[test]
    fn final_clears_interim_and_appends() {
        let mut q = CurrentQuestion::default();
        q.consolidate("what is a", true, 10);
        q.consolidate("what is a mutex", false, 20);
        assert_eq!(q.interim_text, "");
        assert_eq!(q.final_text, "what is a mutex");

        // Second sequential final appends, space-joined.
        q.consolidate("in rust", false, 30);
        assert_eq!(q.text(), "what is a mutex in rust");
    }

    #[test]
    fn text_combines_finals_and_pending_interim() {
        let mut q = CurrentQuestion::default();
        q.consolidate("first part", false, 10);
        q.consolidate("second", true, 20);
        assert_eq!(q.text(), "first part second");
    }

    // ---- CurrentQuestion: timestamps ---------------------------------------

    #[test]
    fn created_at_stamped_on_first_touch_only() {
        let mut q = CurrentQuestion::default();
        q.consolidate("hello", true, 100);
        q.consolidate("hello there", true, 200);
        assert_eq!(q.created_at, Some(100));
        assert_eq!(q.last_update, Some(200));
    }

    #[test]
    fn empty_interim_does_not_pin_created_at() {
        // A cleaned-to-empty fragment leaves the question empty, so the next
        // real fragment still counts as first touch.
        let mut q = CurrentQuestion::default();
        q.consolidate("", true, 50);
        assert!(!q.has_text());
        q.consolidate("real text", false, 80);
        assert_eq!(q.created_at, Some(80));
    }

    // ---- CurrentQuestion: reset --------------------------------------------

    #[test]
    fn reset_returns_to_default() {
        let mut q = CurrentQuestion::default();
        q.consolidate("something", false, 10);
        q.finalized = true;
        q.reset();
        assert_eq!(q, CurrentQuestion::default());
    }
}
