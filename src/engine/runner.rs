//! Engine event loop — consumes [`EngineEvent`]s from one queue and emits
//! [`EngineOutput`]s over a `tokio::sync::mpsc` channel.
//!
//! [`Engine`] owns every mutable entity ([`EngineState`], both per-stream
//! VAD/silence pipelines, the mode registry); no lock ever guards them
//! because only this one task touches them.  Answer generation is
//! fire-and-forget: the engine emits [`EngineOutput::DispatchRequested`] and
//! the host feeds the completion back as an ordinary queued event.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::modes::{Mode, ModeManager};
use crate::question::{clean_transcript, QuestionId};
use crate::vad::{SilenceEdge, SilenceTracker, VadDetector};

use super::dispatch;
use super::events::{EngineEvent, EngineOutput, HistorySnapshot, StreamSource};
use super::lifecycle::{finalize_current, should_finalize_now, Promotion};
use super::state::EngineState;

// ---------------------------------------------------------------------------
// StreamPipeline
// ---------------------------------------------------------------------------

/// VAD detector plus silence debounce for one audio source.
///
/// Local and remote pipelines are fully independent; they never share state.
struct StreamPipeline {
    vad: VadDetector,
    silence: SilenceTracker,
}

impl StreamPipeline {
    fn new(config: &AppConfig, source: StreamSource) -> Self {
        let timeout_ms = match source {
            StreamSource::Local => config.silence.local_timeout_ms,
            StreamSource::Remote => config.silence.remote_timeout_ms,
        };
        Self {
            vad: VadDetector::new(&config.vad),
            silence: SilenceTracker::new(timeout_ms, source.label()),
        }
    }

    fn reset(&mut self) {
        self.vad.reset();
        self.silence.reset();
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The transcript consolidation & turn-finalization engine.
///
/// Create with [`Engine::new`], then either call [`run`](Self::run) inside a
/// tokio task with the event receiver, or drive it directly with
/// [`handle_event`](Self::handle_event) (tests do the latter).
pub struct Engine {
    state: EngineState,
    modes: ModeManager,
    local: StreamPipeline,
    remote: StreamPipeline,
    clock: Arc<dyn Clock>,
    output_tx: mpsc::Sender<EngineOutput>,
}

impl Engine {
    /// Build an engine from config with the configured initial mode active.
    pub fn new(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        output_tx: mpsc::Sender<EngineOutput>,
    ) -> Self {
        Self {
            state: EngineState::new(),
            modes: ModeManager::with_default_modes(config.mode),
            local: StreamPipeline::new(config, StreamSource::Local),
            remote: StreamPipeline::new(config, StreamSource::Remote),
            clock,
            output_tx,
        }
    }

    /// Read-only view of the engine state (hosts and tests).
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// The currently active mode.
    pub fn mode(&self) -> Mode {
        self.modes.active()
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `event_rx` is closed.  Spawn as a tokio task from the host.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<EngineEvent>) {
        while let Some(event) = event_rx.recv().await {
            self.handle_event(event).await;
        }
        log::info!("engine: event channel closed, shutting down");
    }

    /// Process one event.  All state transitions happen here, in arrival
    /// order — silence expiry, transcripts and answer completions are
    /// totally ordered on the same queue.
    pub async fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Speech {
                source,
                text,
                is_interim,
                timestamp_ms,
            } => {
                self.handle_speech(source, &text, is_interim, timestamp_ms)
                    .await;
            }
            EngineEvent::Volume {
                source,
                percent,
                pcm,
            } => {
                self.handle_volume(source, percent, pcm.as_deref()).await;
            }
            EngineEvent::StreamStarted { source } => {
                self.stream_mut(source).reset();
                log::info!("[{}] stream started, VAD state reset", source.label());
            }
            EngineEvent::ModeSwitch { mode } => {
                self.handle_mode_switch(mode).await;
            }
            EngineEvent::Select { question_id } => {
                self.handle_select(question_id).await;
            }
            EngineEvent::AnswerCompleted { question_id } => {
                self.handle_answer_completed(&question_id).await;
            }
            EngineEvent::AnswerFailed {
                question_id,
                reason,
            } => {
                self.handle_answer_failed(&question_id, &reason).await;
            }
            EngineEvent::Reset => {
                self.handle_reset().await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// Consolidate a transcript fragment and run the finalize trigger.
    async fn handle_speech(
        &mut self,
        source: StreamSource,
        text: &str,
        is_interim: bool,
        timestamp_ms: u64,
    ) {
        let cleaned = clean_transcript(text);

        // Only remote transcripts feed the current question; local ones are
        // display-only and never touch the state machine.
        if source == StreamSource::Local {
            log::debug!("[local] transcript (display-only): {cleaned:?}");
            return;
        }

        // Capture the debounce flag before consolidation mutates anything.
        let debounce_armed = self.remote.silence.should_finalize();

        if !cleaned.is_empty() {
            self.state
                .current
                .consolidate(&cleaned, is_interim, timestamp_ms);
            if self.state.selected_id.is_none() {
                self.state.selected_id = Some(QuestionId::Current);
            }
            self.emit_current().await;
        }

        if should_finalize_now(debounce_armed, is_interim, self.state.current.has_text()) {
            self.remote.silence.consume_finalize();
            self.promote(timestamp_ms).await;
        }
    }

    /// Classify one audio tick; a debounce edge asks the STT collaborator to
    /// flush its buffered audio.
    async fn handle_volume(&mut self, source: StreamSource, percent: f32, pcm: Option<&[i16]>) {
        let now = self.clock.now_ms();
        let pipeline = self.stream_mut(source);
        let is_speech = pipeline.vad.classify(pcm, percent);

        if pipeline.silence.observe(is_speech, now) == SilenceEdge::Finalize {
            self.emit(EngineOutput::FlushNow { source }).await;
        }
    }

    async fn handle_mode_switch(&mut self, mode: Mode) {
        match self.modes.set_mode(mode) {
            Ok(()) => {
                // Switching modes never mutates the live question or history,
                // only future routing decisions.
                let label = self.modes.strategy().mode_label();
                self.emit_status(label.to_string()).await;
            }
            Err(e) => {
                log::warn!("mode switch rejected: {e}");
                self.emit_status(e.to_string()).await;
            }
        }
    }

    /// Explicit user selection.  Selecting the live question promotes it and
    /// dispatches the promoted entry; selecting a history entry dispatches it
    /// subject to the mode's re-ask rules.
    async fn handle_select(&mut self, question_id: QuestionId) {
        match question_id {
            QuestionId::Current => {
                let now = self.clock.now_ms();
                let (promoted, auto_dispatched) = self.run_promotion(now).await;
                // A deduplicated promotion still targets the surviving entry;
                // Skipped means there was nothing to ask.
                let target = promoted.or_else(|| self.state.history.last().map(|e| e.id.clone()));
                match target {
                    // Guided promotion already dispatched this entry; a second
                    // request here would break exactly-once.
                    Some(_) if auto_dispatched => {}
                    Some(id) => self.try_dispatch(QuestionId::history(id)).await,
                    None => self.emit_status("nothing to ask yet".to_string()).await,
                }
            }
            QuestionId::History(ref id) => {
                let Some(entry) = self.state.entry(id) else {
                    self.emit_status(format!("unknown question: {id}")).await;
                    return;
                };
                if entry.incomplete {
                    self.emit_status(format!("question {id} is incomplete")).await;
                    return;
                }
                self.state.selected_id = Some(question_id.clone());
                self.emit_history().await;
                self.try_dispatch(question_id).await;
            }
        }
    }

    async fn handle_answer_completed(&mut self, question_id: &QuestionId) {
        match dispatch::complete_dispatch(&mut self.state, question_id) {
            Some(QuestionId::History(_)) => {
                self.emit_history().await;
            }
            Some(QuestionId::Current) => {
                // Answered before promotion; the sentinel membership migrates
                // when the question is promoted.
            }
            None => {
                log::debug!("stale completion for {question_id} discarded");
            }
        }
    }

    async fn handle_answer_failed(&mut self, question_id: &QuestionId, reason: &str) {
        if dispatch::fail_dispatch(&mut self.state, question_id, reason) {
            self.emit_status(format!("answer failed: {reason}")).await;
        }
    }

    async fn handle_reset(&mut self) {
        self.state.reset();
        self.local.reset();
        self.remote.reset();
        log::info!("engine reset");
        self.emit_current().await;
        self.emit_history().await;
    }

    // -----------------------------------------------------------------------
    // Promotion and dispatch plumbing
    // -----------------------------------------------------------------------

    /// Finalize the live question.  On promotion, runs guided auto-dispatch.
    async fn promote(&mut self, now_ms: u64) {
        let _ = self.run_promotion(now_ms).await;
    }

    /// Shared promotion path.  Returns the promoted entry's id (`None` when
    /// the promotion was skipped or deduplicated) and whether auto-dispatch
    /// already fired for it — callers must not dispatch that entry again.
    async fn run_promotion(&mut self, now_ms: u64) -> (Option<String>, bool) {
        let promotion = finalize_current(&mut self.state, self.modes.strategy(), now_ms);
        match promotion {
            Promotion::Skipped => (None, false),
            Promotion::Deduplicated => {
                self.emit_current().await;
                (None, false)
            }
            Promotion::Promoted {
                id,
                remapped_in_flight,
                ..
            } => {
                self.emit_current().await;
                self.emit_history().await;

                let auto = self.modes.strategy().auto_dispatch_on_finalize();
                let promoted = QuestionId::history(id.clone());
                let mut dispatched = false;
                if auto
                    && !remapped_in_flight
                    && !self.state.is_answered(&promoted)
                    && self.state.dispatched_turn_id != Some(self.state.guided_turn_id)
                    && self.state.answered_turn_id != Some(self.state.guided_turn_id)
                {
                    self.try_dispatch(promoted).await;
                    dispatched = true;
                }
                (Some(id), dispatched)
            }
        }
    }

    /// Run the dispatch guard ladder; success emits the request, a guard
    /// failure surfaces as a status notification.
    async fn try_dispatch(&mut self, question_id: QuestionId) {
        let text = self.state.question_text(&question_id);
        match dispatch::request_dispatch(
            &mut self.state,
            self.modes.strategy(),
            question_id,
            &text,
        ) {
            Ok(ticket) => {
                self.emit(EngineOutput::DispatchRequested {
                    question_id: ticket.question_id,
                    text: ticket.text,
                    turn_id: ticket.turn_id,
                })
                .await;
            }
            Err(e) => {
                log::debug!("dispatch refused: {e}");
                self.emit_status(e.to_string()).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Output helpers
    // -----------------------------------------------------------------------

    fn stream_mut(&mut self, source: StreamSource) -> &mut StreamPipeline {
        match source {
            StreamSource::Local => &mut self.local,
            StreamSource::Remote => &mut self.remote,
        }
    }

    fn snapshots(&self) -> Vec<HistorySnapshot> {
        self.state
            .history
            .iter()
            .map(|e| HistorySnapshot {
                id: e.id.clone(),
                text: e.text.clone(),
                turn_id: e.turn_id,
                is_answered: e.answered,
                is_incomplete: e.incomplete,
                is_selected: self.state.selected_id
                    == Some(QuestionId::history(e.id.clone())),
            })
            .collect()
    }

    async fn emit_current(&self) {
        self.emit(EngineOutput::CurrentQuestionChanged {
            text: self.state.current.text(),
            is_selected: self.state.selected_id == Some(QuestionId::Current),
        })
        .await;
    }

    async fn emit_history(&self) {
        self.emit(EngineOutput::HistoryChanged {
            entries: self.snapshots(),
            selected_id: self.state.selected_id.clone(),
        })
        .await;
    }

    async fn emit_status(&self, message: String) {
        self.emit(EngineOutput::Status { message }).await;
    }

    async fn emit(&self, output: EngineOutput) {
        // A closed output channel only means the host went away.
        let _ = self.output_tx.send(output).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
