//! Meeting Copilot — transcript consolidation & turn-finalization engine.
//!
//! Turns streamed partial/final transcription events from a two-party call
//! (local microphone + remote meeting audio) into discrete questions, decides
//! the exact moment a question is complete, and hands it to an answer
//! generator exactly once.
//!
//! # Subsystems
//!
//! * [`clock`] — injectable time source; all timing is deterministic under test.
//! * [`config`] — TOML settings (`AppConfig`) and platform paths (`AppPaths`).
//! * [`vad`] — per-stream speech/silence classification and debounced
//!   finalize edges.
//! * [`question`] — the live question, promoted history entries, and
//!   transcript text cleanup.
//! * [`modes`] — guided/freeform routing strategies and the mode registry.
//! * [`engine`] — the single-task event loop tying everything together.
//! * [`answer`] — the answer-generation collaborator interface and the
//!   OpenAI-compatible backend.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meeting_copilot::clock::SystemClock;
//! use meeting_copilot::config::AppConfig;
//! use meeting_copilot::engine::{Engine, EngineEvent, StreamSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);
//!     let (output_tx, mut output_rx) = tokio::sync::mpsc::channel(64);
//!
//!     let engine = Engine::new(&config, Arc::new(SystemClock), output_tx);
//!     tokio::spawn(engine.run(event_rx));
//!
//!     let _ = event_tx
//!         .send(EngineEvent::Speech {
//!             source: StreamSource::Remote,
//!             text: "what is the plan for next week".into(),
//!             is_interim: false,
//!             timestamp_ms: 0,
//!         })
//!         .await;
//!
//!     while let Some(output) = output_rx.recv().await {
//!         println!("{output:?}");
//!     }
//! }
//! ```

pub mod answer;
pub mod clock;
pub mod config;
pub mod engine;
pub mod modes;
pub mod question;
pub mod vad;
