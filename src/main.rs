//! Application entry point — Meeting Copilot CLI host.
//!
//! A line-oriented stand-in for the audio/UI layers: transcripts are typed
//! on stdin and engine outputs are printed to stdout.  The engine itself is
//! identical to the one a real capture/render host would drive.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Build the answer generator ([`ApiAnswerGenerator`]) from config.
//! 4. Create the event and output channels.
//! 5. Spawn the engine task.
//! 6. Spawn the output consumer (prints outputs; forwards dispatches to the
//!    generator and loops completions back into the event queue).
//! 7. Read stdin lines until EOF or `/quit`.
//!
//! # Input grammar
//!
//! ```text
//! other: <text>        remote final transcript
//! other: <text> ~      remote interim transcript (trailing tilde)
//! you: <text>          local transcript (display-only)
//! /mode guided|freeform
//! /select current|<history id>
//! /reset
//! /quit
//! ```

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use meeting_copilot::answer::{AnswerGenerator, ApiAnswerGenerator};
use meeting_copilot::clock::{Clock, SystemClock};
use meeting_copilot::config::AppConfig;
use meeting_copilot::engine::{Engine, EngineEvent, EngineOutput, StreamSource};
use meeting_copilot::modes::Mode;
use meeting_copilot::question::QuestionId;

// ---------------------------------------------------------------------------
// Input parsing
// ---------------------------------------------------------------------------

/// Translate one stdin line into an engine event.  `None` for blank lines
/// and unrecognised commands (reported on stderr).
fn parse_line(line: &str, now_ms: u64) -> Option<EngineEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix("other:") {
        let rest = rest.trim();
        let (text, is_interim) = match rest.strip_suffix('~') {
            Some(stripped) => (stripped.trim(), true),
            None => (rest, false),
        };
        return Some(EngineEvent::Speech {
            source: StreamSource::Remote,
            text: text.to_string(),
            is_interim,
            timestamp_ms: now_ms,
        });
    }

    if let Some(rest) = line.strip_prefix("you:") {
        return Some(EngineEvent::Speech {
            source: StreamSource::Local,
            text: rest.trim().to_string(),
            is_interim: false,
            timestamp_ms: now_ms,
        });
    }

    match line.split_once(' ') {
        Some(("/mode", "guided")) => Some(EngineEvent::ModeSwitch { mode: Mode::Guided }),
        Some(("/mode", "freeform")) => Some(EngineEvent::ModeSwitch {
            mode: Mode::Freeform,
        }),
        Some(("/select", "current")) => Some(EngineEvent::Select {
            question_id: QuestionId::Current,
        }),
        Some(("/select", id)) => Some(EngineEvent::Select {
            question_id: QuestionId::history(id.trim()),
        }),
        _ if line == "/reset" => Some(EngineEvent::Reset),
        _ => {
            eprintln!("unrecognised input: {line}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Output consumer
// ---------------------------------------------------------------------------

/// Print engine outputs and wire dispatch requests to the answer generator.
///
/// Each dispatch runs on its own task; the completion re-enters the engine
/// queue as an ordinary event, tagged with the id the dispatch carried.
async fn consume_outputs(
    mut output_rx: mpsc::Receiver<EngineOutput>,
    event_tx: mpsc::Sender<EngineEvent>,
    generator: Option<Arc<dyn AnswerGenerator>>,
) {
    while let Some(output) = output_rx.recv().await {
        match output {
            EngineOutput::CurrentQuestionChanged { text, is_selected } => {
                let marker = if is_selected { "*" } else { " " };
                println!("[current]{marker} {text}");
            }
            EngineOutput::HistoryChanged {
                entries,
                selected_id,
            } => {
                println!("[history] {} entries", entries.len());
                for e in &entries {
                    let sel = if e.is_selected { "*" } else { " " };
                    let answered = if e.is_answered { " (answered)" } else { "" };
                    println!("  {sel} #{} turn {}: {}{answered}", e.id, e.turn_id, e.text);
                }
                log::debug!("selection: {selected_id:?}");
            }
            EngineOutput::DispatchRequested {
                question_id,
                text,
                turn_id,
            } => {
                println!("[dispatch] {question_id} (turn {turn_id}): {text}");
                let Some(generator) = generator.clone() else {
                    log::info!("answer generation disabled; dispatch printed only");
                    continue;
                };
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let event = match generator.generate(&text).await {
                        Ok(answer) => {
                            println!("[answer] {question_id}: {answer}");
                            EngineEvent::AnswerCompleted { question_id }
                        }
                        Err(e) => EngineEvent::AnswerFailed {
                            question_id,
                            reason: e.to_string(),
                        },
                    };
                    let _ = event_tx.send(event).await;
                });
            }
            EngineOutput::FlushNow { source } => {
                log::info!("[{}] flush requested", source.label());
            }
            EngineOutput::Status { message } => {
                println!("[status] {message}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main(worker_threads = 2)]
async fn main() {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Meeting Copilot starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Answer generator
    let generator: Option<Arc<dyn AnswerGenerator>> = if config.llm.enabled {
        Some(Arc::new(ApiAnswerGenerator::from_config(&config.llm)))
    } else {
        log::info!("answer generation disabled in config");
        None
    };

    // 4. Channel setup
    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(64);
    let (output_tx, output_rx) = mpsc::channel::<EngineOutput>(64);

    // 5. Engine task
    let clock = Arc::new(SystemClock);
    let engine = Engine::new(&config, Arc::clone(&clock) as Arc<dyn Clock>, output_tx);
    let engine_task = tokio::spawn(engine.run(event_rx));

    // 6. Output consumer
    let output_task = tokio::spawn(consume_outputs(output_rx, event_tx.clone(), generator));

    println!("mode: {} — type 'other: <text>' (append ~ for interim),", config.mode);
    println!("'you: <text>', /mode, /select, /reset, /quit");

    // 7. stdin loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("stdin read failed: {e}");
                break;
            }
        };
        if line.trim() == "/quit" {
            break;
        }
        if let Some(event) = parse_line(&line, clock.now_ms()) {
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
    }

    // The output consumer keeps an event sender for answer loopback, so the
    // event channel cannot drain naturally; abort both tasks on shutdown.
    drop(event_tx);
    output_task.abort();
    engine_task.abort();
    log::info!("Meeting Copilot shut down");
}
