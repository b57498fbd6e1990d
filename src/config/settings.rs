//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::modes::Mode;

use super::AppPaths;

// ---------------------------------------------------------------------------
// VadConfig
// ---------------------------------------------------------------------------

/// Settings for per-frame voice-activity detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    /// Sample rate of incoming PCM frames in Hz.
    pub sample_rate: u32,
    /// Sub-frame length in milliseconds for the energy scan.
    pub frame_ms: u64,
    /// RMS energy threshold for the PCM path (raw 16-bit sample units).
    pub energy_threshold: f32,
    /// Volume-percent threshold (0–100) for the sliding-window fallback.
    pub volume_threshold: f32,
    /// Number of volume samples in the sliding window.
    pub window_size: usize,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frame_ms: 30,
            energy_threshold: 500.0,
            volume_threshold: 20.0,
            window_size: 6,
        }
    }
}

// ---------------------------------------------------------------------------
// SilenceConfig
// ---------------------------------------------------------------------------

/// Debounce timeouts for the silence detector, per audio source.
///
/// Remote (meeting) speech carries more natural pause variance than the
/// local microphone, so its timeout is longer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilenceConfig {
    /// Silence timeout for the local microphone stream, in milliseconds.
    pub local_timeout_ms: u64,
    /// Silence timeout for the remote meeting-audio stream, in milliseconds.
    pub remote_timeout_ms: u64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            local_timeout_ms: 500,
            remote_timeout_ms: 700,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the answer-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether answer generation is active at all.
    pub enabled: bool,
    /// Base URL of the API endpoint.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"qwen2.5:3b"`, `"gpt-4o-mini"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for a response before timing out.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:3b".into(),
            temperature: 0.3,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use meeting_copilot::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Mode the engine starts in.
    pub mode: Mode,
    /// Voice-activity detection settings.
    pub vad: VadConfig,
    /// Per-source silence debounce timeouts.
    pub silence: SilenceConfig,
    /// Answer-generation settings.
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Guided,
            vad: VadConfig::default(),
            silence: SilenceConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
