//! Per-tick speech/silence classification.
//!
//! Two decision paths, interchangeable without changing any downstream
//! contract — the detector returns one boolean per tick, nothing else:
//!
//! 1. **Energy scan** — when a raw PCM16 frame is supplied, it is split into
//!    ~30 ms sub-frames and each sub-frame's RMS energy is compared against a
//!    threshold.  A hot sub-frame asserts speech immediately.  A scan that
//!    finds nothing is treated as *inconclusive*, not as silence.
//! 2. **Sliding-window fallback** — the last N volume percentages are
//!    averaged and compared against a percentage threshold.  Smooths
//!    single-frame noise spikes.
//!
//! The fallback decides whenever the energy scan is unavailable or
//! inconclusive.

use std::collections::VecDeque;

use crate::config::VadConfig;

// ---------------------------------------------------------------------------
// VadDetector
// ---------------------------------------------------------------------------

/// Speech/silence classifier for one audio source.
///
/// Holds the sliding volume window, so each source needs its own instance.
///
/// # Example
///
/// ```rust
/// use meeting_copilot::config::VadConfig;
/// use meeting_copilot::vad::VadDetector;
///
/// let mut vad = VadDetector::new(&VadConfig::default());
///
/// // Loud PCM frame: energy path asserts speech.
/// let loud = vec![8_000_i16; 480];
/// assert!(vad.classify(Some(&loud), 5.0));
///
/// // No PCM, quiet volume: fallback says silence.
/// assert!(!vad.classify(None, 1.0));
/// ```
pub struct VadDetector {
    sub_frame_samples: usize,
    energy_threshold: f32,
    volume_threshold: f32,
    window_size: usize,
    window: VecDeque<f32>,
}

impl VadDetector {
    /// Build a detector from config.
    pub fn new(config: &VadConfig) -> Self {
        let sub_frame_samples =
            (config.sample_rate as u64 * config.frame_ms / 1_000).max(1) as usize;
        Self {
            sub_frame_samples,
            energy_threshold: config.energy_threshold,
            volume_threshold: config.volume_threshold,
            window_size: config.window_size.max(1),
            window: VecDeque::new(),
        }
    }

    /// Classify one tick as speech (`true`) or silence (`false`).
    ///
    /// `pcm` is the raw frame when the audio collaborator provides one;
    /// `volume_percent` (0–100) is always present.  The volume sample is
    /// pushed into the sliding window on every call so the fallback stays
    /// warm even while the energy path is deciding.
    pub fn classify(&mut self, pcm: Option<&[i16]>, volume_percent: f32) -> bool {
        self.push_volume(volume_percent);

        match self.energy_scan(pcm) {
            Some(true) => true,
            // A quiet scan is inconclusive: a soft speaker can sit under the
            // energy threshold while still moving the volume average.
            _ => self.window_average() > self.volume_threshold,
        }
    }

    /// Scan `pcm` sub-frame by sub-frame.  Returns `Some(true)` on the first
    /// hot sub-frame, `None` when the frame is absent, too short, or fully
    /// quiet.
    fn energy_scan(&self, pcm: Option<&[i16]>) -> Option<bool> {
        let pcm = pcm?;
        if pcm.len() < self.sub_frame_samples {
            return None;
        }

        for chunk in pcm.chunks(self.sub_frame_samples) {
            if chunk.len() < self.sub_frame_samples {
                break;
            }
            if rms_energy(chunk) > self.energy_threshold {
                return Some(true);
            }
        }
        None
    }

    fn push_volume(&mut self, percent: f32) {
        self.window.push_back(percent);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }
    }

    fn window_average(&self) -> f32 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f32>() / self.window.len() as f32
    }

    /// Drop all accumulated window samples (stream stop/start).
    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// RMS energy of a PCM16 chunk, in raw sample units.
fn rms_energy(chunk: &[i16]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / chunk.len() as f64).sqrt() as f32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> VadDetector {
        VadDetector::new(&VadConfig::default())
    }

    // ---- Energy path -------------------------------------------------------

    #[test]
    fn loud_pcm_frame_is_speech() {
        let mut vad = detector();
        let loud = vec![8_000_i16; 480];
        assert!(vad.classify(Some(&loud), 0.0));
    }

    #[test]
    fn speech_in_any_sub_frame_is_enough() {
        let mut vad = detector();
        // Two quiet sub-frames, then one loud one.
        let mut pcm = vec![0_i16; 960];
        pcm.extend(vec![8_000_i16; 480]);
        assert!(vad.classify(Some(&pcm), 0.0));
    }

    #[test]
    fn quiet_pcm_defers_to_volume_window() {
        let mut vad = detector();
        let quiet = vec![0_i16; 480];

        // Volume average stays below threshold → silence.
        assert!(!vad.classify(Some(&quiet), 5.0));

        // Volume average climbs above threshold → speech, even though the
        // energy scan found nothing.
        for _ in 0..6 {
            vad.classify(Some(&quiet), 90.0);
        }
        assert!(vad.classify(Some(&quiet), 90.0));
    }

    #[test]
    fn short_frame_is_inconclusive() {
        let mut vad = detector();
        // 100 samples < one 30 ms sub-frame (480 @ 16 kHz) — loud but ignored.
        let short = vec![20_000_i16; 100];
        assert!(!vad.classify(Some(&short), 0.0));
    }

    // ---- Fallback path -----------------------------------------------------

    #[test]
    fn no_pcm_uses_volume_average() {
        let mut vad = detector();
        assert!(!vad.classify(None, 10.0));
        assert!(vad.classify(None, 90.0)); // avg (10+90)/2 = 50 > 20
    }

    #[test]
    fn window_smooths_single_spike() {
        let mut vad = detector();
        // Fill the window with silence first.
        for _ in 0..6 {
            vad.classify(None, 0.0);
        }
        // One spike of 100 %: average = 100/6 ≈ 16.7 < 20 → still silence.
        assert!(!vad.classify(None, 100.0));
    }

    #[test]
    fn window_is_bounded() {
        let mut vad = detector();
        // 20 loud samples, then 6 silent ones: only the last 6 count.
        for _ in 0..20 {
            vad.classify(None, 100.0);
        }
        for _ in 0..5 {
            vad.classify(None, 0.0);
        }
        assert!(!vad.classify(None, 0.0));
    }

    #[test]
    fn reset_clears_window() {
        let mut vad = detector();
        for _ in 0..6 {
            vad.classify(None, 100.0);
        }
        vad.reset();
        assert!(!vad.classify(None, 0.0));
    }

    // ---- rms_energy --------------------------------------------------------

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms_energy(&[0; 480]), 0.0);
    }

    #[test]
    fn rms_of_constant_signal() {
        let energy = rms_energy(&[1_000; 480]);
        assert!((energy - 1_000.0).abs() < 1.0);
    }

    #[test]
    fn rms_of_empty_is_zero() {
        assert_eq!(rms_energy(&[]), 0.0);
    }
}
