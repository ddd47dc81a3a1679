//! Synthetic golden corpus with analytically known loudness
//!
//! Every vector is built from 997 Hz tone segments (the BS.1770 test
//! frequency, where K-weighting adds +0.691 dB and cancels the loudness
//! offset). A full-scale tone in one channel therefore reads -3.01 LUFS,
//! and the same tone in both stereo channels reads 0 LUFS. Segment edges
//! fall on whole seconds, where the tone crosses zero.

use crate::validator::ExpectedLoudness;
use mixcheck_core::AudioBuffer;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Test frequency for all tone segments
pub const TEST_TONE_HZ: f64 = 997.0;

/// Loudness of a full-scale 997 Hz tone in a single channel
const MONO_FULL_SCALE_LUFS: f64 = -3.01;

/// A constant-amplitude stretch of the test tone (amplitude 0 is silence)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSegment {
    pub secs: f64,
    pub amplitude: f64,
}

impl ToneSegment {
    pub const fn new(secs: f64, amplitude: f64) -> Self {
        Self { secs, amplitude }
    }

    pub const fn silence(secs: f64) -> Self {
        Self::new(secs, 0.0)
    }

    /// Tone calibrated to `lufs` for the given channel count
    pub fn at_lufs(secs: f64, lufs: f64, channels: usize) -> Self {
        Self::new(secs, amplitude_for_lufs(lufs, channels))
    }
}

/// Peak amplitude of a 997 Hz tone that reads `lufs` when identical in
/// every one of `channels` channels
pub fn amplitude_for_lufs(lufs: f64, channels: usize) -> f64 {
    let channel_gain_db = 10.0 * (channels.max(1) as f64).log10();
    10f64.powf((lufs - MONO_FULL_SCALE_LUFS - channel_gain_db) / 20.0)
}

/// One reference signal and the values a compliant meter must report
#[derive(Debug, Clone, PartialEq)]
pub struct GoldenVector {
    /// WAV file name in the corpus directory
    pub name: &'static str,
    pub sample_rate: u32,
    pub channels: usize,
    pub segments: Vec<ToneSegment>,
    pub expected: ExpectedLoudness,
}

impl GoldenVector {
    /// Total length in frames
    pub fn num_frames(&self) -> usize {
        self.segments
            .iter()
            .map(|s| (s.secs * f64::from(self.sample_rate)).round() as usize)
            .sum()
    }

    /// Render one channel; all channels carry the same signal
    pub fn render_channel(&self) -> Vec<f32> {
        let rate = f64::from(self.sample_rate);
        let mut out = Vec::with_capacity(self.num_frames());
        for segment in &self.segments {
            let frames = (segment.secs * rate).round() as usize;
            let start = out.len();
            // Phase runs on the global clock so segments join without steps
            out.extend((start..start + frames).map(|i| {
                (segment.amplitude * (2.0 * PI * TEST_TONE_HZ * i as f64 / rate).sin()) as f32
            }));
        }
        out
    }

    /// Interleaved samples, as written to disk
    pub fn render_interleaved(&self) -> Vec<f32> {
        let mono = self.render_channel();
        if self.channels == 1 {
            return mono;
        }
        mono.iter()
            .flat_map(|&s| std::iter::repeat(s).take(self.channels))
            .collect()
    }

    /// The vector as an analysis buffer
    pub fn to_buffer(&self) -> AudioBuffer {
        let mono = self.render_channel();
        if self.channels == 2 {
            AudioBuffer::from_stereo(mono.iter().map(|&s| [s, s]).collect(), self.sample_rate)
        } else {
            AudioBuffer::new(mono, self.sample_rate)
        }
    }
}

fn expected(lufs: Option<f64>, lra: Option<f64>, true_peak: f64) -> ExpectedLoudness {
    ExpectedLoudness {
        integrated_lufs: lufs,
        loudness_range_lu: lra,
        true_peak_dbfs: Some(true_peak),
    }
}

fn peak_db(amplitude: f64) -> f64 {
    (20.0 * amplitude.log10() * 100.0).round() / 100.0
}

/// The reference vectors, including absolute- and relative-gating cases
pub fn golden_corpus() -> Vec<GoldenVector> {
    let mono_23 = amplitude_for_lufs(-23.0, 1);
    let stereo_23 = amplitude_for_lufs(-23.0, 2);
    let stereo_33 = amplitude_for_lufs(-33.0, 2);
    let stereo_20 = amplitude_for_lufs(-20.0, 2);
    let stereo_30 = amplitude_for_lufs(-30.0, 2);
    let stereo_40 = amplitude_for_lufs(-40.0, 2);

    let mut lra_segments = Vec::new();
    for _ in 0..6 {
        lra_segments.push(ToneSegment::new(5.0, stereo_20));
        lra_segments.push(ToneSegment::new(5.0, stereo_30));
    }

    vec![
        GoldenVector {
            name: "sine_997hz_0dbfs_mono.wav",
            sample_rate: 48_000,
            channels: 1,
            segments: vec![ToneSegment::new(5.0, 1.0)],
            expected: expected(Some(-3.01), Some(0.0), 0.0),
        },
        GoldenVector {
            name: "sine_997hz_0dbfs_stereo.wav",
            sample_rate: 48_000,
            channels: 2,
            segments: vec![ToneSegment::new(5.0, 1.0)],
            expected: expected(Some(0.0), Some(0.0), 0.0),
        },
        GoldenVector {
            name: "sine_997hz_-20dbfs_mono.wav",
            sample_rate: 48_000,
            channels: 1,
            segments: vec![ToneSegment::new(5.0, 0.1)],
            expected: expected(Some(-23.01), Some(0.0), -20.0),
        },
        GoldenVector {
            name: "ebu_r128_stereo_997hz_23lufs.wav",
            sample_rate: 48_000,
            channels: 2,
            segments: vec![ToneSegment::new(20.0, stereo_23)],
            expected: expected(Some(-23.0), Some(0.0), peak_db(stereo_23)),
        },
        GoldenVector {
            name: "ebu_r128_stereo_997hz_33lufs.wav",
            sample_rate: 48_000,
            channels: 2,
            segments: vec![ToneSegment::new(20.0, stereo_33)],
            expected: expected(Some(-33.0), Some(0.0), peak_db(stereo_33)),
        },
        GoldenVector {
            name: "ebu_r128_mono_997hz_23lufs.wav",
            sample_rate: 48_000,
            channels: 1,
            segments: vec![ToneSegment::new(20.0, mono_23)],
            expected: expected(Some(-23.0), Some(0.0), peak_db(mono_23)),
        },
        GoldenVector {
            name: "ebu_r128_mono_997hz_23lufs_44k1.wav",
            sample_rate: 44_100,
            channels: 1,
            segments: vec![ToneSegment::new(20.0, mono_23)],
            expected: expected(Some(-23.0), Some(0.0), peak_db(mono_23)),
        },
        GoldenVector {
            name: "silence.wav",
            sample_rate: 48_000,
            channels: 1,
            segments: vec![ToneSegment::silence(2.0)],
            expected: expected(None, None, -120.0),
        },
        GoldenVector {
            // Silence sits below the -70 LUFS absolute gate
            name: "ebu_r128_gate_test.wav",
            sample_rate: 48_000,
            channels: 2,
            segments: vec![ToneSegment::silence(10.0), ToneSegment::new(40.0, stereo_23)],
            expected: expected(Some(-23.0), Some(0.0), peak_db(stereo_23)),
        },
        GoldenVector {
            // The -40 LUFS passage falls under the -10 LU relative gate but
            // stays inside the -20 LU loudness-range gate
            name: "ebu_r128_relative_gate_test.wav",
            sample_rate: 48_000,
            channels: 2,
            segments: vec![ToneSegment::new(20.0, stereo_40), ToneSegment::new(30.0, stereo_20)],
            expected: expected(Some(-20.0), Some(20.0), peak_db(stereo_20)),
        },
        GoldenVector {
            name: "ebu_r128_lra_test.wav",
            sample_rate: 48_000,
            channels: 2,
            segments: lra_segments,
            expected: expected(Some(-22.6), Some(10.0), peak_db(stereo_20)),
        },
    ]
}

/// Expected values keyed by file name, the shape of `expected_values.json`
pub fn expected_values(corpus: &[GoldenVector]) -> BTreeMap<String, ExpectedLoudness> {
    corpus
        .iter()
        .map(|v| (v.name.to_string(), v.expected))
        .collect()
}
