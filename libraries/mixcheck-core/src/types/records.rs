/// Per-band and overall result records
use crate::types::band::FrequencyBand;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the per-band metrics, in record field order
pub const BAND_METRIC_NAMES: [&str; 19] = [
    "band_rms_dbfs",
    "band_true_peak_dbfs",
    "band_level_range_db",
    "dynamic_range_db",
    "crest_factor_db",
    "rms_db",
    "spectral_centroid_hz",
    "spectral_rolloff_hz",
    "spectral_flatness",
    "energy_db",
    "stereo_width_percent",
    "phase_correlation",
    "mid_energy_db",
    "side_energy_db",
    "thd_percent",
    "harmonic_ratio",
    "inharmonicity",
    "transient_preservation",
    "attack_time_ms",
];

/// All measurements for one frequency band
///
/// Every metric is optional: `None` means undefined for this input (stereo
/// metrics on a mono source), or that the metric failed and was isolated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandMetricRecord {
    /// Band identifier (`low`, `low_mid`, `mid`, `high_mid`, `high`)
    pub band_name: String,
    /// Lower band edge in Hz
    pub freq_min_hz: f64,
    /// Upper band edge in Hz
    pub freq_max_hz: f64,

    // Level
    pub band_rms_dbfs: Option<f64>,
    pub band_true_peak_dbfs: Option<f64>,
    pub band_level_range_db: Option<f64>,

    // Dynamics
    pub dynamic_range_db: Option<f64>,
    pub crest_factor_db: Option<f64>,
    pub rms_db: Option<f64>,

    // Spectral
    pub spectral_centroid_hz: Option<f64>,
    pub spectral_rolloff_hz: Option<f64>,
    pub spectral_flatness: Option<f64>,
    pub energy_db: Option<f64>,

    // Stereo
    pub stereo_width_percent: Option<f64>,
    pub phase_correlation: Option<f64>,
    pub mid_energy_db: Option<f64>,
    pub side_energy_db: Option<f64>,

    // Harmonic
    pub thd_percent: Option<f64>,
    pub harmonic_ratio: Option<f64>,
    pub inharmonicity: Option<f64>,

    // Transient
    pub transient_preservation: Option<f64>,
    pub attack_time_ms: Option<f64>,
}

impl BandMetricRecord {
    /// Create a record with every metric unset
    pub fn for_band(band: &FrequencyBand) -> Self {
        Self {
            band_name: band.name.to_string(),
            freq_min_hz: band.low_hz,
            freq_max_hz: band.high_hz,
            ..Self::default()
        }
    }

    /// Metric values paired with their names, in `BAND_METRIC_NAMES` order
    pub fn metrics(&self) -> [(&'static str, Option<f64>); 19] {
        let values = [
            self.band_rms_dbfs,
            self.band_true_peak_dbfs,
            self.band_level_range_db,
            self.dynamic_range_db,
            self.crest_factor_db,
            self.rms_db,
            self.spectral_centroid_hz,
            self.spectral_rolloff_hz,
            self.spectral_flatness,
            self.energy_db,
            self.stereo_width_percent,
            self.phase_correlation,
            self.mid_energy_db,
            self.side_energy_db,
            self.thd_percent,
            self.harmonic_ratio,
            self.inharmonicity,
            self.transient_preservation,
            self.attack_time_ms,
        ];
        let mut out = [("", None); 19];
        for (slot, (name, value)) in out.iter_mut().zip(BAND_METRIC_NAMES.iter().zip(values)) {
            *slot = (*name, value);
        }
        out
    }

    /// Look up a metric by name
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics()
            .into_iter()
            .find(|(metric, _)| *metric == name)
            .and_then(|(_, value)| value)
    }

    /// Replace every non-finite value with `None`
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        for field in [
            &mut self.band_rms_dbfs,
            &mut self.band_true_peak_dbfs,
            &mut self.band_level_range_db,
            &mut self.dynamic_range_db,
            &mut self.crest_factor_db,
            &mut self.rms_db,
            &mut self.spectral_centroid_hz,
            &mut self.spectral_rolloff_hz,
            &mut self.spectral_flatness,
            &mut self.energy_db,
            &mut self.stereo_width_percent,
            &mut self.phase_correlation,
            &mut self.mid_energy_db,
            &mut self.side_energy_db,
            &mut self.thd_percent,
            &mut self.harmonic_ratio,
            &mut self.inharmonicity,
            &mut self.transient_preservation,
            &mut self.attack_time_ms,
        ] {
            *field = field.filter(|v| v.is_finite());
        }
        self
    }
}

/// Round to two decimal places, mapping non-finite values to `None`
pub fn round_metric(value: f64) -> Option<f64> {
    value.is_finite().then(|| (value * 100.0).round() / 100.0)
}

/// Overall loudness of the full signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallLoudnessRecord {
    /// Gated integrated loudness in LUFS; `None` if no block survived gating
    pub integrated_lufs: Option<f64>,

    /// Loudness range in LU; `None` when integrated loudness is undefined
    pub loudness_range_lu: Option<f64>,

    /// Maximum inter-sample peak in dBFS (dBTP)
    pub true_peak_dbfs: Option<f64>,
}

impl OverallLoudnessRecord {
    /// Build a record from raw measurements, rounding each to two decimals
    pub fn from_measurements(
        integrated_lufs: Option<f64>,
        loudness_range_lu: Option<f64>,
        true_peak_dbfs: Option<f64>,
    ) -> Self {
        Self {
            integrated_lufs: integrated_lufs.and_then(round_metric),
            loudness_range_lu: loudness_range_lu.and_then(round_metric),
            true_peak_dbfs: true_peak_dbfs.and_then(round_metric),
        }
    }
}

impl fmt::Display for OverallLoudnessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(value: Option<f64>) -> String {
            value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
        }
        write!(
            f,
            "Integrated: {} LUFS, Range: {} LU, True Peak: {} dBTP",
            show(self.integrated_lufs),
            show(self.loudness_range_lu),
            show(self.true_peak_dbfs)
        )
    }
}
