/// Core domain types for mixcheck
pub mod audio;
pub mod band;
pub mod records;
pub mod warning;

pub use audio::{
    AudioBuffer, EdgeCaseFlags, CLIPPING_THRESHOLD_DBFS, DC_OFFSET_THRESHOLD, SILENCE_RMS_LINEAR,
    SUPPORTED_SAMPLE_RATES,
};
pub use band::{FrequencyBand, FREQUENCY_BANDS};
pub use records::{round_metric, BandMetricRecord, OverallLoudnessRecord, BAND_METRIC_NAMES};
pub use warning::AnalysisWarning;
