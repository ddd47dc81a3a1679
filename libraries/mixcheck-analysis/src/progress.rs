//! Per-band progress notification

use mixcheck_core::BandMetricRecord;

/// Receives one notification per completed band, in band order
///
/// Purely observational: nothing returned from a sink affects the analysis.
pub trait ProgressSink: Sync {
    fn band_completed(&self, band_name: &str, record: &BandMetricRecord);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, &BandMetricRecord) + Sync,
{
    fn band_completed(&self, band_name: &str, record: &BandMetricRecord) {
        self(band_name, record)
    }
}
