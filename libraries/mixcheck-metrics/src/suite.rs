//! Evaluates all band metrics with per-metric failure isolation

use crate::context::BandContext;
use crate::dynamics::{crest_factor_db, dynamic_range_db, rms_db};
use crate::harmonics::{harmonic_ratio, inharmonicity, thd_percent};
use crate::level::{band_level_range_db, band_rms_dbfs, band_true_peak_dbfs};
use crate::signal::is_silent;
use crate::spectral::{energy_db_from_energy, ROLLOFF_PERCENT};
use crate::stereo::{mid_energy_db, phase_correlation, side_energy_db, stereo_width_percent};
use crate::transients::{attack_time_ms, transient_preservation};
use mixcheck_core::BandMetricRecord;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A metric that failed and was recorded as `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricFailure {
    pub band: String,
    pub metric: &'static str,
    pub message: String,
}

impl fmt::Display for MetricFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.band, self.metric, self.message)
    }
}

/// Run one metric, converting a panic into a [`MetricFailure`]
pub fn run_isolated<F>(band: &str, metric: &'static str, compute: F) -> Result<Option<f64>, MetricFailure>
where
    F: FnOnce() -> Option<f64>,
{
    catch_unwind(AssertUnwindSafe(compute)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "metric panicked".to_string());
        tracing::error!(band, metric, error = %message, "Metric failed, recording as missing");
        MetricFailure {
            band: band.to_string(),
            metric,
            message,
        }
    })
}

/// Collects isolated metric results for one band
struct Collector<'a> {
    band: &'a str,
    failures: Vec<MetricFailure>,
}

impl Collector<'_> {
    fn eval(&mut self, metric: &'static str, compute: impl FnOnce() -> Option<f64>) -> Option<f64> {
        match run_isolated(self.band, metric, compute) {
            Ok(value) => value,
            Err(failure) => {
                self.failures.push(failure);
                None
            }
        }
    }
}

/// Compute the 19 metrics of one band
///
/// Stereo metrics are `None` for mono contexts. A metric that fails is
/// recorded as `None` and reported in the returned failures; the other
/// metrics are unaffected. Non-finite values are mapped to `None`.
pub fn compute_band_metrics(ctx: &BandContext) -> (BandMetricRecord, Vec<MetricFailure>) {
    let band = ctx.band();
    let samples = ctx.samples();
    let sr = ctx.sample_rate();
    let silent = is_silent(samples);
    let stereo = ctx.stereo();

    let mut c = Collector {
        band: band.name,
        failures: Vec::new(),
    };

    let record = BandMetricRecord {
        band_rms_dbfs: c.eval("band_rms_dbfs", || Some(band_rms_dbfs(samples))),
        band_true_peak_dbfs: c.eval("band_true_peak_dbfs", || Some(band_true_peak_dbfs(samples))),
        band_level_range_db: c.eval("band_level_range_db", || {
            Some(band_level_range_db(samples, sr))
        }),

        dynamic_range_db: c.eval("dynamic_range_db", || Some(dynamic_range_db(samples))),
        crest_factor_db: c.eval("crest_factor_db", || Some(crest_factor_db(samples))),
        rms_db: c.eval("rms_db", || Some(rms_db(samples))),

        spectral_centroid_hz: c.eval("spectral_centroid_hz", || {
            Some(if silent { 0.0 } else { ctx.feature_spectrum().centroid_hz() })
        }),
        spectral_rolloff_hz: c.eval("spectral_rolloff_hz", || {
            Some(if silent {
                0.0
            } else {
                ctx.feature_spectrum().rolloff_hz(ROLLOFF_PERCENT)
            })
        }),
        spectral_flatness: c.eval("spectral_flatness", || {
            Some(if silent { 0.0 } else { ctx.feature_spectrum().flatness() })
        }),
        energy_db: c.eval("energy_db", || {
            Some(energy_db_from_energy(ctx.energy(), ctx.num_frames()))
        }),

        stereo_width_percent: c.eval("stereo_width_percent", || {
            stereo.and_then(|(l, r)| stereo_width_percent(l, r))
        }),
        phase_correlation: c.eval("phase_correlation", || {
            stereo.and_then(|(l, r)| phase_correlation(l, r))
        }),
        mid_energy_db: c.eval("mid_energy_db", || stereo.and_then(|(l, r)| mid_energy_db(l, r))),
        side_energy_db: c.eval("side_energy_db", || stereo.and_then(|(l, r)| side_energy_db(l, r))),

        thd_percent: c.eval("thd_percent", || Some(thd_percent(samples, ctx.separation()))),
        harmonic_ratio: c.eval("harmonic_ratio", || {
            Some(harmonic_ratio(samples, ctx.separation()))
        }),
        inharmonicity: c.eval("inharmonicity", || Some(inharmonicity(samples, sr))),

        transient_preservation: c.eval("transient_preservation", || {
            Some(transient_preservation(samples, ctx.separation()))
        }),
        attack_time_ms: c.eval("attack_time_ms", || Some(attack_time_ms(samples, sr))),

        ..BandMetricRecord::for_band(band)
    };

    tracing::debug!(
        band = band.name,
        failures = c.failures.len(),
        "Band metrics computed"
    );

    (record.sanitized(), c.failures)
}
