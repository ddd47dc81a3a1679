//! Property tests for buffer construction and record sanitizing

use mixcheck_core::{AudioBuffer, BandMetricRecord, FrequencyBand, FREQUENCY_BANDS};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn stereo_buffer_length_matches_frames(
        samples in prop::collection::vec(-1.0f32..1.0, 2..2000)
    ) {
        let even = samples.len() - samples.len() % 2;
        let buffer = AudioBuffer::from_interleaved(&samples[..even], 2, 48_000).unwrap();
        prop_assert_eq!(buffer.len(), even / 2);
        prop_assert_eq!(buffer.stereo().unwrap().len(), even / 2);
        prop_assert!(buffer.validate().is_ok());
    }

    #[test]
    fn dc_removal_leaves_near_zero_mean(
        offset in 0.01f32..0.3,
        len in 1000usize..5000
    ) {
        let samples: Vec<f32> = (0..len)
            .map(|i| offset + 0.1 * (i as f32 * 0.37).sin())
            .collect();
        let buffer = AudioBuffer::new(samples, 44_100);
        prop_assert!(buffer.flags().dc_offset.is_some());
        let mean = buffer.samples().iter().map(|&s| f64::from(s)).sum::<f64>() / len as f64;
        prop_assert!(mean.abs() < 1e-3);
    }

    #[test]
    fn sanitized_records_are_finite(
        values in prop::collection::vec(
            prop_oneof![
                Just(f64::NAN),
                Just(f64::INFINITY),
                Just(f64::NEG_INFINITY),
                -200.0f64..200.0
            ],
            19
        )
    ) {
        let mut record = BandMetricRecord::for_band(&FREQUENCY_BANDS[0]);
        record.band_rms_dbfs = Some(values[0]);
        record.spectral_centroid_hz = Some(values[6]);
        record.phase_correlation = Some(values[11]);
        record.attack_time_ms = Some(values[18]);
        let record = record.sanitized();
        for (_, value) in record.metrics() {
            if let Some(v) = value {
                prop_assert!(v.is_finite());
            }
        }
    }
}

#[test]
fn every_band_is_reachable_by_name() {
    for band in &FREQUENCY_BANDS {
        assert_eq!(FrequencyBand::by_name(band.name), Some(band));
    }
}
