/// Frequency band table
use serde::Serialize;

/// A named frequency range, low edge inclusive, high edge exclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyBand {
    /// Stable identifier used as the key in every report
    pub name: &'static str,

    /// Lower edge in Hz (inclusive)
    pub low_hz: f64,

    /// Upper edge in Hz (exclusive)
    pub high_hz: f64,
}

impl FrequencyBand {
    /// Create a new band
    pub const fn new(name: &'static str, low_hz: f64, high_hz: f64) -> Self {
        Self {
            name,
            low_hz,
            high_hz,
        }
    }

    /// Arithmetic centre of the band, used as the fallback bin target
    pub fn center_hz(&self) -> f64 {
        (self.low_hz + self.high_hz) / 2.0
    }

    /// Whether `freq` falls inside `[low_hz, high_hz)`
    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low_hz && freq < self.high_hz
    }

    /// Look up one of the standard bands by name
    pub fn by_name(name: &str) -> Option<&'static FrequencyBand> {
        FREQUENCY_BANDS.iter().find(|band| band.name == name)
    }
}

/// The five analysis bands, in report order.
///
/// Adjacent bands share an edge so the table partitions 20 Hz..20 kHz.
pub static FREQUENCY_BANDS: [FrequencyBand; 5] = [
    FrequencyBand::new("low", 20.0, 200.0),
    FrequencyBand::new("low_mid", 200.0, 500.0),
    FrequencyBand::new("mid", 500.0, 2000.0),
    FrequencyBand::new("high_mid", 2000.0, 6000.0),
    FrequencyBand::new("high", 6000.0, 20000.0),
];
