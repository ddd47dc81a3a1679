/// WAV loading and golden-corpus writing with hound
use mixcheck_core::{AudioBuffer, MixcheckError, Result, SUPPORTED_SAMPLE_RATES};
use mixcheck_loudness::GoldenVector;
use std::path::Path;

/// Bit depth of generated corpus files
pub const CORPUS_BITS_PER_SAMPLE: u16 = 24;

/// Read a 16/24-bit PCM or 32-bit float WAV with one or two channels
pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = hound::WavReader::open(path).map_err(|e| wav_error(path, &e))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels);

    if !(1..=2).contains(&channels) {
        return Err(MixcheckError::UnsupportedChannelCount(channels));
    }
    if !SUPPORTED_SAMPLE_RATES.contains(&spec.sample_rate) {
        return Err(MixcheckError::UnsupportedSampleRate(spec.sample_rate));
    }

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| wav_error(path, &e))?,
        (hound::SampleFormat::Int, bits @ (16 | 24)) => {
            let max_val = (1i32 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| wav_error(path, &e))?
        }
        (format, bits) => {
            return Err(MixcheckError::invalid_input(format!(
                "{}: unsupported sample format {:?} at {} bits",
                path.display(),
                format,
                bits
            )))
        }
    };

    tracing::debug!(
        path = %path.display(),
        channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = samples.len() / channels,
        "Loaded WAV"
    );
    AudioBuffer::from_interleaved(&samples, channels, spec.sample_rate)
}

/// Write a golden vector as 24-bit PCM
pub fn write_vector(path: &Path, vector: &GoldenVector) -> Result<()> {
    let spec = hound::WavSpec {
        channels: vector.channels as u16,
        sample_rate: vector.sample_rate,
        bits_per_sample: CORPUS_BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };
    let full_scale = ((1i32 << (CORPUS_BITS_PER_SAMPLE - 1)) - 1) as f32;

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| wav_error(path, &e))?;
    for sample in vector.render_interleaved() {
        let quantised = (sample.clamp(-1.0, 1.0) * full_scale).round() as i32;
        writer.write_sample(quantised).map_err(|e| wav_error(path, &e))?;
    }
    writer.finalize().map_err(|e| wav_error(path, &e))
}

fn wav_error(path: &Path, err: &hound::Error) -> MixcheckError {
    match err {
        hound::Error::IoError(io) => MixcheckError::Io(std::io::Error::new(
            io.kind(),
            format!("{}: {}", path.display(), io),
        )),
        other => MixcheckError::invalid_input(format!("{}: {}", path.display(), other)),
    }
}
