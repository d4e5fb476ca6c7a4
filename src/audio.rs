use anyhow::Result;
use log::debug;
use rubato::{Resampler, SincFixedIn, SincInterpolationType, WindowFunction};
use std::io::Cursor;

/// Interleaved samples as decoded from an uploaded WAV file.
pub struct DecodedWav {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

pub fn decode_wav(bytes: &[u8]) -> Result<DecodedWav, String> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| format!("Not a valid WAV file: {e}"))?;
    let spec = reader.spec();
    debug!(
        "Decoding WAV: {}Hz, {} channels, {}-bit {:?}",
        spec.sample_rate, spec.channels, spec.bits_per_sample, spec.sample_format
    );

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Failed to read float samples: {e}"))?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Failed to read 16-bit samples: {e}"))?,
        (hound::SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388607.0))
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Failed to read 24-bit samples: {e}"))?,
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Failed to read 32-bit samples: {e}"))?,
        (_, bits) => return Err(format!("Unsupported WAV bit depth: {bits}")),
    };

    if samples.is_empty() {
        return Err("WAV file contains no audio data".to_string());
    }

    Ok(DecodedWav {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels.max(1) as usize,
    })
}

/// Averages interleaved frames down to a single channel.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

pub fn resample_to_16khz(audio_data: &[f32], sample_rate: u32, channels: usize) -> Result<Vec<f32>> {
    if sample_rate == 16000 {
        return Ok(audio_data.to_vec());
    }

    let frames = audio_data.len() / channels;
    if frames == 0 {
        return Err(anyhow::anyhow!("No audio frames to resample"));
    }

    let params = rubato::SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut input_channels = vec![Vec::with_capacity(frames); channels];
    for frame_idx in 0..frames {
        for ch in 0..channels {
            input_channels[ch].push(audio_data[frame_idx * channels + ch]);
        }
    }

    let resample_ratio = 16000.0 / sample_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(resample_ratio, 2.0, params, frames, channels)?;

    let resampled_channels = resampler.process(&input_channels, None)?;
    let delay = resampler.output_delay();
    let expected_output_frames = (frames as f64 * resample_ratio) as usize;

    let mut output = Vec::with_capacity(expected_output_frames * channels);
    let start_frame = delay;
    let end_frame = (delay + expected_output_frames).min(resampled_channels[0].len());

    for frame_idx in start_frame..end_frame {
        for ch in 0..channels {
            output.push(resampled_channels[ch][frame_idx]);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_fixture(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn mono_spec(sample_rate: u32) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn decodes_16_bit_mono() {
        let bytes = wav_fixture(mono_spec(16000), &[0, i16::MAX, i16::MIN / 2]);
        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded.sample_rate, 16000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), 3);
        assert!((decoded.samples[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_wav_bytes() {
        assert!(decode_wav(b"definitely not audio").is_err());
    }

    #[test]
    fn rejects_empty_wav() {
        let bytes = wav_fixture(mono_spec(16000), &[]);
        assert!(decode_wav(&bytes).is_err());
    }

    #[test]
    fn downmix_averages_stereo_frames() {
        let samples = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&samples, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn downmix_passes_mono_through() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples.to_vec());
    }

    #[test]
    fn resample_at_16khz_is_identity() {
        let samples = vec![0.25_f32; 16000];
        let out = resample_to_16khz(&samples, 16000, 1).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn resample_halves_32khz_input() {
        let samples: Vec<f32> = (0..32000)
            .map(|i| (i as f32 * 0.01).sin() * 0.5)
            .collect();
        let out = resample_to_16khz(&samples, 32000, 1).unwrap();
        // Allow for resampler delay trimming at the edges.
        assert!((out.len() as i64 - 16000).unsigned_abs() < 400, "got {}", out.len());
    }

    #[test]
    fn resample_rejects_empty_input() {
        assert!(resample_to_16khz(&[], 44100, 1).is_err());
    }
}
