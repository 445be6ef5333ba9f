//! WAV fallback decoder (spec.md §6): handles 8/16/24/32-bit PCM and
//! 32-bit float, mono/stereo downmix, 8-192 kHz; validates RIFF/WAVE
//! headers via `hound`.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};

use crate::error::{BeatParserError, FormatError, Result};

/// Decoded, downmixed-to-mono PCM audio.
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

pub fn decode(bytes: &[u8]) -> Result<DecodedAudio> {
    let cursor = Cursor::new(bytes);
    let mut reader = WavReader::new(cursor).map_err(|_| {
        BeatParserError::Format(FormatError::BadHeader)
    })?;

    let spec = reader.spec();
    if !(8..=192_000).contains(&spec.sample_rate) {
        return Err(BeatParserError::Format(FormatError::UnsupportedSampleRate {
            rate: spec.sample_rate,
        }));
    }
    if spec.channels == 0 || spec.channels > 2 {
        return Err(BeatParserError::Format(FormatError::UnsupportedChannelCount {
            channels: spec.channels,
        }));
    }

    let mono = match spec.sample_format {
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(BeatParserError::Format(FormatError::UnsupportedBitDepth {
                    bits: spec.bits_per_sample,
                }));
            }
            let samples: Vec<f32> = reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| BeatParserError::Format(FormatError::BadHeader))?;
            downmix(&samples, spec.channels)
        }
        SampleFormat::Int => {
            let scale = match spec.bits_per_sample {
                8 => i8::MAX as f32,
                16 => i16::MAX as f32,
                24 => (1i32 << 23) as f32,
                32 => i32::MAX as f32,
                bits => {
                    return Err(BeatParserError::Format(FormatError::UnsupportedBitDepth {
                        bits,
                    }))
                }
            };
            let samples: Vec<f32> = reader
                .samples::<i32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| BeatParserError::Format(FormatError::BadHeader))?
                .into_iter()
                .map(|s| s as f32 / scale)
                .collect();
            downmix(&samples, spec.channels)
        }
    };

    Ok(DecodedAudio {
        samples: mono,
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved stereo channels down to mono; passthrough if mono.
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
