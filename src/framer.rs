//! Slices mono samples into overlapping frames (spec.md §4.2).

use crate::error::{AudioError, BeatParserError, Result};
use crate::types::AudioFrame;

/// Split `samples` into frames of `frame_size`, advancing by `hop_size`
/// each step. When `pad_last` is set, a final partial frame is zero-padded
/// to `frame_size` rather than dropped.
pub fn frame(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    pad_last: bool,
) -> Result<Vec<AudioFrame>> {
    if frame_size == 0 || hop_size == 0 {
        return Err(BeatParserError::Audio(AudioError::InvalidParameters {
            details: "frame_size and hop_size must be positive".into(),
        }));
    }
    if frame_size > samples.len() && !pad_last {
        return Err(BeatParserError::Audio(AudioError::TooShort {
            len: samples.len(),
            frame_size,
        }));
    }

    let mut frames = Vec::new();
    let mut start = 0usize;

    if samples.is_empty() {
        return Ok(frames);
    }

    loop {
        if start + frame_size <= samples.len() {
            frames.push(AudioFrame {
                samples: samples[start..start + frame_size].to_vec(),
                start_sample: start,
            });
        } else if start < samples.len() && pad_last {
            let mut padded = vec![0.0f32; frame_size];
            padded[..samples.len() - start].copy_from_slice(&samples[start..]);
            frames.push(AudioFrame {
                samples: padded,
                start_sample: start,
            });
        } else {
            break;
        }

        if start + frame_size >= samples.len() {
            break;
        }
        start += hop_size;
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_matches_formula() {
        let samples = vec![0.0f32; 4096];
        let frames = frame(&samples, 1024, 512, false).unwrap();
        let expected = (4096 - 1024) / 512 + 1;
        assert_eq!(frames.len(), expected);
    }

    #[test]
    fn frame_start_offsets_increase_by_hop() {
        let samples = vec![0.0f32; 4096];
        let frames = frame(&samples, 1024, 512, false).unwrap();
        for pair in frames.windows(2) {
            assert_eq!(pair[1].start_sample - pair[0].start_sample, 512);
        }
    }

    #[test]
    fn pad_last_zero_pads_partial_tail() {
        let samples = vec![1.0f32; 1500];
        let frames = frame(&samples, 1024, 512, true).unwrap();
        let last = frames.last().unwrap();
        assert_eq!(last.samples.len(), 1024);
        assert!(last.samples.iter().rev().take(10).any(|&s| s == 0.0));
    }

    #[test]
    fn frame_larger_than_input_fails_without_padding() {
        let samples = vec![0.0f32; 100];
        assert!(frame(&samples, 1024, 512, false).is_err());
    }

    #[test]
    fn zero_hop_or_frame_size_fails() {
        let samples = vec![0.0f32; 4096];
        assert!(frame(&samples, 0, 512, false).is_err());
        assert!(frame(&samples, 1024, 0, false).is_err());
    }

    #[test]
    fn empty_input_yields_no_frames() {
        let frames = frame(&[], 1024, 512, false).unwrap();
        assert!(frames.is_empty());
    }
}
