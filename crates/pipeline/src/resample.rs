//! Linear-interpolation resampler
//!
//! Cheap and telephony-grade: no anti-aliasing, no attempt to preserve
//! content above the lower of the two Nyquist limits.

use std::borrow::Cow;

use crate::codec::samples;

/// Resample 16-bit little-endian PCM from `from_rate` to `to_rate`.
///
/// Equal rates return the input borrowed. Empty input gives empty output;
/// any non-empty input yields at least one sample.
pub fn resample(pcm: &[u8], from_rate: u32, to_rate: u32) -> Cow<'_, [u8]> {
    if from_rate == to_rate {
        return Cow::Borrowed(pcm);
    }

    let input: Vec<i16> = samples(pcm).collect();
    if input.is_empty() {
        return Cow::Owned(Vec::new());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let output_len = ((input.len() as f64 * ratio).floor() as usize).max(1);
    let last = input.len() - 1;
    let mut output = Vec::with_capacity(output_len * 2);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = (src_pos.floor() as usize).min(last);
        let next = (idx + 1).min(last);
        let frac = src_pos - idx as f64;

        let current = input[idx] as f64;
        let value = current + frac * (input[next] as f64 - current);
        // round half up, then keep within i16
        let sample = (value + 0.5)
            .floor()
            .clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        output.extend_from_slice(&sample.to_le_bytes());
    }

    Cow::Owned(output)
}
