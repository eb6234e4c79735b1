//! G.711 mu-law codec
//!
//! Stateless conversion between 8-bit law bytes and 16-bit little-endian
//! linear PCM. Encoding is lossy: a round trip reproduces a sample only to
//! within the quantization step of its segment.

const BIAS: i32 = 0x84;
const CLIP: i32 = 32635;

/// Iterate the 16-bit little-endian samples of a PCM buffer.
///
/// A trailing odd byte is ignored.
pub fn samples(pcm: &[u8]) -> impl Iterator<Item = i16> + '_ {
    pcm.chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
}

/// Decode law bytes to linear PCM (two output bytes per input byte)
pub fn decode(law: &[u8]) -> Vec<u8> {
    law.iter()
        .flat_map(|&byte| decode_sample(byte).to_le_bytes())
        .collect()
}

/// Encode linear PCM to law bytes (one output byte per sample).
///
/// An odd-length input is rounded down: the final lone byte is dropped.
pub fn encode(pcm: &[u8]) -> Vec<u8> {
    samples(pcm).map(encode_sample).collect()
}

pub fn decode_sample(byte: u8) -> i16 {
    let value = !byte;
    let exponent = ((value >> 4) & 0x07) as i32;
    let mantissa = (value & 0x0f) as i32;
    let magnitude = ((mantissa << (exponent + 3)) + (BIAS << exponent)) - BIAS;

    if value & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

pub fn encode_sample(sample: i16) -> u8 {
    let sign: i32 = if sample < 0 { 0x80 } else { 0x00 };
    let biased = (sample as i32).abs().min(CLIP) + BIAS;

    // Smallest segment whose 5-bit window holds the biased magnitude
    let exponent = (0..8)
        .find(|&exp| (biased >> (exp + 3)) <= 0x1f)
        .unwrap_or(7);
    let mantissa = (biased >> (exponent + 3)) & 0x0f;

    !((sign | (exponent << 4) | mantissa) as u8)
}
