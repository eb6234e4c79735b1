//! Energy-based voice activity signal

use crate::codec::samples;

/// Root-mean-square amplitude of a 16-bit PCM frame; 0 for an empty frame
pub fn rms(pcm: &[u8]) -> f64 {
    let (sum, count) = samples(pcm).fold((0.0f64, 0usize), |(sum, count), s| {
        let s = s as f64;
        (sum + s * s, count + 1)
    });

    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).sqrt()
}
