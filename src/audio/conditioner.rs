//! Post-processing applied to captured microphone frames before they reach
//! the recognizer.

/// Gain + saturating clamp into the signed 16-bit domain.
///
/// The microphone already delivers 16-bit samples, so with unit gain the
/// clamp is the identity. It stays in place for wider source formats and for
/// the optional gain stage, which is applied before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleConditioner {
    gain: i32,
}

impl Default for SampleConditioner {
    fn default() -> Self {
        Self { gain: 1 }
    }
}

impl SampleConditioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the fixed gain stage. A gain of 1 disables it.
    pub fn with_gain(gain: i32) -> Self {
        Self { gain }
    }

    pub fn gain(&self) -> i32 {
        self.gain
    }

    /// Condition one sample from a (possibly wider) source domain.
    pub fn condition(&self, sample: i32) -> i16 {
        let amplified = sample.saturating_mul(self.gain);
        amplified.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }

    /// Condition little-endian 16-bit slots in place. A trailing odd byte is
    /// left untouched.
    pub fn process_bytes(&self, buf: &mut [u8]) {
        for slot in buf.chunks_exact_mut(2) {
            let sample = i16::from_le_bytes([slot[0], slot[1]]) as i32;
            slot.copy_from_slice(&self.condition(sample).to_le_bytes());
        }
    }

    /// Condition a wider-domain buffer into 16-bit output.
    pub fn process_wide(&self, input: &[i32], output: &mut [i16]) {
        for (out, &sample) in output.iter_mut().zip(input) {
            *out = self.condition(sample);
        }
    }
}

/// Reinterpret a little-endian byte frame as 16-bit samples.
pub fn samples_from_bytes(buf: &[u8]) -> Vec<i16> {
    buf.chunks_exact(2)
        .map(|slot| i16::from_le_bytes([slot[0], slot[1]]))
        .collect()
}

/// Decode little-endian 32-bit slots, keeping the top 16 bits of each as a
/// sign-extended value in the wide domain.
pub fn wide_samples_from_bytes(buf: &[u8]) -> Vec<i32> {
    buf.chunks_exact(4)
        .map(|slot| i32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]) >> 16)
        .collect()
}
