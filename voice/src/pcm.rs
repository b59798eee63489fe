//! Linear PCM codec for the real-time audio wire format.
//!
//! Microphone input travels as 16 kHz mono signed 16-bit little-endian PCM,
//! base64 encoded. Model audio comes back the same way at 24 kHz.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use serde::{Deserialize, Serialize};

pub const INPUT_SAMPLE_RATE: u32 = 16_000;
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Samples per microphone processing block.
pub const INPUT_BLOCK_SIZE: usize = 4096;

pub const INPUT_MIME_TYPE: &str = "audio/pcm;rate=16000";

#[derive(Debug, thiserror::Error)]
pub enum PcmError {
    #[error("invalid base64 audio: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("PCM16 payload has odd byte length {0}")]
    OddLength(usize),
    #[error("cannot resample {from_hz} Hz to {to_hz} Hz")]
    InvalidRate { from_hz: u32, to_hz: u32 },
    #[error("resampler setup failed: {0}")]
    ResamplerSetup(#[from] rubato::ResamplerConstructionError),
    #[error("resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),
}

/// One encoded block of realtime input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioChunk {
    pub mime_type: String,
    /// Base64 of little-endian i16 samples.
    pub data: String,
}

// =============================================================================
// SAMPLE CONVERSION
// =============================================================================

/// Quantize one float sample. Negative and positive halves use separate scale
/// factors so both -1.0 and 1.0 map onto the ends of the i16 range.
#[must_use]
pub fn encode_sample(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 { (s * 32_768.0) as i16 } else { (s * 32_767.0) as i16 }
}

#[must_use]
pub fn decode_sample(sample: i16) -> f32 {
    f32::from(sample) / 32_768.0
}

#[must_use]
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| encode_sample(s).to_le_bytes())
        .collect()
}

/// Decode little-endian PCM16 bytes into normalized floats.
///
/// # Errors
///
/// Returns [`PcmError::OddLength`] when the payload is not a whole number of samples.
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<f32>, PcmError> {
    if bytes.len() % 2 != 0 {
        return Err(PcmError::OddLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| decode_sample(i16::from_le_bytes([pair[0], pair[1]])))
        .collect())
}

// =============================================================================
// WIRE FRAMING
// =============================================================================

/// Encode one microphone block as a realtime input chunk.
#[must_use]
pub fn encode_block(samples: &[f32]) -> AudioChunk {
    AudioChunk { mime_type: INPUT_MIME_TYPE.to_owned(), data: STANDARD.encode(encode_pcm16(samples)) }
}

/// Decode a base64 inline-audio payload from the model.
///
/// # Errors
///
/// Returns an error if the payload is not valid base64 or not whole PCM16 samples.
pub fn decode_chunk(data: &str) -> Result<Vec<f32>, PcmError> {
    let bytes = STANDARD.decode(data)?;
    decode_pcm16(&bytes)
}

// =============================================================================
// DEVICE ADAPTATION
// =============================================================================

/// Input frames handed to the resampler per step.
const RESAMPLE_CHUNK: usize = 1024;

/// Streaming rate converter for device audio.
///
/// Input that does not fill a whole resampler chunk is held until the next
/// push, so consecutive callbacks form one continuous signal and no samples
/// are lost at callback boundaries. Matching rates pass through untouched.
pub struct StreamResampler {
    inner: Option<FastFixedIn<f32>>,
    pending: Vec<f32>,
}

impl StreamResampler {
    /// # Errors
    ///
    /// Returns an error when either rate is zero.
    pub fn new(from_hz: u32, to_hz: u32) -> Result<Self, PcmError> {
        if from_hz == 0 || to_hz == 0 {
            return Err(PcmError::InvalidRate { from_hz, to_hz });
        }
        let inner = if from_hz == to_hz {
            None
        } else {
            let ratio = f64::from(to_hz) / f64::from(from_hz);
            Some(FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Septic, RESAMPLE_CHUNK, 1)?)
        };
        Ok(Self { inner, pending: Vec::with_capacity(RESAMPLE_CHUNK) })
    }

    /// Leading output frames that precede the first input sample.
    #[must_use]
    pub fn delay(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.output_delay())
    }

    /// Input frames held back waiting for a full chunk.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Convert `input`, returning every output frame that is now complete.
    ///
    /// # Errors
    ///
    /// Returns an error when the resampler rejects a chunk.
    pub fn push(&mut self, input: &[f32]) -> Result<Vec<f32>, PcmError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(input.to_vec());
        };
        self.pending.extend_from_slice(input);
        let mut out = Vec::new();
        let mut consumed = 0;
        loop {
            let need = inner.input_frames_next();
            if self.pending.len() - consumed < need {
                break;
            }
            let frames = inner.process(&[&self.pending[consumed..consumed + need]], None)?;
            out.extend_from_slice(&frames[0]);
            consumed += need;
        }
        self.pending.drain(..consumed);
        Ok(out)
    }

    /// Push held input through, padding the final chunk with silence.
    ///
    /// # Errors
    ///
    /// Returns an error when the resampler rejects the chunk.
    pub fn flush(&mut self) -> Result<Vec<f32>, PcmError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(std::mem::take(&mut self.pending));
        };
        let frames = inner.process_partial(Some(&[&self.pending[..]]), None)?;
        self.pending.clear();
        Ok(frames.into_iter().next().unwrap_or_default())
    }
}

/// Convert one self-contained buffer, e.g. a chunk of model audio for a
/// device running at another rate.
///
/// The output is aligned to the input (resampler delay removed) and holds
/// exactly `len * to_hz / from_hz` frames, so back-to-back chunks stay gapless.
///
/// # Errors
///
/// Returns an error for a zero rate or a resampler failure.
pub fn resample(input: &[f32], from_hz: u32, to_hz: u32) -> Result<Vec<f32>, PcmError> {
    let mut resampler = StreamResampler::new(from_hz, to_hz)?;
    if resampler.inner.is_none() || input.is_empty() {
        return Ok(input.to_vec());
    }
    let expected = (input.len() as u64 * u64::from(to_hz) / u64::from(from_hz)) as usize;
    let delay = resampler.delay();

    let mut out = resampler.push(input)?;
    while out.len() < delay + expected {
        let tail = resampler.flush()?;
        if tail.is_empty() {
            break;
        }
        out.extend_from_slice(&tail);
    }
    out.drain(..delay.min(out.len()));
    out.resize(expected, 0.0);
    Ok(out)
}

/// Regroups arbitrarily sized device callbacks into fixed processing blocks.
#[derive(Debug)]
pub struct Reblocker {
    block_size: usize,
    pending: Vec<f32>,
}

impl Reblocker {
    #[must_use]
    pub fn new(block_size: usize) -> Self {
        Self { block_size: block_size.max(1), pending: Vec::with_capacity(block_size) }
    }

    /// Append samples and return every block that is now complete.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.pending.extend_from_slice(samples);
        let mut blocks = Vec::new();
        while self.pending.len() >= self.block_size {
            let rest = self.pending.split_off(self.block_size);
            blocks.push(std::mem::replace(&mut self.pending, rest));
        }
        blocks
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
#[path = "pcm_test.rs"]
mod tests;
