//! Audio Buffer
//!
//! Non-interleaved multichannel sample store used both as the ring's backing
//! storage and as the block type exchanged with the host audio callback.

use crate::error::{ResamplerError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Host sample rate assumed until the engine tells us otherwise
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Channel count assumed until the engine tells us otherwise
pub const DEFAULT_NUM_CHANNELS: usize = 2;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Peak absolute sample value across all channels of `buffer`
pub fn calculate_peak(buffer: &AudioBuffer) -> f32 {
    buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Multichannel audio buffer
///
/// Stores audio as non-interleaved 32-bit floating point samples.
/// Each channel is a separate Vec<f32> and all channels share one length.
///
/// # Example
/// ```
/// use resampler::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::new(2, 44100, 44100);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.num_samples(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zero-filled buffer of `num_channels × num_samples`
    pub fn new(num_channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate,
        }
    }

    /// Build a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// `InvalidArgument` if the channels do not all have the same length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let buffer = Self {
            samples,
            sample_rate,
        };
        buffer.check_rectangular()?;
        Ok(buffer)
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `num_channels` - Number of interleaved channels
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(
        interleaved: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(ResamplerError::invalid("channel count must be positive"));
        }

        if interleaved.len() % num_channels != 0 {
            return Err(ResamplerError::invalid(format!(
                "Interleaved data length {} is not divisible by channel count {}",
                interleaved.len(),
                num_channels
            )));
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.num_channels();
        let num_samples = self.num_samples();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Allocate a zero-filled `num_channels × num_samples` buffer, reporting
    /// allocation failure instead of aborting
    ///
    /// # Errors
    /// `InvalidArgument` if the allocator cannot provide the memory.
    pub fn try_zeroed(num_channels: usize, num_samples: usize, sample_rate: u32) -> Result<Self> {
        let mut samples = Vec::with_capacity(num_channels);
        for _ in 0..num_channels {
            let mut channel: Vec<f32> = Vec::new();
            channel.try_reserve_exact(num_samples).map_err(|e| {
                ResamplerError::invalid(format!(
                    "cannot allocate {} samples per channel: {}",
                    num_samples, e
                ))
            })?;
            channel.resize(num_samples, 0.0);
            samples.push(channel);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Overwrite `len` samples of `dest_channel` starting at `dest_start`
    /// with samples from `source` starting at `source_start`.
    ///
    /// # Panics
    /// Panics if either range is out of bounds. Callers on the audio thread
    /// compute their ranges from the ring capacity beforehand.
    #[inline]
    pub fn copy_from(
        &mut self,
        dest_channel: usize,
        dest_start: usize,
        source: &[f32],
        source_start: usize,
        len: usize,
    ) {
        self.samples[dest_channel][dest_start..dest_start + len]
            .copy_from_slice(&source[source_start..source_start + len]);
    }

    /// Add `len` samples from `source` into `dest_channel` at unity gain
    #[inline]
    pub fn add_from(
        &mut self,
        dest_channel: usize,
        dest_start: usize,
        source: &[f32],
        source_start: usize,
        len: usize,
    ) {
        let dest = &mut self.samples[dest_channel][dest_start..dest_start + len];
        for (d, s) in dest
            .iter_mut()
            .zip(&source[source_start..source_start + len])
        {
            *d += *s;
        }
    }

    /// Validate that every channel has the same length
    pub fn check_rectangular(&self) -> Result<()> {
        let expected = self.num_samples();
        if let Some((index, ch)) = self
            .samples
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != expected)
        {
            return Err(ResamplerError::invalid(format!(
                "channel {} has {} samples, expected {}",
                index,
                ch.len(),
                expected
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
