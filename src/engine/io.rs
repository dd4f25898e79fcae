//! Audio file I/O for ReSampler
//!
//! Exports selections of the capture ring as PCM WAV files and reads WAV
//! files back (used by the CLI host to feed the ring, and by tests).
//!
//! No sample-rate conversion happens here: files are written at the ring's
//! rate and read at whatever rate they were recorded with.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{info, warn};

use super::buffer::AudioBuffer;
use super::ring::BufferManager;
use super::selection::SelectionWindow;
use crate::error::{ResamplerError, Result};

/// Prefix of exported take filenames
pub const EXPORT_PREFIX: &str = "TKRS";

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (default: 24)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 24 }
    }
}

impl ExportFormat {
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }

    fn wav_spec(&self, channels: u16, sample_rate: u32) -> Result<WavSpec> {
        let sample_format = match self.bit_depth {
            16 | 24 => SampleFormat::Int,
            32 => SampleFormat::Float,
            other => {
                return Err(ResamplerError::UnsupportedFormat {
                    format: format!("{}-bit audio (only 16, 24, 32 supported)", other),
                })
            }
        };

        Ok(WavSpec {
            channels,
            sample_rate,
            bits_per_sample: self.bit_depth,
            sample_format,
        })
    }
}

/// `<dir>/TKRS_<YYYYMMDD_HHMMSS>.wav`, with `_<n>` appended if a take with
/// that timestamp already exists
pub fn timestamped_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = format!("{}_{}", EXPORT_PREFIX, now.format("%Y%m%d_%H%M%S"));
    let mut path = dir.join(format!("{}.wav", stem));
    let mut n = 2;
    while path.exists() {
        path = dir.join(format!("{}_{}.wav", stem, n));
        n += 1;
    }
    path
}

/// Export a display selection of the ring to a new take
///
/// The selection is mapped onto the ring with `scroll_offset` (see
/// [`resolve_window`](super::selection::resolve_window)) and copied under
/// the buffer lock;
/// the file is written after the lock is released. The recording directory
/// is created if missing.
///
/// # Returns
/// * `Ok(Some(path))` - the take that was written
/// * `Ok(None)` - the selection was empty, nothing was written
///
/// # Errors
/// * `Uninitialized` - the ring has not been allocated yet
/// * `IoFailure` - the directory or file could not be created or written;
///   no partial file is left behind
pub fn export_selection(
    manager: &BufferManager,
    window: SelectionWindow,
    scroll_offset: usize,
    recording_dir: &Path,
    format: ExportFormat,
) -> Result<Option<PathBuf>> {
    if window.width == 0 {
        return Ok(None);
    }

    let (range, audio) = manager.copy_window(window, scroll_offset)?;

    fs::create_dir_all(recording_dir).map_err(|e| ResamplerError::io(recording_dir, e))?;
    let path = timestamped_path(recording_dir, Local::now());

    write_wav(&audio, &path, format)?;

    info!(
        "Exported {} samples ({:.2}s) from ring offset {} to {}",
        range.len,
        audio.duration_secs(),
        range.start,
        path.display()
    );
    Ok(Some(path))
}

/// Write `buffer` to a WAV file at `path`
///
/// Samples are clamped to [-1, 1] for integer formats. If writing fails
/// after the file was created, the file is removed again.
pub fn write_wav(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let spec = format.wav_spec(buffer.num_channels() as u16, buffer.sample_rate)?;

    let file = fs::File::create(path).map_err(|e| ResamplerError::io(path, e))?;
    let written = WavWriter::new(BufWriter::new(file), spec)
        .map_err(ResamplerError::from)
        .and_then(|writer| write_samples(writer, buffer, format));

    if let Err(e) = written {
        warn!("Removing incomplete take {}: {}", path.display(), e);
        let _ = fs::remove_file(path);
        return Err(e);
    }

    Ok(())
}

fn write_samples<W: std::io::Write + std::io::Seek>(
    mut writer: WavWriter<W>,
    buffer: &AudioBuffer,
    format: ExportFormat,
) -> Result<()> {
    let interleaved = buffer.to_interleaved();

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Read a WAV file into an [`AudioBuffer`] at its native sample rate
///
/// # Errors
/// * `IoFailure` - the file does not exist or cannot be opened
/// * `Wav` - the file is not valid WAV
/// * `UnsupportedFormat` - an integer bit depth hound cannot decode
pub fn import_wav(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(ResamplerError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }

    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    AudioBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let samples: Vec<f32> = match sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                other => {
                    return Err(ResamplerError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", other),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };
    Ok(samples)
}

// ============================================================================
// Tests
// ============================================================================
