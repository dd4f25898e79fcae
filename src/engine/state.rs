//! Buffer parameters and transport state shared by the audio and control threads.

use std::fmt;

use super::buffer::{DEFAULT_NUM_CHANNELS, DEFAULT_SAMPLE_RATE};

/// Format of the capture ring, fixed by the host when the engine is prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferParameters {
    pub num_channels: usize,
    pub sample_rate: u32,
}

impl Default for BufferParameters {
    fn default() -> Self {
        Self {
            num_channels: DEFAULT_NUM_CHANNELS,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Recording/playback flags and the two ring cursors
///
/// Only ever read or modified while holding the buffer lock, which is why
/// callers receive copies of it rather than references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferState {
    /// Incoming blocks are captured while true
    pub is_recording: bool,
    /// Buffered audio is mixed into the output while true
    pub is_playing: bool,
    /// Next ring index `write` will fill
    pub write_position: usize,
    /// Next ring index `read` will play from
    pub read_position: usize,
    /// Samples recorded since the ring was last allocated
    pub samples_written: u64,
    /// Samples mixed out since playback last started or the cursor moved
    pub samples_played: u64,
}

impl Default for BufferState {
    fn default() -> Self {
        Self {
            is_recording: true,
            is_playing: false,
            write_position: 0,
            read_position: 0,
            samples_written: 0,
            samples_played: 0,
        }
    }
}

impl BufferState {
    /// Reset both cursors to the start of the ring
    pub(crate) fn rewind(&mut self) {
        self.write_position = 0;
        self.read_position = 0;
        self.samples_written = 0;
        self.samples_played = 0;
    }
}

impl fmt::Display for BufferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (write {}, read {})",
            if self.is_recording { "REC" } else { "PAUSED" },
            if self.is_playing { "PLAY" } else { "IDLE" },
            self.write_position,
            self.read_position
        )
    }
}
