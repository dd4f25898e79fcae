//! Audio Engine Module
//!
//! Capture engine including:
//! - Audio buffer type
//! - Capture ring buffer and its shared state
//! - Selection state machine and waveform cache for the view
//! - WAV export of selections

pub mod buffer;
pub mod io;
pub mod ring;
pub mod selection;
pub mod state;
pub mod waveform;

pub use buffer::AudioBuffer;
pub use io::{export_selection, import_wav, write_wav, ExportFormat};
pub use ring::{
    BufferManager, BufferView, DEFAULT_BUFFER_LENGTH_SECS, DURATION_PRESETS, MAX_BUFFER_LENGTH_SECS,
};
pub use selection::{
    resolve_window, DragAction, SampleRange, SelectionController, SelectionState, SelectionWindow,
};
pub use state::{BufferParameters, BufferState};
pub use waveform::WaveformCache;
