//! ReSampler - Always-On Capture Buffer
//!
//! ReSampler keeps the last few seconds or minutes of whatever passes through
//! it in a circular buffer, so a good take can be grabbed after the fact:
//! select a region of the recent history and export it to a WAV file.
//!
//! # Architecture
//!
//! - [`engine::BufferManager`]: the capture ring, written and monitored from
//!   the audio callback, resized and inspected from the control thread
//! - [`engine::SelectionController`]: drag selection, selection playback and
//!   the export gesture
//! - [`engine::io`]: WAV export of selections
//! - [`state`]: persisted settings (buffer length, theme, recording folder)

pub mod cli;
pub mod engine;
pub mod error;
pub mod state;

pub use error::{ResamplerError, Result};
