//! Capture Ring Buffer
//!
//! [`BufferManager`] owns a fixed-duration multichannel ring that the audio
//! callback records into continuously. The control thread may resize it,
//! toggle recording, start monitored playback from any position, and copy
//! ranges out for export.
//!
//! Every access to the sample store and to [`BufferState`] goes through one
//! mutex. The audio thread only ever copies memory while holding it; resizing
//! (the only allocating operation) runs on the control thread.

use log::debug;
use parking_lot::Mutex;

use super::buffer::AudioBuffer;
use super::selection::{resolve_window, SampleRange, SelectionWindow};
use super::state::{BufferParameters, BufferState};
use crate::error::{ResamplerError, Result};
use crate::state::settings::{persisted_duration, SettingsStore};

/// Buffer length used when nothing has been persisted
pub const DEFAULT_BUFFER_LENGTH_SECS: u32 = 30;

/// Longest ring accepted by [`BufferManager::set_length`] (one hour)
pub const MAX_BUFFER_LENGTH_SECS: u32 = 3600;

/// Buffer lengths offered by the editor menu
pub const DURATION_PRESETS: [u32; 5] = [15, 30, 60, 120, 300];

/// Read-only look at the ring, valid while the lock is held
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    pub buffer: &'a AudioBuffer,
    pub state: BufferState,
    pub generation: u64,
}

#[derive(Debug)]
struct Inner {
    params: Option<BufferParameters>,
    length_secs: u32,
    buffer: Option<AudioBuffer>,
    state: BufferState,
    generation: u64,
}

/// The capture ring and its cursors behind a single lock
///
/// Shared between threads as `Arc<BufferManager>`.
///
/// # Example
/// ```
/// use resampler::engine::{AudioBuffer, BufferManager};
/// use resampler::state::MemorySettings;
///
/// let manager = BufferManager::new();
/// manager.initialize(1, 4, &MemorySettings::with_duration(1)).unwrap();
///
/// let block = AudioBuffer::from_channels(vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]], 4).unwrap();
/// manager.write(&block).unwrap();
///
/// assert_eq!(manager.state().write_position, 1);
/// ```
#[derive(Debug)]
pub struct BufferManager {
    inner: Mutex<Inner>,
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferManager {
    /// Create an uninitialized manager; `write`/`read` do nothing until
    /// [`initialize`](Self::initialize) is called.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                params: None,
                length_secs: DEFAULT_BUFFER_LENGTH_SECS,
                buffer: None,
                state: BufferState::default(),
                generation: 0,
            }),
        }
    }

    // ========================================================================
    // Setup and resize (control thread)
    // ========================================================================

    /// Set the ring format from the host and allocate it
    ///
    /// The ring length comes from `settings` (falling back to
    /// [`DEFAULT_BUFFER_LENGTH_SECS`]). Calling this again, e.g. when the host
    /// re-prepares with a new sample rate, reallocates the ring.
    pub fn initialize(
        &self,
        num_channels: usize,
        sample_rate: u32,
        settings: &dyn SettingsStore,
    ) -> Result<()> {
        let secs = persisted_duration(settings).unwrap_or(DEFAULT_BUFFER_LENGTH_SECS);
        self.initialize_with_length(num_channels, sample_rate, secs)
    }

    /// Like [`initialize`](Self::initialize) with an explicit buffer length
    pub fn initialize_with_length(
        &self,
        num_channels: usize,
        sample_rate: u32,
        length_secs: u32,
    ) -> Result<()> {
        if num_channels == 0 {
            return Err(ResamplerError::invalid("channel count must be positive"));
        }
        if sample_rate == 0 {
            return Err(ResamplerError::invalid("sample rate must be positive"));
        }

        let params = BufferParameters {
            num_channels,
            sample_rate,
        };
        let mut inner = self.inner.lock();
        let capacity = resize_locked(&mut inner, params, length_secs)?;
        inner.params = Some(params);
        let generation = inner.generation;
        drop(inner);

        debug!(
            "Buffer initialized: {} channel(s) at {} Hz, {}s ({} samples/channel, generation {})",
            num_channels, sample_rate, length_secs, capacity, generation
        );
        Ok(())
    }

    /// Reallocate the ring to `length_secs` seconds
    ///
    /// Recorded audio is discarded: the new ring is silent and both cursors
    /// restart at 0. The generation counter changes so cached views know to
    /// rebuild. On error the previous ring, length and format are kept.
    ///
    /// # Errors
    /// * `Uninitialized` - no format has been set yet
    /// * `InvalidArgument` - zero length, longer than
    ///   [`MAX_BUFFER_LENGTH_SECS`], or more memory than can be allocated
    pub fn set_length(&self, length_secs: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        let params = inner.params.ok_or(ResamplerError::Uninitialized)?;
        let capacity = resize_locked(&mut inner, params, length_secs)?;
        let generation = inner.generation;
        drop(inner);

        debug!(
            "Buffer length set to {}s ({} samples/channel, generation {})",
            length_secs, capacity, generation
        );
        Ok(())
    }

    // ========================================================================
    // Audio thread
    // ========================================================================

    /// Record one block at the write cursor
    ///
    /// Does nothing if the ring is not allocated, recording is paused, or the
    /// block is empty. A block that crosses the end of the ring is split into
    /// a tail copy and a head copy.
    ///
    /// # Errors
    /// `InvalidArgument` for ragged blocks, or blocks long enough to lap the
    /// ring more than once from the current cursor.
    pub fn write(&self, block: &AudioBuffer) -> Result<()> {
        let mut guard = self.inner.lock();
        let Inner { buffer, state, .. } = &mut *guard;

        let Some(ring) = buffer.as_mut() else {
            return Ok(());
        };
        if !state.is_recording || block.is_empty() {
            return Ok(());
        }
        block.check_rectangular()?;

        let capacity = ring.num_samples();
        let len = block.num_samples();
        let pos = state.write_position;
        check_span(pos, len, capacity)?;

        let channels = block.num_channels().min(ring.num_channels());

        if pos + len > capacity {
            let tail = capacity - pos;
            let overlap = len - tail;
            for ch in 0..channels {
                let source = block.channel(ch);
                ring.copy_from(ch, pos, source, 0, tail);
                ring.copy_from(ch, 0, source, tail, overlap);
            }
            state.write_position = overlap % capacity;
        } else {
            for ch in 0..channels {
                ring.copy_from(ch, pos, block.channel(ch), 0, len);
            }
            state.write_position = (pos + len) % capacity;
        }
        state.samples_written += len as u64;

        Ok(())
    }

    /// Mix buffered audio from the read cursor into `output`
    ///
    /// The ring content is added to what `output` already holds, so live
    /// pass-through and monitored history play together. Does nothing unless
    /// playback is active.
    pub fn read(&self, output: &mut AudioBuffer) -> Result<()> {
        let mut guard = self.inner.lock();
        let Inner { buffer, state, .. } = &mut *guard;

        let Some(ring) = buffer.as_ref() else {
            return Ok(());
        };
        if !state.is_playing || output.is_empty() {
            return Ok(());
        }
        output.check_rectangular()?;

        let capacity = ring.num_samples();
        let len = output.num_samples();
        let pos = state.read_position;
        check_span(pos, len, capacity)?;

        let channels = output.num_channels().min(ring.num_channels());

        if pos + len > capacity {
            let tail = capacity - pos;
            let overlap = len - tail;
            for ch in 0..channels {
                let source = ring.channel(ch);
                output.add_from(ch, 0, source, pos, tail);
                output.add_from(ch, tail, source, 0, overlap);
            }
            state.read_position = overlap % capacity;
        } else {
            for ch in 0..channels {
                output.add_from(ch, 0, ring.channel(ch), pos, len);
            }
            state.read_position = (pos + len) % capacity;
        }
        state.samples_played += len as u64;

        Ok(())
    }

    // ========================================================================
    // Transport (control thread)
    // ========================================================================

    /// Pause or resume capture
    pub fn set_recording(&self, recording: bool) {
        self.inner.lock().state.is_recording = recording;
        debug!("Recording {}", if recording { "resumed" } else { "paused" });
    }

    /// Flip the recording flag, returning the new value
    pub fn toggle_recording(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.state.is_recording = !inner.state.is_recording;
        inner.state.is_recording
    }

    /// Start monitored playback from ring index `position`
    pub fn start_playback(&self, position: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        let capacity = capacity_of(&inner)?;
        check_position(position, capacity)?;

        inner.state.read_position = position;
        inner.state.samples_played = 0;
        inner.state.is_playing = true;
        Ok(())
    }

    /// Stop playback and rewind the read cursor
    pub fn stop_playback(&self) {
        let mut inner = self.inner.lock();
        inner.state.is_playing = false;
        inner.state.read_position = 0;
        inner.state.samples_played = 0;
    }

    /// Move the read cursor without changing the playing flag (scrubbing)
    pub fn set_read_position(&self, position: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        let capacity = capacity_of(&inner)?;
        check_position(position, capacity)?;

        inner.state.read_position = position;
        inner.state.samples_played = 0;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Buffer length in seconds
    pub fn length(&self) -> u32 {
        self.inner.lock().length_secs
    }

    /// Host sample rate, or the default before initialization
    pub fn sample_rate(&self) -> u32 {
        self.inner
            .lock()
            .params
            .unwrap_or_default()
            .sample_rate
    }

    /// Ring channel count, or the default before initialization
    pub fn channel_count(&self) -> usize {
        self.inner
            .lock()
            .params
            .unwrap_or_default()
            .num_channels
    }

    /// Ring capacity in samples per channel (0 before initialization)
    pub fn capacity(&self) -> usize {
        self.inner
            .lock()
            .buffer
            .as_ref()
            .map(AudioBuffer::num_samples)
            .unwrap_or(0)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().buffer.is_some()
    }

    /// Snapshot of the flags and cursors
    pub fn state(&self) -> BufferState {
        self.inner.lock().state
    }

    /// Incremented by every successful resize
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Inspect the ring and its state under the lock
    ///
    /// Returns None before initialization. Keep `f` short: the audio thread
    /// waits on the same lock.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&AudioBuffer, &BufferState) -> R) -> Option<R> {
        self.with_view(|view| f(view.buffer, &view.state))
    }

    /// Like [`with_buffer`](Self::with_buffer), also exposing the generation
    /// the ring belongs to
    pub fn with_view<R>(&self, f: impl FnOnce(BufferView<'_>) -> R) -> Option<R> {
        let inner = self.inner.lock();
        inner.buffer.as_ref().map(|buffer| {
            f(BufferView {
                buffer,
                state: inner.state,
                generation: inner.generation,
            })
        })
    }

    /// Resolve a display selection against the current ring and copy it
    /// out, wrapping past the end of the ring, under a single lock
    ///
    /// Allocates; control thread only.
    ///
    /// # Errors
    /// `Uninitialized` if the ring has not been allocated yet.
    pub fn copy_window(
        &self,
        window: SelectionWindow,
        scroll_offset: usize,
    ) -> Result<(SampleRange, AudioBuffer)> {
        let inner = self.inner.lock();
        let ring = inner.buffer.as_ref().ok_or(ResamplerError::Uninitialized)?;

        let capacity = ring.num_samples();
        let range = resolve_window(window, scroll_offset, capacity)?;
        let SampleRange { start, len } = range;

        let mut out = AudioBuffer::new(ring.num_channels(), len, ring.sample_rate);
        if start + len > capacity {
            let tail = capacity - start;
            let head = len - tail;
            for ch in 0..ring.num_channels() {
                out.copy_from(ch, 0, ring.channel(ch), start, tail);
                out.copy_from(ch, tail, ring.channel(ch), 0, head);
            }
        } else {
            for ch in 0..ring.num_channels() {
                out.copy_from(ch, 0, ring.channel(ch), start, len);
            }
        }

        Ok((range, out))
    }
}

/// Allocate a silent ring for `params` and install it, leaving `inner`
/// untouched if validation or allocation fails. Returns the new capacity.
fn resize_locked(inner: &mut Inner, params: BufferParameters, length_secs: u32) -> Result<usize> {
    if length_secs == 0 {
        return Err(ResamplerError::invalid("buffer length must be positive"));
    }
    if length_secs > MAX_BUFFER_LENGTH_SECS {
        return Err(ResamplerError::invalid(format!(
            "buffer length {}s exceeds the maximum of {}s",
            length_secs, MAX_BUFFER_LENGTH_SECS
        )));
    }
    let capacity = (length_secs as usize)
        .checked_mul(params.sample_rate as usize)
        .ok_or_else(|| {
            ResamplerError::invalid(format!(
                "{}s at {} Hz is not a usable capacity",
                length_secs, params.sample_rate
            ))
        })?;

    let ring = AudioBuffer::try_zeroed(params.num_channels, capacity, params.sample_rate)?;

    inner.buffer = Some(ring);
    inner.length_secs = length_secs;
    inner.state.rewind();
    inner.generation += 1;
    Ok(capacity)
}

fn capacity_of(inner: &Inner) -> Result<usize> {
    inner
        .buffer
        .as_ref()
        .map(AudioBuffer::num_samples)
        .ok_or(ResamplerError::Uninitialized)
}

fn check_position(position: usize, capacity: usize) -> Result<()> {
    if position >= capacity {
        return Err(ResamplerError::invalid(format!(
            "position {} outside ring of {} samples",
            position, capacity
        )));
    }
    Ok(())
}

/// A block must fit in one tail segment plus one head segment
fn check_span(cursor: usize, len: usize, capacity: usize) -> Result<()> {
    if cursor + len > 2 * capacity {
        return Err(ResamplerError::invalid(format!(
            "block of {} samples at {} laps a ring of {} samples",
            len, cursor, capacity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::settings::MemorySettings;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use test_case::test_case;

    /// Mono ring with `capacity` samples (1 second at `capacity` Hz)
    fn mono_ring(capacity: u32) -> BufferManager {
        let manager = BufferManager::new();
        manager.initialize_with_length(1, capacity, 1).unwrap();
        manager
    }

    fn mono(samples: &[f32]) -> AudioBuffer {
        AudioBuffer::from_channels(vec![samples.to_vec()], 4).unwrap()
    }

    fn ring_contents(manager: &BufferManager) -> Vec<f32> {
        manager
            .with_buffer(|buffer, _| buffer.channel(0).to_vec())
            .unwrap()
    }

    #[test]
    fn test_uninitialized_is_inert() {
        let manager = BufferManager::new();
        let mut out = mono(&[0.5; 4]);

        manager.write(&mono(&[1.0; 4])).unwrap();
        manager.read(&mut out).unwrap();

        assert_eq!(out.channel(0), &[0.5; 4]);
        assert_eq!(manager.capacity(), 0);
        assert!(manager.with_buffer(|_, _| ()).is_none());
        assert!(matches!(
            manager.set_length(10),
            Err(ResamplerError::Uninitialized)
        ));
        assert!(matches!(
            manager.start_playback(0),
            Err(ResamplerError::Uninitialized)
        ));
    }

    #[test]
    fn test_initialize_uses_persisted_duration() {
        let manager = BufferManager::new();
        manager
            .initialize(2, 100, &MemorySettings::with_duration(15))
            .unwrap();
        assert_eq!(manager.length(), 15);
        assert_eq!(manager.capacity(), 1500);

        let fresh = BufferManager::new();
        fresh.initialize(2, 100, &MemorySettings::new()).unwrap();
        assert_eq!(fresh.length(), DEFAULT_BUFFER_LENGTH_SECS);
    }

    #[test]
    fn test_initialize_rejects_bad_format() {
        let manager = BufferManager::new();
        assert!(manager.initialize_with_length(0, 44100, 30).is_err());
        assert!(manager.initialize_with_length(2, 0, 30).is_err());
        assert!(!manager.is_initialized());
    }

    #[test]
    fn test_set_length_thirty_seconds_stereo() {
        let manager = BufferManager::new();
        manager.initialize_with_length(2, 44100, 30).unwrap();

        assert_eq!(manager.length(), 30);
        assert_eq!(manager.capacity(), 1_323_000);
        assert_eq!(manager.channel_count(), 2);
        assert_eq!(manager.state().write_position, 0);
        let silent = manager
            .with_buffer(|buffer, _| {
                buffer.num_channels() == 2 && buffer.samples.iter().flatten().all(|&s| s == 0.0)
            })
            .unwrap();
        assert!(silent);
    }

    #[test]
    fn test_set_length_zero_is_invalid() {
        let manager = mono_ring(4);
        assert!(matches!(
            manager.set_length(0),
            Err(ResamplerError::InvalidArgument { .. })
        ));
        assert_eq!(manager.length(), 1);
    }

    #[test]
    fn test_resize_clears_and_rewinds() {
        let manager = mono_ring(4);
        manager.write(&mono(&[1.0, 2.0, 3.0])).unwrap();
        manager.start_playback(2).unwrap();
        let generation = manager.generation();

        manager.set_length(2).unwrap();

        let state = manager.state();
        assert_eq!(state.write_position, 0);
        assert_eq!(state.read_position, 0);
        assert_eq!(manager.capacity(), 8);
        assert_eq!(ring_contents(&manager), vec![0.0; 8]);
        assert_eq!(manager.generation(), generation + 1);
    }

    #[test]
    fn test_write_wraps_five_into_four() {
        let manager = mono_ring(4);
        manager.write(&mono(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();

        assert_eq!(ring_contents(&manager), vec![5.0, 2.0, 3.0, 4.0]);
        assert_eq!(manager.state().write_position, 1);

        manager.start_playback(0).unwrap();
        let mut out = mono(&[1.0; 4]);
        manager.read(&mut out).unwrap();
        assert_eq!(out.channel(0), &[6.0, 3.0, 4.0, 5.0]);
        assert_eq!(manager.state().read_position, 0);
    }

    #[test]
    fn test_write_straddling_end_keeps_time_order() {
        let manager = mono_ring(4);
        manager.write(&mono(&[1.0, 2.0, 3.0])).unwrap();
        manager.write(&mono(&[4.0, 5.0, 6.0])).unwrap();

        assert_eq!(ring_contents(&manager), vec![5.0, 6.0, 3.0, 4.0]);
        assert_eq!(manager.state().write_position, 2);

        // Oldest sample sits at the write cursor
        manager.start_playback(2).unwrap();
        let mut out = mono(&[0.0; 4]);
        manager.read(&mut out).unwrap();
        assert_eq!(out.channel(0), &[3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_write_exact_fit_wraps_cursor_to_zero() {
        let manager = mono_ring(4);
        manager.write(&mono(&[1.0, 2.0])).unwrap();
        manager.write(&mono(&[3.0, 4.0])).unwrap();
        assert_eq!(manager.state().write_position, 0);
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let manager = mono_ring(16);
        let block = mono(&[0.1, 0.2, 0.3, 0.4, 0.5]);

        manager.write(&mono(&[9.0; 3])).unwrap();
        manager.write(&block).unwrap();

        manager.start_playback(3).unwrap();
        let mut out = mono(&[0.0; 5]);
        manager.read(&mut out).unwrap();
        assert_eq!(out, block);
    }

    #[test]
    fn test_write_ignored_while_paused() {
        let manager = mono_ring(4);
        manager.set_recording(false);
        manager.write(&mono(&[1.0, 2.0])).unwrap();

        assert_eq!(ring_contents(&manager), vec![0.0; 4]);
        assert_eq!(manager.state().write_position, 0);

        assert!(manager.toggle_recording());
        manager.write(&mono(&[1.0, 2.0])).unwrap();
        assert_eq!(manager.state().write_position, 2);
    }

    #[test]
    fn test_read_ignored_while_not_playing() {
        let manager = mono_ring(4);
        manager.write(&mono(&[1.0, 2.0, 3.0, 4.0])).unwrap();

        let mut out = mono(&[0.25; 4]);
        manager.read(&mut out).unwrap();
        assert_eq!(out.channel(0), &[0.25; 4]);
        assert_eq!(manager.state().read_position, 0);
    }

    #[test]
    fn test_empty_block_is_noop() {
        let manager = mono_ring(4);
        manager.write(&mono(&[])).unwrap();
        assert_eq!(manager.state().write_position, 0);
    }

    #[test]
    fn test_empty_output_is_noop() {
        let manager = mono_ring(4);
        manager.write(&mono(&[1.0, 2.0, 3.0])).unwrap();
        manager.start_playback(1).unwrap();

        let mut out = mono(&[]);
        manager.read(&mut out).unwrap();

        assert!(out.is_empty());
        let state = manager.state();
        assert_eq!(state.read_position, 1);
        assert_eq!(state.samples_played, 0);
        assert!(state.is_playing);
    }

    #[test]
    fn test_long_block_from_mid_ring_overwrites_its_own_tail() {
        let manager = mono_ring(4);
        manager.write(&mono(&[9.0, 9.0])).unwrap();

        // Tail gets 1, 2 at indices 2..4, then the head 3..6 covers the whole ring
        manager
            .write(&mono(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))
            .unwrap();

        assert_eq!(ring_contents(&manager), vec![3.0, 4.0, 5.0, 6.0]);
        let state = manager.state();
        assert_eq!(state.write_position, 0);
        assert_eq!(state.samples_written, 8);
    }

    #[test]
    fn test_failed_reinitialize_keeps_previous_ring() {
        let manager = BufferManager::new();
        manager.initialize_with_length(2, 100, 1).unwrap();
        let generation = manager.generation();

        assert!(manager.initialize_with_length(1, 48000, 0).is_err());

        assert_eq!(manager.channel_count(), 2);
        assert_eq!(manager.sample_rate(), 100);
        assert_eq!(manager.length(), 1);
        assert_eq!(
            manager.capacity(),
            manager.length() as usize * manager.sample_rate() as usize
        );
        assert_eq!(manager.generation(), generation);
    }

    #[test_case(MAX_BUFFER_LENGTH_SECS + 1 ; "past the maximum")]
    #[test_case(u32::MAX ; "stored garbage")]
    fn test_oversized_length_rejected(secs: u32) {
        let manager = BufferManager::new();
        manager.initialize_with_length(2, 44100, 30).unwrap();

        assert!(matches!(
            manager.set_length(secs),
            Err(ResamplerError::InvalidArgument { .. })
        ));
        assert_eq!(manager.length(), 30);
        assert_eq!(manager.capacity(), 1_323_000);
    }

    #[test_case(0, 9 ; "from start")]
    #[test_case(3, 6 ; "near end")]
    fn test_lapping_block_rejected(cursor: usize, len: usize) {
        let manager = mono_ring(4);
        if cursor > 0 {
            manager.write(&mono(&vec![0.0; cursor])).unwrap();
        }

        let result = manager.write(&mono(&vec![1.0; len]));
        assert!(matches!(result, Err(ResamplerError::InvalidArgument { .. })));
        assert_eq!(manager.state().write_position, cursor);
    }

    #[test]
    fn test_ragged_block_rejected() {
        let manager = BufferManager::new();
        manager.initialize_with_length(2, 4, 1).unwrap();
        let ragged = AudioBuffer {
            samples: vec![vec![1.0; 2], vec![1.0; 3]],
            sample_rate: 4,
        };
        assert!(manager.write(&ragged).is_err());
    }

    #[test]
    fn test_extra_block_channels_are_ignored() {
        let manager = mono_ring(4);
        let stereo = AudioBuffer::from_channels(vec![vec![1.0; 2], vec![2.0; 2]], 4).unwrap();
        manager.write(&stereo).unwrap();
        assert_eq!(ring_contents(&manager), vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_stop_playback_rewinds_read_cursor() {
        let manager = mono_ring(4);
        manager.start_playback(3).unwrap();
        manager.stop_playback();

        let state = manager.state();
        assert!(!state.is_playing);
        assert_eq!(state.read_position, 0);
        assert!(manager.set_read_position(4).is_err());
    }

    #[test]
    fn test_copy_window_wraps() {
        let manager = mono_ring(4);
        manager.write(&mono(&[1.0, 2.0, 3.0, 4.0])).unwrap();

        let (range, audio) = manager
            .copy_window(SelectionWindow { start: 2, width: 3 }, 0)
            .unwrap();
        assert_eq!(range, SampleRange { start: 2, len: 3 });
        assert_eq!(audio.channel(0), &[3.0, 4.0, 1.0]);

        // Width is clamped to the ring, scroll shifts the start
        let (range, audio) = manager
            .copy_window(SelectionWindow { start: 0, width: 9 }, 1)
            .unwrap();
        assert_eq!(range, SampleRange { start: 3, len: 4 });
        assert_eq!(audio.channel(0), &[4.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_copy_window_before_initialize() {
        let result = BufferManager::new().copy_window(SelectionWindow { start: 0, width: 1 }, 0);
        assert!(matches!(result, Err(ResamplerError::Uninitialized)));
    }

    #[test]
    fn test_concurrent_writer_and_resizer() {
        let manager = Arc::new(BufferManager::new());
        manager.initialize_with_length(2, 64, 1).unwrap();

        let writer = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                let block = AudioBuffer::new(2, 16, 64);
                for _ in 0..500 {
                    manager.write(&block).unwrap();
                }
            })
        };

        for secs in [2, 1, 3, 1] {
            manager.set_length(secs).unwrap();
        }
        writer.join().unwrap();

        let state = manager.state();
        assert!(state.write_position < manager.capacity());
    }
}
