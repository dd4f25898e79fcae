//! Waveform cache for the capture view
//!
//! Keeps one peak value per bin of `samples_per_bin` ring samples and follows
//! the write cursor, rescanning only what was recorded since the last
//! update. A resize makes every bin meaningless, so the cache watches the
//! buffer generation and rescans the whole ring when it changes, or when a
//! full lap was recorded between two updates.

use super::ring::{BufferManager, BufferView};

/// Default bin size: about 10ms at 44.1kHz
pub const DEFAULT_SAMPLES_PER_BIN: usize = 441;

#[derive(Debug, Clone)]
pub struct WaveformCache {
    samples_per_bin: usize,
    peaks: Vec<f32>,
    capacity: usize,
    /// Write cursor seen by the previous update
    offset: usize,
    /// Recorded sample count seen by the previous update
    written: u64,
    generation: u64,
}

impl Default for WaveformCache {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES_PER_BIN)
    }
}

impl WaveformCache {
    pub fn new(samples_per_bin: usize) -> Self {
        Self {
            samples_per_bin: samples_per_bin.max(1),
            peaks: Vec::new(),
            capacity: 0,
            offset: 0,
            written: 0,
            generation: 0,
        }
    }

    /// Bring the cache up to date with the ring
    ///
    /// Returns true when the cache was rebuilt from scratch (first update or
    /// after a resize). Does nothing before the ring is initialized.
    pub fn update(&mut self, manager: &BufferManager) -> bool {
        manager
            .with_view(|view| self.update_from(view))
            .unwrap_or(false)
    }

    fn update_from(&mut self, view: BufferView<'_>) -> bool {
        let capacity = view.buffer.num_samples();
        let rebuilt = view.generation != self.generation || capacity != self.capacity;
        if rebuilt {
            self.capacity = capacity;
            self.generation = view.generation;
            self.peaks = vec![0.0; capacity.div_ceil(self.samples_per_bin)];
        }

        let write_position = view.state.write_position;
        let written = view.state.samples_written;
        let lapped = written.saturating_sub(self.written) >= capacity as u64;
        self.written = written;

        if rebuilt || lapped {
            self.scan(view, 0, capacity);
        } else if write_position < self.offset {
            self.scan(view, self.offset, capacity);
            self.scan(view, 0, write_position);
        } else {
            self.scan(view, self.offset, write_position);
        }
        self.offset = write_position;

        rebuilt
    }

    /// Recompute every bin touched by ring samples `[from, to)`
    fn scan(&mut self, view: BufferView<'_>, from: usize, to: usize) {
        if from >= to {
            return;
        }
        let first_bin = from / self.samples_per_bin;
        let last_bin = (to - 1) / self.samples_per_bin;

        for bin in first_bin..=last_bin {
            let start = bin * self.samples_per_bin;
            let end = (start + self.samples_per_bin).min(self.capacity);
            self.peaks[bin] = view
                .buffer
                .samples
                .iter()
                .flat_map(|channel| channel[start..end].iter())
                .map(|s| s.abs())
                .fold(0.0_f32, f32::max);
        }
    }

    /// Peak magnitude per bin, in ring order
    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    pub fn samples_per_bin(&self) -> usize {
        self.samples_per_bin
    }

    /// Horizontal position of the recording line as a fraction of the view
    pub fn recording_line(&self) -> f32 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.offset as f32 / self.capacity as f32
    }
}
