//! Selection State Machine
//!
//! Tracks the region the user drags over the capture view and what happens
//! to it next: export, monitored playback, or dismissal.
//!
//! ```text
//! Idle -> Selecting (drag) -> Selected -> Exporting        -> Selected
//!                                      -> PlayingSelection -> Idle (region played or dismissed)
//!                                      -> Idle (click outside)
//! ```
//!
//! Geometry is normalized to the view width; [`SelectionWindow`] carries the
//! same region in samples and [`resolve_window`] maps it onto the ring.

use std::fmt;

use log::debug;

use super::ring::BufferManager;
use crate::error::{ResamplerError, Result};

/// A selection in display sample coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionWindow {
    pub start: usize,
    pub width: usize,
}

/// A span of the ring in absolute sample coordinates; may wrap past the end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub start: usize,
    pub len: usize,
}

/// Map a display selection onto absolute ring offsets
///
/// `scroll_offset` is how far the view has scrolled the ring contents:
/// display sample `p` shows ring index `(p - scroll_offset) mod capacity`.
/// The width is clamped to the ring capacity.
pub fn resolve_window(
    window: SelectionWindow,
    scroll_offset: usize,
    capacity: usize,
) -> Result<SampleRange> {
    if capacity == 0 {
        return Err(ResamplerError::Uninitialized);
    }
    let start = (window.start % capacity + capacity - scroll_offset % capacity) % capacity;
    Ok(SampleRange {
        start,
        len: window.width.min(capacity),
    })
}

/// Where the selection interaction currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    /// Mouse is dragging out a new region
    Selecting,
    /// Region frozen, waiting for an action
    Selected,
    /// Region being written to disk
    Exporting,
    /// Region being monitored through the read cursor
    PlayingSelection,
}

impl fmt::Display for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionState::Idle => write!(f, "Idle"),
            SelectionState::Selecting => write!(f, "Selecting"),
            SelectionState::Selected => write!(f, "Selected"),
            SelectionState::Exporting => write!(f, "Exporting"),
            SelectionState::PlayingSelection => write!(f, "PlayingSelection"),
        }
    }
}

/// What a drag gesture turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    /// The drag is drawing a new region
    Select,
    /// The drag started inside the frozen region: render it to a file
    Export,
}

/// Selection interaction for a capture view `view_width` pixels wide
#[derive(Debug, Clone)]
pub struct SelectionController {
    state: SelectionState,
    view_width: u32,
    /// Left edge as a fraction of the view width
    start: f32,
    /// Width as a fraction of the view width
    width: f32,
}

impl SelectionController {
    pub fn new(view_width: u32) -> Self {
        Self {
            state: SelectionState::Idle,
            view_width: view_width.max(1),
            start: 0.0,
            width: 0.0,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Normalized `(start, width)` of the current region
    pub fn bounds(&self) -> (f32, f32) {
        (self.start, self.width)
    }

    /// Whether a region is drawn on screen
    pub fn is_active(&self) -> bool {
        self.state != SelectionState::Idle
    }

    /// Pixel `x` lies strictly inside the region, ignoring a 1px margin at
    /// both edges so the borders stay grabbable for a new drag
    pub fn is_in_selected_area(&self, x: i32) -> bool {
        let w = self.view_width as f32;
        let x = x as f32;
        if x <= self.start * w + 1.0 {
            return false;
        }
        if x >= (self.start + self.width) * w - 1.0 {
            return false;
        }
        true
    }

    // ========================================================================
    // Pointer events
    // ========================================================================

    /// A click outside the frozen region dismisses it, stopping selection
    /// playback if it was running
    pub fn mouse_down(&mut self, x: i32, manager: &BufferManager) {
        if self.is_active() && self.state != SelectionState::Exporting && !self.is_in_selected_area(x)
        {
            debug!("[SELECTION] Dismissed by click at {}", x);
            self.stop_selection_playback(manager);
            self.state = SelectionState::Idle;
        }
    }

    /// Pointer dragged from `down_x` by `dx` pixels
    ///
    /// Starting a new region while the old one plays stops its playback.
    pub fn drag(&mut self, down_x: i32, dx: i32, manager: &BufferManager) -> DragAction {
        if self.state == SelectionState::Selected && self.is_in_selected_area(down_x) {
            self.state = SelectionState::Exporting;
            debug!("[SELECTION] Export gesture started");
            return DragAction::Export;
        }

        self.stop_selection_playback(manager);

        let w = self.view_width as f32;
        let (mut start, mut width) = if dx < 0 {
            ((down_x + dx) as f32 / w, -dx as f32 / w)
        } else {
            (down_x as f32 / w, dx as f32 / w)
        };

        if start < 0.0 {
            width += start;
            start = 0.0;
        }
        if start + width > 1.0 {
            width = 1.0 - start;
        }

        self.start = start;
        self.width = width.max(0.0);
        self.state = SelectionState::Selecting;
        DragAction::Select
    }

    /// Pointer released: a drawn region freezes, an empty one disappears
    pub fn release(&mut self) {
        if self.state == SelectionState::Selecting {
            self.state = if self.width > 0.0 {
                SelectionState::Selected
            } else {
                SelectionState::Idle
            };
        }
    }

    /// Export finished (successfully or not); the region stays selected
    pub fn finish_export(&mut self) {
        if self.state == SelectionState::Exporting {
            self.state = SelectionState::Selected;
        }
    }

    fn stop_selection_playback(&self, manager: &BufferManager) {
        if self.state == SelectionState::PlayingSelection {
            manager.stop_playback();
            debug!("[SELECTION] Playback stopped");
        }
    }

    // ========================================================================
    // Sample mapping and playback
    // ========================================================================

    /// The current region in display samples for a ring of `capacity`
    ///
    /// Returns None when nothing is selected.
    pub fn window(&self, capacity: usize) -> Option<SelectionWindow> {
        if !self.is_active() || capacity == 0 {
            return None;
        }
        let start = ((self.start as f64 * capacity as f64).round() as usize).min(capacity - 1);
        let width = ((self.width as f64 * capacity as f64).round() as usize).min(capacity);
        Some(SelectionWindow { start, width })
    }

    /// Start monitoring the frozen region from its first sample
    pub fn play_selection(&mut self, manager: &BufferManager, scroll_offset: usize) -> Result<()> {
        if self.state != SelectionState::Selected {
            return Err(ResamplerError::invalid(format!(
                "cannot play selection while {}",
                self.state
            )));
        }
        let capacity = manager.capacity();
        let window = self.window(capacity).ok_or(ResamplerError::Uninitialized)?;
        let range = resolve_window(window, scroll_offset, capacity)?;

        manager.start_playback(range.start)?;
        self.state = SelectionState::PlayingSelection;
        debug!("[SELECTION] Playing {} samples from {}", range.len, range.start);
        Ok(())
    }

    /// Poll after each audio block while a region plays
    ///
    /// Once the region's length has been played (or playback was stopped
    /// elsewhere), playback stops, the read cursor rewinds and the selection
    /// returns to Idle. Returns true when that happened.
    pub fn on_playback_tick(&mut self, manager: &BufferManager, scroll_offset: usize) -> bool {
        if self.state != SelectionState::PlayingSelection {
            return false;
        }

        let capacity = manager.capacity();
        let region_len = self
            .window(capacity)
            .and_then(|window| resolve_window(window, scroll_offset, capacity).ok())
            .map(|range| range.len as u64);
        let state = manager.state();

        match region_len {
            Some(len) if state.is_playing && state.samples_played < len => return false,
            _ => {}
        }

        self.stop_selection_playback(manager);
        self.state = SelectionState::Idle;
        debug!("[SELECTION] Playback left the region");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::AudioBuffer;
    use approx::assert_relative_eq;
    use test_case::test_case;

    /// Manager with nothing playing, for pure geometry tests
    fn idle() -> BufferManager {
        BufferManager::new()
    }

    fn selected(view_width: u32, down_x: i32, dx: i32) -> SelectionController {
        let mut selection = SelectionController::new(view_width);
        selection.drag(down_x, dx, &idle());
        selection.release();
        selection
    }

    #[test]
    fn test_default_state_is_idle() {
        let selection = SelectionController::new(800);
        assert_eq!(selection.state(), SelectionState::Idle);
        assert!(!selection.is_active());
        assert!(selection.window(100).is_none());
    }

    #[test]
    fn test_drag_right() {
        let mut selection = SelectionController::new(100);
        assert_eq!(selection.drag(20, 30, &idle()), DragAction::Select);
        assert_eq!(selection.state(), SelectionState::Selecting);

        let (start, width) = selection.bounds();
        assert_relative_eq!(start, 0.2);
        assert_relative_eq!(width, 0.3);
    }

    #[test]
    fn test_drag_left_is_normalized() {
        let mut selection = SelectionController::new(100);
        selection.drag(50, -30, &idle());
        let (start, width) = selection.bounds();
        assert_relative_eq!(start, 0.2);
        assert_relative_eq!(width, 0.3);
    }

    #[test_case(10, -40, 0.0, 0.1 ; "past left edge")]
    #[test_case(80, 50, 0.8, 0.2 ; "past right edge")]
    fn test_drag_is_clamped(down_x: i32, dx: i32, start: f32, width: f32) {
        let mut selection = SelectionController::new(100);
        selection.drag(down_x, dx, &idle());
        let bounds = selection.bounds();
        assert_relative_eq!(bounds.0, start, epsilon = 1e-6);
        assert_relative_eq!(bounds.1, width, epsilon = 1e-6);
    }

    #[test]
    fn test_release_freezes_or_discards() {
        assert_eq!(selected(100, 10, 20).state(), SelectionState::Selected);
        assert_eq!(selected(100, 10, 0).state(), SelectionState::Idle);
    }

    #[test]
    fn test_selected_area_margin() {
        let selection = selected(100, 20, 30);
        assert!(!selection.is_in_selected_area(21));
        assert!(selection.is_in_selected_area(22));
        assert!(selection.is_in_selected_area(48));
        assert!(!selection.is_in_selected_area(49));
    }

    #[test]
    fn test_drag_inside_region_exports() {
        let mut selection = selected(100, 20, 30);
        assert_eq!(selection.drag(30, 5, &idle()), DragAction::Export);
        assert_eq!(selection.state(), SelectionState::Exporting);

        // Region geometry is untouched by the export gesture
        assert_relative_eq!(selection.bounds().0, 0.2);

        selection.finish_export();
        assert_eq!(selection.state(), SelectionState::Selected);
    }

    #[test]
    fn test_drag_outside_region_starts_new_selection() {
        let mut selection = selected(100, 20, 30);
        assert_eq!(selection.drag(70, 10, &idle()), DragAction::Select);
        assert_relative_eq!(selection.bounds().0, 0.7);
    }

    #[test]
    fn test_click_outside_dismisses() {
        let mut selection = selected(100, 20, 30);
        selection.mouse_down(30, &idle());
        assert_eq!(selection.state(), SelectionState::Selected);
        selection.mouse_down(90, &idle());
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_window_in_samples() {
        let selection = selected(100, 25, 50);
        assert_eq!(
            selection.window(1000),
            Some(SelectionWindow {
                start: 250,
                width: 500
            })
        );
    }

    #[test]
    fn test_resolve_window_applies_scroll_offset() {
        let window = SelectionWindow { start: 2, width: 3 };
        let range = resolve_window(window, 5, 8).unwrap();
        assert_eq!(range, SampleRange { start: 5, len: 3 });

        let wrapped = resolve_window(SelectionWindow { start: 6, width: 4 }, 0, 8).unwrap();
        assert_eq!(wrapped, SampleRange { start: 6, len: 4 });

        assert!(matches!(
            resolve_window(window, 0, 0),
            Err(ResamplerError::Uninitialized)
        ));
    }

    #[test]
    fn test_playback_leaves_region_and_returns_to_idle() {
        let manager = BufferManager::new();
        manager.initialize_with_length(1, 8, 1).unwrap();

        // Region covers ring samples 2..6
        let mut selection = selected(8, 2, 4);
        selection.play_selection(&manager, 0).unwrap();
        assert_eq!(selection.state(), SelectionState::PlayingSelection);
        assert_eq!(manager.state().read_position, 2);

        let mut out = AudioBuffer::new(1, 2, 8);
        manager.read(&mut out).unwrap();
        assert!(!selection.on_playback_tick(&manager, 0));

        manager.read(&mut out).unwrap();
        assert!(selection.on_playback_tick(&manager, 0));
        assert_eq!(selection.state(), SelectionState::Idle);

        let state = manager.state();
        assert!(!state.is_playing);
        assert_eq!(state.read_position, 0);
    }

    #[test]
    fn test_full_width_playback_stops_after_one_pass() {
        let manager = BufferManager::new();
        manager.initialize_with_length(1, 8, 1).unwrap();

        let mut selection = selected(8, 0, 8);
        selection.play_selection(&manager, 0).unwrap();

        // The cursor wraps back to the region start; the played count ends it
        let mut out = AudioBuffer::new(1, 4, 8);
        manager.read(&mut out).unwrap();
        assert!(!selection.on_playback_tick(&manager, 0));
        manager.read(&mut out).unwrap();
        assert_eq!(manager.state().read_position, 0);
        assert!(selection.on_playback_tick(&manager, 0));
        assert_eq!(selection.state(), SelectionState::Idle);
        assert!(!manager.state().is_playing);
    }

    #[test]
    fn test_long_block_past_region_end_stops_playback() {
        let manager = BufferManager::new();
        manager.initialize_with_length(1, 8, 1).unwrap();

        // One 9-sample block carries the cursor from 2 past the region and back into it
        let mut selection = selected(8, 2, 3);
        selection.play_selection(&manager, 0).unwrap();
        let mut out = AudioBuffer::new(1, 9, 8);
        manager.read(&mut out).unwrap();
        assert_eq!(manager.state().read_position, 3);

        assert!(selection.on_playback_tick(&manager, 0));
        assert!(!manager.state().is_playing);
    }

    #[test_case(true ; "click outside")]
    #[test_case(false ; "new drag")]
    fn test_dismissing_playing_selection_stops_playback(click: bool) {
        let manager = BufferManager::new();
        manager.initialize_with_length(1, 100, 1).unwrap();

        let mut selection = selected(100, 10, 20);
        selection.play_selection(&manager, 0).unwrap();
        assert_eq!(manager.state().read_position, 10);

        if click {
            selection.mouse_down(90, &manager);
            assert_eq!(selection.state(), SelectionState::Idle);
        } else {
            assert_eq!(selection.drag(60, 10, &manager), DragAction::Select);
            assert_eq!(selection.state(), SelectionState::Selecting);
        }

        let state = manager.state();
        assert!(!state.is_playing);
        assert_eq!(state.read_position, 0);

        // Nothing is mixed into later blocks
        let mut out = AudioBuffer::new(1, 100, 100);
        manager
            .write(&AudioBuffer::from_channels(vec![vec![0.5; 100]], 100).unwrap())
            .unwrap();
        manager.read(&mut out).unwrap();
        assert!(out.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_play_requires_frozen_region() {
        let manager = BufferManager::new();
        manager.initialize_with_length(1, 8, 1).unwrap();

        let mut selection = SelectionController::new(8);
        assert!(selection.play_selection(&manager, 0).is_err());
        assert!(!manager.state().is_playing);
    }
}
