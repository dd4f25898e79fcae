//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::engine::buffer::{calculate_peak, linear_to_db};
use crate::engine::{
    export_selection, import_wav, AudioBuffer, BufferManager, DragAction, ExportFormat,
    SelectionController, WaveformCache, DEFAULT_BUFFER_LENGTH_SECS, DURATION_PRESETS,
    MAX_BUFFER_LENGTH_SECS,
};
use crate::error::{ResamplerError, Result};
use crate::state::{persisted_duration, JsonSettingsFile, Properties, SettingsStore};

/// Pixel width of the virtual view used to place selections
const VIEW_WIDTH: u32 = 1000;

/// Options for [`capture`]
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub block_size: usize,
    pub duration: Option<u32>,
    pub start: f32,
    pub width: f32,
    pub scroll: usize,
    pub out: Option<PathBuf>,
}

/// Open the settings file given on the command line, or the per-user one
pub fn open_settings(path: Option<&Path>) -> Result<JsonSettingsFile> {
    match path {
        Some(path) => JsonSettingsFile::open(path),
        None => JsonSettingsFile::open_default(),
    }
}

/// Stream `input` through a fresh capture ring and export the selection
///
/// Returns the path of the exported take, or None if the selection was
/// empty.
pub fn capture(
    input: &Path,
    options: &CaptureOptions,
    settings: &mut dyn SettingsStore,
) -> Result<Option<PathBuf>> {
    if options.block_size == 0 {
        return Err(ResamplerError::invalid("block size must be positive"));
    }
    if !(0.0..=1.0).contains(&options.start) || !(0.0..=1.0).contains(&options.width) {
        return Err(ResamplerError::invalid(
            "selection start and width are fractions between 0 and 1",
        ));
    }

    let source = import_wav(input)?;
    info!(
        "Streaming {} ({} ch, {} Hz, {:.2}s) in blocks of {}",
        input.display(),
        source.num_channels(),
        source.sample_rate,
        source.duration_secs(),
        options.block_size
    );

    let manager = BufferManager::new();
    match options.duration {
        Some(secs) => {
            manager.initialize_with_length(source.num_channels(), source.sample_rate, secs)?
        }
        None => manager.initialize(source.num_channels(), source.sample_rate, settings)?,
    }

    let mut waveform = WaveformCache::default();
    let mut output = AudioBuffer::new(source.num_channels(), 0, source.sample_rate);
    let total = source.num_samples();
    let mut pos = 0;
    while pos < total {
        let len = options.block_size.min(total - pos);
        let block = AudioBuffer::from_channels(
            source
                .samples
                .iter()
                .map(|ch| ch[pos..pos + len].to_vec())
                .collect(),
            source.sample_rate,
        )?;

        // Pass-through plus monitoring, as the processor callback does
        output.clone_from(&block);
        manager.write(&block)?;
        manager.read(&mut output)?;
        waveform.update(&manager);

        pos += len;
    }

    let state = manager.state();
    println!(
        "Ring: {}s ({} samples/channel), {}",
        manager.length(),
        manager.capacity(),
        state
    );
    println!(
        "Recording line at {:.1}% of the view",
        waveform.recording_line() * 100.0
    );
    if let Some(peak) = manager.with_buffer(|ring, _| calculate_peak(ring)) {
        println!("Ring peak: {:.1} dBFS", linear_to_db(peak));
    }

    let mut selection = SelectionController::new(VIEW_WIDTH);
    let down_x = (options.start * VIEW_WIDTH as f32).round() as i32;
    let dx = (options.width * VIEW_WIDTH as f32).round() as i32;
    selection.drag(down_x, dx, &manager);
    selection.release();

    let Some(window) = selection.window(manager.capacity()) else {
        println!("Empty selection, nothing exported");
        return Ok(None);
    };

    let recording_dir = options
        .out
        .clone()
        .unwrap_or_else(|| Properties::load(settings).recording_path);

    // Dragging inside a frozen region is the export gesture
    if selection.drag(down_x + dx / 2, 1, &manager) != DragAction::Export {
        warn!("Selection too narrow for an export gesture, exporting directly");
    }
    let exported = export_selection(
        &manager,
        window,
        options.scroll,
        &recording_dir,
        ExportFormat::default(),
    );
    selection.finish_export();

    match &exported {
        Ok(Some(path)) => println!("Exported: {}", path.display()),
        Ok(None) => println!("Empty selection, nothing exported"),
        Err(e) => eprintln!("{}", e.friendly_message()),
    }
    exported
}

/// Show stored settings, applying any changes first
pub fn settings(
    store: &mut dyn SettingsStore,
    duration: Option<u32>,
    theme: Option<&str>,
    recording_path: Option<&Path>,
) -> Result<()> {
    let mut properties = Properties::load(store);
    let mut length = persisted_duration(store).unwrap_or(DEFAULT_BUFFER_LENGTH_SECS);

    let changed = duration.is_some() || theme.is_some() || recording_path.is_some();
    if let Some(secs) = duration {
        if secs == 0 || secs > MAX_BUFFER_LENGTH_SECS {
            return Err(ResamplerError::invalid(format!(
                "buffer length must be between 1 and {} seconds",
                MAX_BUFFER_LENGTH_SECS
            )));
        }
        if !DURATION_PRESETS.contains(&secs) {
            warn!("{}s is not one of the presets {:?}", secs, DURATION_PRESETS);
        }
        length = secs;
    }
    if let Some(theme) = theme {
        properties.theme = theme.parse()?;
    }
    if let Some(path) = recording_path {
        properties.recording_path = path.to_path_buf();
    }

    if changed {
        properties.save(store, length)?;
        info!("Settings updated");
    }

    println!("Buffer length:  {}s", length);
    println!("Theme:          {:?}", properties.theme);
    println!("Recording path: {}", properties.recording_path.display());
    println!("Window size:    {}x{}", properties.width, properties.height);

    Ok(())
}
