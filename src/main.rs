//! catnap-watch
//!
//! Watches a camera (optionally paired with a motion sensor), records
//! evidence of visiting subjects and keeps the evidence directory trimmed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Instant, SystemTime};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use catnap_watch_rs::capture_pipeline::camera::{Camera, CameraRig, CommandCamera};
use catnap_watch_rs::capture_pipeline::codec::{
    EvidenceFormat, FrameWriter, JpegWriter, StandardTiffWriter, TiffCompression,
};
use catnap_watch_rs::capture_pipeline::controller::{CaptureController, TriggerSource};
use catnap_watch_rs::capture_pipeline::evidence::EvidenceSink;
use catnap_watch_rs::capture_pipeline::notify::{CommandNotifier, LogNotifier, Notifier};
use catnap_watch_rs::capture_pipeline::reference::ReferenceStore;
use catnap_watch_rs::capture_pipeline::retention::{self, RetentionPolicy};
use catnap_watch_rs::capture_pipeline::sensor::{SysfsGpioSensor, spawn_edge_watcher};
use catnap_watch_rs::logger;
use catnap_watch_rs::settings::{self, CameraBackend, WatchSettings};

/// Camera event detection and adaptive capture
#[derive(Parser, Debug)]
#[command(name = "catnap-watch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the capture loop until interrupted (default)
    Watch,
    /// Capture a fresh reference image and replace the stored one
    Rebaseline,
    /// Run one retention sweep over the evidence directory
    Sweep {
        /// Override the configured maximum evidence count
        #[arg(long)]
        max_count: Option<usize>,
        /// List what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
    /// Print evidence directory statistics
    Info,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => settings::load_config(path)?,
        None => {
            let defaults = WatchSettings::default();
            defaults.validate()?;
            defaults
        }
    };

    logger::init(settings.log_file.as_deref()).context("Failed to open log file")?;

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&settings),
        Command::Rebaseline => rebaseline(&settings),
        Command::Sweep { max_count, dry_run } => {
            sweep(&settings, max_count.unwrap_or(settings.retention.max_count), dry_run)
        }
        Command::Info => print_info(&settings),
    }
}

fn build_camera(settings: &WatchSettings) -> Result<Box<dyn Camera>> {
    match settings.camera.backend {
        CameraBackend::Command => {
            Ok(Box::new(CommandCamera::new(settings.command_camera_config())))
        }
        #[cfg(feature = "v4l")]
        CameraBackend::V4l => Ok(Box::new(
            catnap_watch_rs::capture_pipeline::camera::V4lCamera::new(
                &settings.camera.device,
                settings.camera.detection,
            ),
        )),
        #[cfg(not(feature = "v4l"))]
        CameraBackend::V4l => bail!("camera backend \"v4l\" requires building with --features v4l"),
    }
}

fn build_notifier(settings: &WatchSettings) -> Box<dyn Notifier> {
    match &settings.notifier.command {
        Some(program) => Box::new(CommandNotifier::new(program.clone(), settings.notifier.args.clone())),
        None => Box::new(LogNotifier),
    }
}

fn build_writer(settings: &WatchSettings) -> Box<dyn FrameWriter + Send> {
    match settings.evidence.format {
        EvidenceFormat::Jpeg => Box::new(JpegWriter::new(settings.evidence.jpeg_quality)),
        EvidenceFormat::Tiff => Box::new(StandardTiffWriter::new(TiffCompression::Deflate)),
    }
}

fn build_controller(
    settings: &WatchSettings,
) -> Result<CaptureController<Box<dyn Camera>, Box<dyn Notifier>>> {
    let rig = CameraRig::new(build_camera(settings)?, settings.rig_config());
    let retention = RetentionPolicy::new(
        &settings.evidence.directory,
        settings.retention.max_count,
        settings.retention.interval(),
        Instant::now(),
    )?;
    Ok(CaptureController::new(
        settings.controller_config(),
        rig,
        ReferenceStore::new(&settings.reference.path, settings.reference.compression),
        EvidenceSink::new(
            &settings.evidence.directory,
            settings.evidence.prefix.clone(),
            build_writer(settings),
        ),
        retention,
        build_notifier(settings),
    ))
}

fn watch(settings: &WatchSettings) -> Result<()> {
    info!("Starting catnap-watch...");
    let mut controller = build_controller(settings)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .context("Failed to install interrupt handler")?;
    }

    let watcher = match settings.trigger.source {
        TriggerSource::EdgeSensor => {
            let latch = controller.trigger_latch();
            let sensor = SysfsGpioSensor::new(&settings.trigger.gpio_value_path);
            info!(gpio = %sensor.value_path().display(), "Watching trigger sensor");
            let handle = spawn_edge_watcher(
                sensor,
                controller.config().sensor_poll_interval,
                running.clone(),
                move || latch.fire(),
            )
            .context("Failed to start edge watcher")?;
            Some(handle)
        }
        TriggerSource::Interval => None,
    };

    let result = controller.run(&running);

    running.store(false, Ordering::SeqCst);
    if let Some(handle) = watcher {
        if handle.join().is_err() {
            warn!("Edge watcher thread panicked");
        }
    }

    result.context("Capture loop stopped")?;
    info!("catnap-watch stopped");
    Ok(())
}

fn rebaseline(settings: &WatchSettings) -> Result<()> {
    let mut controller = build_controller(settings)?;
    controller
        .rig_mut()
        .open()
        .context("Failed to open camera")?;
    let result = controller.rebaseline();
    controller.shutdown();
    result.context("Failed to capture reference image")?;
    println!("Reference image saved to {}", settings.reference.path.display());
    Ok(())
}

fn sweep(settings: &WatchSettings, max_count: usize, dry_run: bool) -> Result<()> {
    if max_count == 0 {
        bail!("--max-count must be positive");
    }
    let directory = &settings.evidence.directory;

    if dry_run {
        let doomed = retention::plan_sweep(directory, max_count)?;
        for file in &doomed {
            println!("would delete {} ({})", file.path.display(), format_time(file.modified));
        }
        println!("{} file(s) would be deleted, keeping {}", doomed.len(), max_count);
        return Ok(());
    }

    let deleted = retention::sweep(directory, max_count)?;
    println!("Deleted {} file(s), keeping at most {}", deleted, max_count);
    Ok(())
}

fn print_info(settings: &WatchSettings) -> Result<()> {
    let directory: &Path = &settings.evidence.directory;
    let info = retention::storage_info(directory)?;
    let max_count = settings.retention.max_count;

    println!("Evidence directory: {}", directory.display());
    println!("Files:              {}", info.file_count);
    println!("Total size:         {:.2} MB", info.total_size_mb);
    if let (Some(oldest), Some(newest)) = (info.oldest, info.newest) {
        println!("Oldest:             {}", format_time(oldest));
        println!("Newest:             {}", format_time(newest));
    }
    println!("Limit:              {}", max_count);
    println!("Over limit:         {}", info.file_count.saturating_sub(max_count));
    Ok(())
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M:%S").to_string()
}
