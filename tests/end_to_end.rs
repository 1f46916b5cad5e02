use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use catnap_watch_rs::capture_pipeline::camera::{Camera, CameraRig, Resolution, RigConfig};
use catnap_watch_rs::capture_pipeline::classify::{
    ClassifierConfig, HeuristicClassifier, SubjectClassifier, SubjectColor,
};
use catnap_watch_rs::capture_pipeline::codec::{JpegWriter, TiffCompression, read_image_file};
use catnap_watch_rs::capture_pipeline::common::{CaptureError, Result};
use catnap_watch_rs::capture_pipeline::controller::{
    CaptureController, ConfirmStrategy, ControllerConfig, TriggerSource,
};
use catnap_watch_rs::capture_pipeline::diff::{DiffParams, score};
use catnap_watch_rs::capture_pipeline::evidence::EvidenceSink;
use catnap_watch_rs::capture_pipeline::frame::{Frame, PixelFormat};
use catnap_watch_rs::capture_pipeline::notify::Notifier;
use catnap_watch_rs::capture_pipeline::reference::ReferenceStore;
use catnap_watch_rs::capture_pipeline::retention::{self, RetentionPolicy};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// 640x480 color scene: dim background with a 50x100 (5000 pixel) white blob.
/// Mean brightness is just under 80.
fn blob_scene() -> Frame {
    let (width, height) = (640, 480);
    let mut frame = Frame::filled(width, height, PixelFormat::Rgb8, 77);
    let data = frame.data_mut();
    for y in 200..300 {
        for x in 300..350 {
            let i = (y * width + x) * 3;
            data[i..i + 3].copy_from_slice(&[255, 255, 255]);
        }
    }
    frame
}

#[test]
fn bright_blob_against_black_baseline_is_a_dark_subject() {
    let dir = tempfile::tempdir().unwrap();
    let store = ReferenceStore::new(dir.path().join("baseline/reference.tiff"), TiffCompression::None);
    let baseline = store
        .ensure(|| Ok(Frame::filled(320, 240, PixelFormat::Gray8, 0)))
        .unwrap();
    assert_eq!(baseline.dimensions(), (320, 240));
    assert!(store.exists());

    let scene = blob_scene();
    let brightness = scene.mean_brightness().unwrap();
    assert!((brightness - 80.0).abs() < 0.5, "mean brightness {}", brightness);

    let classifier = HeuristicClassifier::new(ClassifierConfig {
        min_brightness: 50.0,
        light_cutoff: 100.0,
        ..ClassifierConfig::default()
    });
    assert!(classifier.is_subject_present(&scene));
    assert_eq!(classifier.color_class(&scene), SubjectColor::Dark);

    // Capture-resolution frames are never silently compared with the baseline.
    let err = score(&scene.to_gray(), &baseline, &DiffParams::default()).unwrap_err();
    assert!(matches!(err, CaptureError::DimensionMismatch { .. }));
}

#[test]
fn sweep_keeps_the_fifty_newest_of_sixty() {
    let dir = tempfile::tempdir().unwrap();
    let now = SystemTime::now();
    for age in 1..=60u32 {
        let path = dir.path().join(format!("cat_{age:02}.jpg"));
        File::create(&path).unwrap().set_modified(now - DAY * age).unwrap();
    }

    let deleted = retention::sweep(dir.path(), 50).unwrap();
    assert_eq!(deleted, 10);

    let remaining = retention::list_evidence(dir.path()).unwrap();
    assert_eq!(remaining.len(), 50);
    for file in &remaining {
        let age = now.duration_since(file.modified).unwrap();
        assert!(age <= DAY * 50 + Duration::from_secs(60), "{:?} survived", file.path);
    }
    for age in 51..=60u32 {
        assert!(!dir.path().join(format!("cat_{age:02}.jpg")).exists());
    }

    assert_eq!(retention::sweep(dir.path(), 50).unwrap(), 0);
}

/// Dark room at detection resolution, then the lights come on; the capture
/// frame is the blob scene.
struct ScriptedCamera {
    open: Arc<AtomicBool>,
    resolution: Resolution,
    detection_reads: usize,
}

impl Camera for ScriptedCamera {
    fn open(&mut self) -> Result<()> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        self.resolution = resolution;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        if self.resolution == Resolution::new(640, 480) {
            return Ok(blob_scene());
        }
        self.detection_reads += 1;
        let value = if self.detection_reads == 1 { 0 } else { 200 };
        Ok(Frame::filled(320, 240, PixelFormat::Rgb8, value))
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Records deliveries and stops the loop after the first one.
struct StopAfterFirst {
    running: Arc<AtomicBool>,
    delivered: Arc<Mutex<Vec<(SubjectColor, Option<PathBuf>)>>>,
}

impl Notifier for StopAfterFirst {
    fn notify(&mut self, color: SubjectColor, evidence: Option<&Path>) -> bool {
        self.delivered
            .lock()
            .unwrap()
            .push((color, evidence.map(Path::to_path_buf)));
        self.running.store(false, Ordering::SeqCst);
        true
    }
}

#[test]
fn polling_loop_records_and_notifies_then_releases_camera() {
    let dir = tempfile::tempdir().unwrap();
    let photos = dir.path().join("photos");
    let running = Arc::new(AtomicBool::new(true));
    let camera_open = Arc::new(AtomicBool::new(false));
    let delivered = Arc::new(Mutex::new(Vec::new()));

    let rig = CameraRig::new(
        ScriptedCamera {
            open: camera_open.clone(),
            resolution: Resolution::new(320, 240),
            detection_reads: 0,
        },
        RigConfig {
            detection: Resolution::new(320, 240),
            capture: Resolution::new(640, 480),
            warmup: Duration::ZERO,
            settle: Duration::ZERO,
            discard_frames: 0,
            max_reopen_attempts: 3,
        },
    );
    let config = ControllerConfig::builder()
        .trigger(TriggerSource::Interval)
        .confirm(ConfirmStrategy::PreviousFrameDiff)
        .poll_interval(Duration::ZERO)
        .build();
    let mut controller = CaptureController::new(
        config,
        rig,
        ReferenceStore::new(dir.path().join("baseline/reference.tiff"), TiffCompression::None),
        EvidenceSink::new(&photos, "cat", Box::new(JpegWriter::new(85))),
        RetentionPolicy::new(&photos, 50, Duration::from_secs(3600), Instant::now()).unwrap(),
        StopAfterFirst {
            running: running.clone(),
            delivered: delivered.clone(),
        },
    );

    controller.run(&running).unwrap();

    let delivered = delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    let (color, path) = &delivered[0];
    assert_eq!(*color, SubjectColor::Dark);
    let path = path.as_ref().unwrap();
    assert!(path.starts_with(&photos));
    assert_eq!(path.extension().unwrap(), "jpg");
    assert_eq!(read_image_file(path).unwrap().dimensions(), (640, 480));
    assert!(!camera_open.load(Ordering::SeqCst));
}
