use std::path::PathBuf;

use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

use crate::capture_pipeline::camera::device::Camera;
use crate::capture_pipeline::camera::types::Resolution;
use crate::capture_pipeline::codec::decode_image_bytes;
use crate::capture_pipeline::common::error::{CaptureError, Result};
use crate::capture_pipeline::frame::Frame;

const STREAM_BUFFERS: u32 = 4;

struct OpenDevice {
    // Field order matters: the stream must be released before the device.
    stream: Option<Stream<'static>>,
    device: Device,
}

/// V4L2 camera streaming MJPG through memory-mapped buffers.
pub struct V4lCamera {
    path: PathBuf,
    resolution: Resolution,
    inner: Option<OpenDevice>,
}

impl V4lCamera {
    pub fn new(path: impl Into<PathBuf>, resolution: Resolution) -> Self {
        Self {
            path: path.into(),
            resolution,
            inner: None,
        }
    }

    fn configure(device: &Device, resolution: Resolution) -> Result<Stream<'static>> {
        let mut format = device
            .format()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("query format: {}", e)))?;
        format.width = resolution.width;
        format.height = resolution.height;
        format.fourcc = FourCC::new(b"MJPG");

        let applied = device
            .set_format(&format)
            .map_err(|e| CaptureError::TransientCaptureFailure(format!("set format: {}", e)))?;
        if applied.width != resolution.width || applied.height != resolution.height {
            debug!(
                requested = %resolution,
                "Driver negotiated {}x{}",
                applied.width,
                applied.height
            );
        }

        Stream::with_buffers(device, Type::VideoCapture, STREAM_BUFFERS)
            .map_err(|e| CaptureError::TransientCaptureFailure(format!("start stream: {}", e)))
    }
}

impl Camera for V4lCamera {
    fn open(&mut self) -> Result<()> {
        let device = Device::with_path(&self.path).map_err(|e| {
            CaptureError::DeviceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let stream = Self::configure(&device, self.resolution)?;
        info!(device = %self.path.display(), resolution = %self.resolution, "V4L2 device opened");
        self.inner = Some(OpenDevice {
            stream: Some(stream),
            device,
        });
        Ok(())
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        self.resolution = resolution;
        if let Some(open) = self.inner.as_mut() {
            open.stream = None;
            open.stream = Some(Self::configure(&open.device, resolution)?);
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let stream = self
            .inner
            .as_mut()
            .and_then(|open| open.stream.as_mut())
            .ok_or_else(|| CaptureError::TransientCaptureFailure("camera is not streaming".into()))?;
        let (data, meta) = stream
            .next()
            .map_err(|e| CaptureError::TransientCaptureFailure(format!("dequeue buffer: {}", e)))?;
        let used = (meta.bytesused as usize).min(data.len());
        decode_image_bytes(&data[..used])
    }

    fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!(device = %self.path.display(), "V4L2 device closed");
        }
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }
}
