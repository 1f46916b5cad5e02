use crate::capture_pipeline::camera::types::Resolution;
use crate::capture_pipeline::common::error::Result;
use crate::capture_pipeline::frame::Frame;

/// A camera device. Implementations may deliver frames on demand or only
/// after a slow external process completes; callers make no assumption
/// about latency.
pub trait Camera {
    fn open(&mut self) -> Result<()>;

    fn set_resolution(&mut self, resolution: Resolution) -> Result<()>;

    fn read_frame(&mut self) -> Result<Frame>;

    /// Releases the device. Safe to call when already closed.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        (**self).set_resolution(resolution)
    }

    fn read_frame(&mut self) -> Result<Frame> {
        (**self).read_frame()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
