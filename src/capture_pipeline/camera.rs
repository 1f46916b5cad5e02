//! Camera module
//!
//! The `Camera` trait is the only thing the capture loop knows about the
//! device. Backends:
//!
//! - `CommandCamera`: runs an external still-capture tool per frame
//! - `V4lCamera`: V4L2 MJPG streaming (requires the `v4l` feature)
//!
//! `CameraRig` layers the detection/capture resolution switching, warm-up,
//! frame discarding and bounded reopen logic on top of any backend.

mod command_camera;
mod device;
mod rig;
pub mod types;
#[cfg(feature = "v4l")]
mod v4l_camera;

pub use command_camera::{CommandCamera, CommandCameraConfig};
pub use device::Camera;
pub use rig::CameraRig;
pub use types::{Resolution, ResolutionMode, RigConfig};
#[cfg(feature = "v4l")]
pub use v4l_camera::V4lCamera;
