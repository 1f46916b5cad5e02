//! Discrete trigger sensor module
//!
//! Reads a digital motion sensor and turns rising edges into a trigger flag
//! that the capture loop drains. The watcher thread never touches the camera.

mod device;
mod edge;
mod sysfs_gpio;

pub use device::TriggerSensor;
pub use edge::{RisingEdge, TriggerLatch, spawn_edge_watcher};
pub use sysfs_gpio::SysfsGpioSensor;
