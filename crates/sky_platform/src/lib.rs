pub mod orientation;
pub mod window;

pub use orientation::{request_tilt, NoTiltSensor, TiltPermission, TiltSensor};
pub use window::{create_window, PlatformConfig};
