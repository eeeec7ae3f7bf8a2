//! Camera input, capture sessions and the visitor photo artifact.
//!
//! A [`CaptureSession`] owns one camera and walks the photo through
//! capture, optional crop and submission bookkeeping. The finished bitmap
//! leaves the session as a [`VisitorPhoto`].

mod camera;
mod config;
#[cfg(feature = "camera")]
mod device;
mod frame;
mod photo;
mod session;

pub use camera::{Camera, CameraError, MockCamera};
pub use config::CaptureConfig;
#[cfg(feature = "camera")]
pub use device::DeviceCamera;
pub use frame::Frame;
pub use photo::{PhotoError, VisitorPhoto};
pub use session::{CaptureSession, SessionError, SessionState};
