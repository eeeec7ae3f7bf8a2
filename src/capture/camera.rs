//! Camera stream abstraction.
//!
//! The front desk needs one still per visitor: open the stream, snapshot a
//! frame, release the device. [`MockCamera`] stands in for hardware in tests
//! and on machines without a webcam.

use super::{frame::BYTES_PER_PIXEL, CaptureConfig, Frame};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("camera access denied: {0}")]
    AccessDenied(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
///
/// `open` acquires a video stream and `close` releases it. Implementations
/// must tolerate `close` on an already closed camera.
pub trait Camera {
    /// Opens the stream with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Snapshots the current frame of the stream.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Checks if the stream is currently open.
    fn is_open(&self) -> bool;

    /// Releases the stream.
    fn close(&mut self);
}

/// Mock camera for testing that generates synthetic frames.
///
/// Pixel `(x, y)` of every frame is `[x % 256, y % 256, sequence % 256, 255]`,
/// which lets tests recover source coordinates from cropped output.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
    deny: bool,
    opens: u64,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera whose stream request is always refused.
    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    /// Number of successful `open` calls.
    pub fn opens(&self) -> u64 {
        self.opens
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if self.deny {
            return Err(CameraError::AccessDenied("permission refused".into()));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        self.opens += 1;
        tracing::info!(width = config.width, height = config.height, "MockCamera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        let (width, height) = (config.width, config.height);
        let mut pixels = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[
                    (x % 256) as u8,
                    (y % 256) as u8,
                    (self.sequence % 256) as u8,
                    u8::MAX,
                ]);
            }
        }

        self.sequence += 1;
        Ok(Frame::new(pixels, width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            tracing::info!("MockCamera closed");
        }
    }
}
