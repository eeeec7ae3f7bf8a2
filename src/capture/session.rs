//! Capture session: camera lifecycle and photo lifecycle for one visitor.
//!
//! ```text
//! Idle → CameraActive → PhotoCaptured ⇄ Cropping
//!                            ↓ apply_crop (finalized)
//!                        Submitting → Done
//!   abort() from anywhere → Idle
//! ```
//!
//! The camera stream is released as soon as a frame is captured, on
//! abort, and when the session is dropped.

use super::{Camera, CameraError, CaptureConfig, PhotoError, VisitorPhoto};
use crate::config::CropConfig;
use crate::crop::{CropEngine, CropError, CropRegion, DragTransition, Point};
use image::RgbaImage;
use thiserror::Error;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    CameraActive,
    /// A bitmap is held; `finalized` once a crop has been applied.
    PhotoCaptured { finalized: bool },
    /// A crop drag is in progress.
    Cropping,
    /// The photo has been handed to a submission that has not completed.
    Submitting,
    Done,
}

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error("camera unavailable: {0}")]
    CaptureUnavailable(#[source] CameraError),
    #[error("frame capture failed: {0}")]
    Capture(#[source] CameraError),
    #[error("camera returned a malformed frame")]
    MalformedFrame,
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error("a submission is already in progress")]
    SubmissionPending,
}

/// Owns one camera and the in-progress photo of one visitor.
pub struct CaptureSession<C: Camera> {
    camera: C,
    capture: CaptureConfig,
    crop: CropEngine,
    photo: Option<RgbaImage>,
    state: SessionState,
    /// Whether the photo had been cropped when submission began.
    submitted_finalized: bool,
}

impl<C: Camera> CaptureSession<C> {
    pub fn new(camera: C, capture: CaptureConfig, crop: CropConfig) -> Self {
        Self {
            camera,
            capture,
            crop: CropEngine::new(crop),
            photo: None,
            state: SessionState::Idle,
            submitted_finalized: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the camera stream is open.
    pub fn is_streaming(&self) -> bool {
        self.camera.is_open()
    }

    /// The working bitmap, if one has been captured.
    pub fn photo(&self) -> Option<&RgbaImage> {
        self.photo.as_ref()
    }

    /// The crop rectangle, while one is positioned.
    pub fn crop_region(&self) -> Option<&CropRegion> {
        self.crop.region()
    }

    /// Whether a crop has been applied to the working bitmap.
    pub fn is_finalized(&self) -> bool {
        matches!(self.state, SessionState::PhotoCaptured { finalized: true })
    }

    /// Requests the camera stream.
    ///
    /// On refusal the session stays `Idle` and the error must be shown to
    /// the operator.
    pub fn start_camera(&mut self) -> Result<(), SessionError> {
        self.expect(SessionState::Idle, "start the camera")?;
        self.camera.open(&self.capture).map_err(|e| {
            tracing::warn!(error = %e, "Camera unavailable");
            SessionError::CaptureUnavailable(e)
        })?;
        self.state = SessionState::CameraActive;
        Ok(())
    }

    /// Snapshots one frame at native resolution and releases the stream.
    pub fn capture_photo(&mut self) -> Result<(), SessionError> {
        self.expect(SessionState::CameraActive, "capture a photo")?;
        let frame = self.camera.capture().map_err(SessionError::Capture)?;
        self.release_camera();

        let sequence = frame.sequence();
        // The stream is already released, so every failure below returns
        // the session to `Idle` where the camera can be started again.
        let Some(image) = frame.into_image() else {
            tracing::warn!(sequence, "Camera returned a malformed frame");
            self.state = SessionState::Idle;
            return Err(SessionError::MalformedFrame);
        };
        if let Err(e) = self.crop.attach(image.width(), image.height()) {
            self.state = SessionState::Idle;
            return Err(e.into());
        }

        tracing::info!(
            width = image.width(),
            height = image.height(),
            sequence,
            "Photo captured"
        );
        self.photo = Some(image);
        self.state = SessionState::PhotoCaptured { finalized: false };
        Ok(())
    }

    pub fn pointer_down(&mut self, pointer: Point) -> Result<DragTransition, SessionError> {
        let SessionState::PhotoCaptured { .. } = self.state else {
            return Err(self.invalid("start a crop drag"));
        };
        let transition = self.crop.pointer_down(pointer)?;
        if transition == DragTransition::Attached {
            self.state = SessionState::Cropping;
        }
        Ok(transition)
    }

    pub fn pointer_move(&mut self, pointer: Point) -> DragTransition {
        if self.state != SessionState::Cropping {
            return DragTransition::Ignored;
        }
        self.crop.pointer_move(pointer)
    }

    pub fn pointer_up(&mut self) -> DragTransition {
        if self.state != SessionState::Cropping {
            return DragTransition::Ignored;
        }
        self.state = SessionState::PhotoCaptured { finalized: false };
        self.crop.pointer_up()
    }

    /// Replaces the working bitmap with the crop-and-resize of the current
    /// region and discards the region.
    pub fn apply_crop(&mut self) -> Result<(), SessionError> {
        let SessionState::PhotoCaptured { .. } = self.state else {
            return Err(self.invalid("apply a crop"));
        };
        let photo = self.photo.as_ref().ok_or(CropError::NotReady)?;
        let cropped = self.crop.extract(photo)?;

        tracing::info!(
            width = cropped.width(),
            height = cropped.height(),
            "Crop applied"
        );
        self.photo = Some(cropped);
        self.crop.discard();
        self.state = SessionState::PhotoCaptured { finalized: true };
        Ok(())
    }

    /// Positions a fresh crop region over the current (possibly already
    /// cropped) bitmap.
    pub fn reopen_crop(&mut self) -> Result<&CropRegion, SessionError> {
        let SessionState::PhotoCaptured { .. } = self.state else {
            return Err(self.invalid("reopen the crop"));
        };
        let (width, height) = self
            .photo
            .as_ref()
            .map(RgbaImage::dimensions)
            .ok_or(CropError::NotReady)?;
        self.state = SessionState::PhotoCaptured { finalized: false };
        Ok(self.crop.attach(width, height)?)
    }

    /// Encodes the working bitmap as the visitor photo.
    pub fn photo_artifact(&self) -> Result<VisitorPhoto, SessionError> {
        let photo = self.photo.as_ref().ok_or(PhotoError::Empty)?;
        Ok(VisitorPhoto::from_image(photo)?)
    }

    /// Hands the photo to a submission. A second call before
    /// [`finish_submit`](Self::finish_submit) is rejected.
    pub fn begin_submit(&mut self) -> Result<VisitorPhoto, SessionError> {
        match self.state {
            SessionState::PhotoCaptured { .. } => {}
            SessionState::Submitting => return Err(SessionError::SubmissionPending),
            _ => return Err(self.invalid("submit")),
        }
        let photo = self.photo_artifact()?;
        self.submitted_finalized = self.is_finalized();
        self.crop.discard();
        self.state = SessionState::Submitting;
        Ok(photo)
    }

    /// Records the outcome of the submission started by
    /// [`begin_submit`](Self::begin_submit).
    ///
    /// On failure the photo is kept so the operator can submit again.
    pub fn finish_submit(&mut self, accepted: bool) {
        if self.state != SessionState::Submitting {
            tracing::debug!(state = ?self.state, "finish_submit without a pending submission");
            return;
        }
        if accepted {
            self.photo = None;
            self.state = SessionState::Done;
        } else {
            self.state = SessionState::PhotoCaptured {
                finalized: self.submitted_finalized,
            };
        }
    }

    /// Releases the camera, drops any drag, region and bitmap, and returns
    /// to `Idle`. Safe to call from any state, any number of times.
    pub fn abort(&mut self) {
        self.release_camera();
        self.crop.discard();
        self.photo = None;
        if self.state != SessionState::Idle {
            tracing::info!(from = ?self.state, "Capture session aborted");
        }
        self.state = SessionState::Idle;
    }

    fn release_camera(&mut self) {
        if self.camera.is_open() {
            self.camera.close();
        }
    }

    fn expect(&self, state: SessionState, operation: &'static str) -> Result<(), SessionError> {
        if self.state == state {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            state: self.state,
        }
    }
}

impl<C: Camera> Drop for CaptureSession<C> {
    fn drop(&mut self) {
        self.release_camera();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Frame, MockCamera};
    use std::cell::Cell;
    use std::rc::Rc;

    fn crop_config() -> CropConfig {
        CropConfig {
            display_width: 640.0,
            display_height: 480.0,
            region_width: 150.0,
            region_height: 200.0,
            output_width: 75,
            output_height: 100,
            grab_tolerance: 10.0,
        }
    }

    fn session() -> CaptureSession<MockCamera> {
        CaptureSession::new(
            MockCamera::new(),
            CaptureConfig::with_dimensions(640, 480),
            crop_config(),
        )
    }

    /// Camera that reports its stream state through a shared flag.
    struct TrackedCamera {
        open: Rc<Cell<bool>>,
        inner: MockCamera,
    }

    impl Camera for TrackedCamera {
        fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
            self.inner.open(config)?;
            self.open.set(true);
            Ok(())
        }

        fn capture(&mut self) -> Result<Frame, CameraError> {
            self.inner.capture()
        }

        fn is_open(&self) -> bool {
            self.inner.is_open()
        }

        fn close(&mut self) {
            self.inner.close();
            self.open.set(false);
        }
    }

    #[test]
    fn test_capture_crop_submit_flow() {
        let mut session = session();
        session.start_camera().unwrap();
        assert_eq!(session.state(), SessionState::CameraActive);
        assert!(session.is_streaming());

        session.capture_photo().unwrap();
        assert!(!session.is_streaming());
        assert_eq!(
            session.state(),
            SessionState::PhotoCaptured { finalized: false }
        );
        assert!(session.crop_region().is_some());

        assert_eq!(
            session.pointer_down(Point::new(20.0, 20.0)).unwrap(),
            DragTransition::Attached
        );
        assert_eq!(session.state(), SessionState::Cropping);
        assert_eq!(
            session.pointer_move(Point::new(120.0, 70.0)),
            DragTransition::Moved(Point::new(100.0, 50.0))
        );
        assert_eq!(session.pointer_up(), DragTransition::Detached);

        session.apply_crop().unwrap();
        assert!(session.is_finalized());
        assert!(session.crop_region().is_none());
        let photo = session.photo().unwrap();
        assert_eq!(photo.dimensions(), (75, 100));

        let artifact = session.begin_submit().unwrap();
        assert!(artifact.as_str().starts_with("data:image/png;base64,"));
        assert!(matches!(
            session.begin_submit(),
            Err(SessionError::SubmissionPending)
        ));

        session.finish_submit(true);
        assert_eq!(session.state(), SessionState::Done);
        assert!(session.photo().is_none());
    }

    #[test]
    fn test_denied_camera_stays_idle() {
        let mut session = CaptureSession::new(
            MockCamera::denied(),
            CaptureConfig::default(),
            crop_config(),
        );
        let result = session.start_camera();
        assert!(matches!(result, Err(SessionError::CaptureUnavailable(_))));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_capture_requires_active_camera() {
        let mut session = session();
        assert!(matches!(
            session.capture_photo(),
            Err(SessionError::InvalidState { .. })
        ));
        assert!(matches!(
            session.apply_crop(),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_abort_twice_is_idle_without_stream() {
        let mut session = session();
        session.start_camera().unwrap();

        session.abort();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_streaming());

        session.abort();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_abort_mid_drag_detaches() {
        let mut session = session();
        session.start_camera().unwrap();
        session.capture_photo().unwrap();
        session.pointer_down(Point::new(10.0, 10.0)).unwrap();

        session.abort();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.crop_region().is_none());
        assert_eq!(
            session.pointer_move(Point::new(200.0, 200.0)),
            DragTransition::Ignored
        );
        assert!(session.photo().is_none());
    }

    #[test]
    fn test_failed_submit_keeps_photo_for_retry() {
        let mut session = session();
        session.start_camera().unwrap();
        session.capture_photo().unwrap();

        session.begin_submit().unwrap();
        session.finish_submit(false);
        assert_eq!(
            session.state(),
            SessionState::PhotoCaptured { finalized: false }
        );
        assert!(session.photo().is_some());

        session.reopen_crop().unwrap();
        session.apply_crop().unwrap();
        session.begin_submit().unwrap();
        session.finish_submit(false);
        assert!(session.is_finalized());
        assert!(session.begin_submit().is_ok());
    }

    #[test]
    fn test_recrop_is_possible() {
        let mut session = session();
        session.start_camera().unwrap();
        session.capture_photo().unwrap();
        session.apply_crop().unwrap();

        let region = session.reopen_crop().unwrap();
        assert_eq!(region.layout().source_size(), (75, 100));
        assert!(!session.is_finalized());
    }

    #[test]
    fn test_drop_releases_stream() {
        let open = Rc::new(Cell::new(false));
        let camera = TrackedCamera {
            open: Rc::clone(&open),
            inner: MockCamera::new(),
        };
        let mut session = CaptureSession::new(camera, CaptureConfig::default(), crop_config());
        session.start_camera().unwrap();
        assert!(open.get());

        drop(session);
        assert!(!open.get());
    }

    /// Camera whose first frame has a truncated pixel buffer.
    struct TruncatingCamera {
        truncated: bool,
        inner: MockCamera,
    }

    impl Camera for TruncatingCamera {
        fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
            self.inner.open(config)
        }

        fn capture(&mut self) -> Result<Frame, CameraError> {
            if !self.truncated {
                self.truncated = true;
                self.inner.capture()?;
                return Ok(Frame::new(vec![0; 3], 2, 2, 1));
            }
            self.inner.capture()
        }

        fn is_open(&self) -> bool {
            self.inner.is_open()
        }

        fn close(&mut self) {
            self.inner.close();
        }
    }

    #[test]
    fn test_malformed_frame_returns_to_idle() {
        let camera = TruncatingCamera {
            truncated: false,
            inner: MockCamera::new(),
        };
        let mut session = CaptureSession::new(camera, CaptureConfig::with_dimensions(64, 48), crop_config());
        session.start_camera().unwrap();

        let err = session.capture_photo().unwrap_err();
        assert!(matches!(err, SessionError::MalformedFrame));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_streaming());
        assert!(session.photo().is_none());

        session.start_camera().unwrap();
        session.capture_photo().unwrap();
        assert_eq!(
            session.state(),
            SessionState::PhotoCaptured { finalized: false }
        );
    }
}
