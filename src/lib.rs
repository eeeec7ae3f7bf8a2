//! Gate Pass Library
//!
//! Visitor registration for a front desk: capture a visitor's photo,
//! let the operator position a fixed crop rectangle over it, submit the
//! visitor's details and photo to the backend, and print the returned pass.
//!
//! # Architecture
//!
//! ```text
//! camera → CaptureSession ──→ CropEngine (drag, clamp, map, extract)
//!               ↓ photo artifact
//! PassDraft → RecordAssembler → VisitorService → PassCode
//!                                     ↓
//!                   PassRenderer → PrintSink
//! ```
//!
//! The backend side (`server` feature) is an axum REST API over SQLite that
//! mints pass codes, authenticates operators and answers searches and daily
//! register queries.
//!
//! # Example
//!
//! ```
//! use gate_pass::capture::{CaptureSession, CaptureConfig, MockCamera, SessionState};
//! use gate_pass::config::CropConfig;
//! use gate_pass::crop::Point;
//!
//! let mut session = CaptureSession::new(
//!     MockCamera::new(),
//!     CaptureConfig::default(),
//!     CropConfig::default(),
//! );
//! session.start_camera().unwrap();
//! session.capture_photo().unwrap();
//!
//! // Drag the crop rectangle 40 units right, then apply it.
//! session.pointer_down(Point::new(20.0, 20.0)).unwrap();
//! session.pointer_move(Point::new(60.0, 20.0));
//! session.pointer_up();
//! session.apply_crop().unwrap();
//!
//! assert!(session.is_finalized());
//! assert!(!session.is_streaming());
//! let photo = session.photo_artifact().unwrap();
//! assert!(photo.as_str().starts_with("data:image/png;base64,"));
//! # assert!(matches!(session.state(), SessionState::PhotoCaptured { finalized: true }));
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod crop;
pub mod metrics;
pub mod pass;
pub mod register;
#[cfg(feature = "server")]
pub mod server;
pub mod visitor;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, CaptureSession, Frame, MockCamera, SessionState, VisitorPhoto};
pub use config::FileConfig;
pub use crop::{CropEngine, CropError, CropRegion, Point};
pub use pass::{PassRenderer, RenderedPass};
pub use register::DailyRegister;
pub use visitor::{HttpVisitorClient, PassCode, PassDraft, RecordAssembler, VisitorRecord, VisitorService};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
