//! Crop geometry engine.
//!
//! Keeps a fixed-size rectangle over a displayed bitmap, moves it with
//! pointer drags clamped to the bitmap's rendered (letterboxed) area, and
//! turns the display-space rectangle into a crop-and-resize of the source
//! pixels.
//!
//! ```text
//! pointer events → DragController → CropRegion (display space)
//!                                        ↓ to_source()
//!                  source bitmap → crop_and_resize → output bitmap
//! ```

mod drag;
mod extract;
mod geometry;

pub use drag::{DragController, DragState, DragTransition};
pub use extract::crop_and_resize;
pub use geometry::{CropRegion, Layout, Point, Size, SourceRect};

use crate::config::CropConfig;
use image::RgbaImage;
use thiserror::Error;

/// Errors raised by crop operations.
#[derive(Debug, Error)]
pub enum CropError {
    /// The bitmap has not been laid out yet; retry once it has loaded.
    #[error("bitmap not ready for cropping")]
    NotReady,
    #[error("crop region has zero area")]
    DegenerateRegion,
    #[error("bitmap or display area has no usable size")]
    InvalidLayout,
    #[error("crop source is {actual:?} but the region was laid out for {expected:?}")]
    SourceMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("source rectangle {rect:?} exceeds {width}x{height} bitmap")]
    OutOfBounds {
        rect: SourceRect,
        width: u32,
        height: u32,
    },
}

/// Fixed-size crop rectangle plus its drag gesture, over one bitmap.
#[derive(Debug, Clone)]
pub struct CropEngine {
    config: CropConfig,
    region: Option<CropRegion>,
    drag: DragController,
}

impl CropEngine {
    /// Creates an engine that is not ready until [`attach`](Self::attach)
    /// is called with the loaded bitmap's size.
    pub fn new(config: CropConfig) -> Self {
        let drag = DragController::new(config.grab_tolerance);
        Self {
            config,
            region: None,
            drag,
        }
    }

    /// Lays out a `width` x `height` bitmap and places a fresh region over it.
    pub fn attach(&mut self, width: u32, height: u32) -> Result<&CropRegion, CropError> {
        self.drag.cancel();
        let layout = Layout::fit(width, height, self.config.display_size())?;
        let region = CropRegion::new(layout, self.config.region_size())?;
        tracing::debug!(
            width,
            height,
            rendered_width = layout.rendered().width,
            rendered_height = layout.rendered().height,
            "Crop region attached"
        );
        Ok(&*self.region.insert(region))
    }

    /// Whether a bitmap has been laid out.
    pub fn is_ready(&self) -> bool {
        self.region.is_some()
    }

    /// The current region, if any.
    pub fn region(&self) -> Option<&CropRegion> {
        self.region.as_ref()
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_listening()
    }

    pub fn pointer_down(&mut self, pointer: Point) -> Result<DragTransition, CropError> {
        let region = self.region.as_ref().ok_or(CropError::NotReady)?;
        Ok(self.drag.pointer_down(region, pointer))
    }

    pub fn pointer_move(&mut self, pointer: Point) -> DragTransition {
        match self.region.as_mut() {
            Some(region) => self.drag.pointer_move(region, pointer),
            None => DragTransition::Ignored,
        }
    }

    pub fn pointer_up(&mut self) -> DragTransition {
        self.drag.pointer_up()
    }

    /// The region in source-image pixels.
    pub fn source_rect(&self) -> Result<SourceRect, CropError> {
        self.region.as_ref().ok_or(CropError::NotReady)?.to_source()
    }

    /// Crops `source` at the current region and resamples it to the
    /// configured output size.
    pub fn extract(&self, source: &RgbaImage) -> Result<RgbaImage, CropError> {
        let region = self.region.as_ref().ok_or(CropError::NotReady)?;
        let expected = region.layout().source_size();
        if source.dimensions() != expected {
            return Err(CropError::SourceMismatch {
                expected,
                actual: source.dimensions(),
            });
        }
        crop_and_resize(
            source,
            region.to_source()?,
            self.config.output_width,
            self.config.output_height,
        )
    }

    /// Ends any drag and drops the region.
    pub fn discard(&mut self) {
        self.drag.cancel();
        self.region = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    fn config() -> CropConfig {
        CropConfig {
            display_width: 640.0,
            display_height: 480.0,
            region_width: 150.0,
            region_height: 200.0,
            output_width: 300,
            output_height: 400,
            grab_tolerance: 10.0,
        }
    }

    #[test]
    fn test_not_ready_before_attach() {
        let mut engine = CropEngine::new(config());
        assert!(!engine.is_ready());
        assert!(matches!(
            engine.pointer_down(Point::new(1.0, 1.0)),
            Err(CropError::NotReady)
        ));
        assert!(matches!(engine.source_rect(), Err(CropError::NotReady)));
        assert_eq!(engine.pointer_move(Point::new(5.0, 5.0)), DragTransition::Ignored);
    }

    #[test]
    fn test_extract_maps_display_to_source() {
        let source = RgbaImage::from_fn(1280, 960, |x, y| Rgba([(x / 8) as u8, (y / 8) as u8, 0, 255]));
        let mut engine = CropEngine::new(config());
        engine.attach(1280, 960).unwrap();

        engine.pointer_down(Point::new(10.0, 10.0)).unwrap();
        engine.pointer_move(Point::new(110.0, 60.0));
        engine.pointer_up();

        // Display origin (100, 50) at scale 2 → source (200, 100), 300x400,
        // which matches the output size exactly.
        let out = engine.extract(&source).unwrap();
        assert_eq!(out.dimensions(), (300, 400));
        assert_eq!(out.get_pixel(0, 0).0, [25, 12, 0, 255]);
        assert_eq!(out.get_pixel(299, 399).0, [62, 62, 0, 255]);
    }

    #[test]
    fn test_extract_rejects_other_bitmap() {
        let mut engine = CropEngine::new(config());
        engine.attach(640, 480).unwrap();
        let other = RgbaImage::new(320, 240);
        assert!(matches!(
            engine.extract(&other),
            Err(CropError::SourceMismatch { .. })
        ));
    }

    #[test]
    fn test_discard_cancels_drag() {
        let mut engine = CropEngine::new(config());
        engine.attach(640, 480).unwrap();
        engine.pointer_down(Point::new(5.0, 5.0)).unwrap();
        assert!(engine.is_dragging());

        engine.discard();
        assert!(!engine.is_dragging());
        assert!(!engine.is_ready());
    }

    #[derive(Debug, Clone)]
    enum Gesture {
        Down(f64, f64),
        Move(f64, f64),
        Up,
    }

    fn gesture() -> impl Strategy<Value = Gesture> {
        prop_oneof![
            (-200.0..1200.0f64, -200.0..1200.0f64).prop_map(|(x, y)| Gesture::Down(x, y)),
            (-2000.0..3000.0f64, -2000.0..3000.0f64).prop_map(|(x, y)| Gesture::Move(x, y)),
            Just(Gesture::Up),
        ]
    }

    proptest! {
        #[test]
        fn prop_region_stays_inside_rendered_bitmap(
            source_width in 1u32..4000,
            source_height in 1u32..4000,
            display_width in 50.0..1500.0f64,
            display_height in 50.0..1500.0f64,
            region_width in 1.0..600.0f64,
            region_height in 1.0..600.0f64,
            gestures in proptest::collection::vec(gesture(), 0..40),
        ) {
            let mut engine = CropEngine::new(CropConfig {
                display_width,
                display_height,
                region_width,
                region_height,
                ..config()
            });
            engine.attach(source_width, source_height).unwrap();

            for g in gestures {
                match g {
                    Gesture::Down(x, y) => { engine.pointer_down(Point::new(x, y)).unwrap(); }
                    Gesture::Move(x, y) => { engine.pointer_move(Point::new(x, y)); }
                    Gesture::Up => { engine.pointer_up(); }
                }

                let region = engine.region().unwrap();
                let rendered = region.layout().rendered();
                let at = region.relative_origin();
                prop_assert!(at.x >= 0.0 && at.x <= rendered.width - region.size().width);
                prop_assert!(at.y >= 0.0 && at.y <= rendered.height - region.size().height);
            }
        }
    }
}
