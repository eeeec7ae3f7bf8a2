//! Display-space geometry: letterbox layout, the crop region and its
//! mapping into source pixels.

use super::CropError;

/// A point in display space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A size in display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// A rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRect {
    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// How a source bitmap sits inside the display area.
///
/// The bitmap is scaled to fit while keeping its aspect ratio; the
/// remainder of the display area is letterbox margin split evenly on
/// both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    source_width: u32,
    source_height: u32,
    display: Size,
    rendered: Size,
    offset: Point,
}

impl Layout {
    /// Fits a `source_width` x `source_height` bitmap into `display`.
    pub fn fit(source_width: u32, source_height: u32, display: Size) -> Result<Self, CropError> {
        if source_width == 0 || source_height == 0 || !display.is_positive() {
            return Err(CropError::InvalidLayout);
        }

        let image_aspect = source_width as f64 / source_height as f64;
        let display_aspect = display.width / display.height;

        let (rendered, offset) = if display_aspect > image_aspect {
            // Constrained by height: bars left and right.
            let width = source_width as f64 * (display.height / source_height as f64);
            (
                Size::new(width, display.height),
                Point::new((display.width - width) / 2.0, 0.0),
            )
        } else {
            // Constrained by width: bars top and bottom.
            let height = source_height as f64 * (display.width / source_width as f64);
            (
                Size::new(display.width, height),
                Point::new(0.0, (display.height - height) / 2.0),
            )
        };

        Ok(Self {
            source_width,
            source_height,
            display,
            rendered,
            offset,
        })
    }

    /// Source bitmap dimensions in pixels.
    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// The display area.
    pub fn display(&self) -> Size {
        self.display
    }

    /// The size the bitmap is drawn at.
    pub fn rendered(&self) -> Size {
        self.rendered
    }

    /// Top-left corner of the drawn bitmap within the display area.
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Source pixels per display unit, per axis.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.source_width as f64 / self.rendered.width,
            self.source_height as f64 / self.rendered.height,
        )
    }
}

/// A fixed-size rectangle positioned over the rendered bitmap.
///
/// The position is held relative to the rendered bitmap's top-left corner
/// and always satisfies `0 <= x <= rendered.width - size.width` (likewise
/// for `y`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    relative: Point,
    size: Size,
    layout: Layout,
}

impl CropRegion {
    /// Places a region of `requested` size at the rendered bitmap's
    /// top-left corner, shrinking it (aspect preserved) if it does not fit.
    pub(crate) fn new(layout: Layout, requested: Size) -> Result<Self, CropError> {
        if !requested.is_positive() {
            return Err(CropError::DegenerateRegion);
        }
        let rendered = layout.rendered();
        let shrink = (rendered.width / requested.width)
            .min(rendered.height / requested.height)
            .min(1.0);
        let size = Size::new(
            (requested.width * shrink).min(rendered.width),
            (requested.height * shrink).min(rendered.height),
        );
        if shrink < 1.0 {
            tracing::debug!(
                requested_width = requested.width,
                requested_height = requested.height,
                width = size.width,
                height = size.height,
                "Crop region shrunk to fit rendered bitmap"
            );
        }

        Ok(Self {
            relative: Point::default(),
            size,
            layout,
        })
    }

    /// Top-left corner in display space.
    pub fn origin(&self) -> Point {
        let offset = self.layout.offset();
        Point::new(offset.x + self.relative.x, offset.y + self.relative.y)
    }

    /// Top-left corner relative to the rendered bitmap.
    pub fn relative_origin(&self) -> Point {
        self.relative
    }

    /// Fixed region size in display units.
    pub fn size(&self) -> Size {
        self.size
    }

    /// The layout the region is positioned against.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Whether `point` falls inside the region grown by `tolerance` on
    /// every side.
    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        let origin = self.origin();
        point.x >= origin.x - tolerance
            && point.x <= origin.x + self.size.width + tolerance
            && point.y >= origin.y - tolerance
            && point.y <= origin.y + self.size.height + tolerance
    }

    /// Moves the top-left corner towards `origin` (display space), clamped
    /// to the rendered bitmap. Returns whether the position changed.
    pub(crate) fn move_to(&mut self, origin: Point) -> bool {
        let offset = self.layout.offset();
        let rendered = self.layout.rendered();
        let max_x = rendered.width - self.size.width;
        let max_y = rendered.height - self.size.height;

        let clamped = Point::new(
            (origin.x - offset.x).max(0.0).min(max_x),
            (origin.y - offset.y).max(0.0).min(max_y),
        );
        if clamped == self.relative {
            return false;
        }
        self.relative = clamped;
        true
    }

    /// Maps the region into source-image pixels.
    ///
    /// `source = (origin - letterbox offset) * scale`, rounded to whole
    /// pixels and clipped to the source bounds.
    pub fn to_source(&self) -> Result<SourceRect, CropError> {
        let (scale_x, scale_y) = self.layout.scale();
        let (source_width, source_height) = self.layout.source_size();

        let x = ((self.relative.x * scale_x).round() as u32).min(source_width);
        let y = ((self.relative.y * scale_y).round() as u32).min(source_height);
        let width = ((self.size.width * scale_x).round() as u32).min(source_width - x);
        let height = ((self.size.height * scale_y).round() as u32).min(source_height - y);

        let rect = SourceRect {
            x,
            y,
            width,
            height,
        };
        if rect.is_empty() {
            return Err(CropError::DegenerateRegion);
        }
        Ok(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_display_letterboxes_horizontally() {
        let layout = Layout::fit(640, 480, Size::new(800.0, 480.0)).unwrap();
        assert_eq!(layout.rendered(), Size::new(640.0, 480.0));
        assert_eq!(layout.offset(), Point::new(80.0, 0.0));
        assert_eq!(layout.scale(), (1.0, 1.0));
    }

    #[test]
    fn test_tall_display_letterboxes_vertically() {
        let layout = Layout::fit(1280, 720, Size::new(640.0, 640.0)).unwrap();
        assert_eq!(layout.rendered(), Size::new(640.0, 360.0));
        assert_eq!(layout.offset(), Point::new(0.0, 140.0));
        assert_eq!(layout.scale(), (2.0, 2.0));
    }

    #[test]
    fn test_zero_source_is_invalid() {
        assert!(matches!(
            Layout::fit(0, 480, Size::new(640.0, 480.0)),
            Err(CropError::InvalidLayout)
        ));
    }

    #[test]
    fn test_region_clamps_inside_rendered_area() {
        let layout = Layout::fit(640, 480, Size::new(800.0, 480.0)).unwrap();
        let mut region = CropRegion::new(layout, Size::new(300.0, 400.0)).unwrap();
        assert_eq!(region.origin(), Point::new(80.0, 0.0));

        // Into the left letterbox bar: stays at the bitmap edge.
        assert!(!region.move_to(Point::new(10.0, 0.0)));
        assert_eq!(region.origin(), Point::new(80.0, 0.0));

        region.move_to(Point::new(1000.0, 1000.0));
        assert_eq!(region.relative_origin(), Point::new(340.0, 80.0));
        assert_eq!(region.origin(), Point::new(420.0, 80.0));
    }

    #[test]
    fn test_oversized_region_shrinks_to_fit() {
        let layout = Layout::fit(320, 240, Size::new(320.0, 240.0)).unwrap();
        let region = CropRegion::new(layout, Size::new(300.0, 400.0)).unwrap();
        assert_eq!(region.size(), Size::new(180.0, 240.0));
    }

    #[test]
    fn test_hit_test_with_tolerance() {
        let layout = Layout::fit(640, 480, Size::new(640.0, 480.0)).unwrap();
        let region = CropRegion::new(layout, Size::new(100.0, 100.0)).unwrap();

        assert!(region.contains(Point::new(50.0, 50.0), 0.0));
        assert!(!region.contains(Point::new(105.0, 50.0), 0.0));
        assert!(region.contains(Point::new(105.0, 50.0), 10.0));
        assert!(!region.contains(Point::new(115.0, 50.0), 10.0));
    }

    #[test]
    fn test_source_mapping_subtracts_letterbox() {
        // 1280x960 shown at 640x480 inside an 800x480 area.
        let layout = Layout::fit(1280, 960, Size::new(800.0, 480.0)).unwrap();
        let mut region = CropRegion::new(layout, Size::new(150.0, 200.0)).unwrap();
        region.move_to(Point::new(80.0 + 100.0, 50.0));

        let rect = region.to_source().unwrap();
        assert_eq!(
            rect,
            SourceRect {
                x: 200,
                y: 100,
                width: 300,
                height: 400
            }
        );
    }

    #[test]
    fn test_mapping_round_trips_to_display() {
        let layout = Layout::fit(1920, 1080, Size::new(640.0, 480.0)).unwrap();
        let mut region = CropRegion::new(layout, Size::new(120.0, 160.0)).unwrap();
        region.move_to(Point::new(213.0, 201.0));

        let rect = region.to_source().unwrap();
        let (scale_x, scale_y) = layout.scale();
        let back_x = rect.x as f64 / scale_x + layout.offset().x;
        let back_y = rect.y as f64 / scale_y + layout.offset().y;

        let origin = region.origin();
        assert!((back_x - origin.x).abs() <= 0.5 / scale_x + f64::EPSILON);
        assert!((back_y - origin.y).abs() <= 0.5 / scale_y + f64::EPSILON);
        assert!((rect.width as f64 / scale_x - 120.0).abs() <= 0.5 / scale_x + 1e-9);
    }
}
