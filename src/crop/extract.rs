//! Crop-and-resize of a source bitmap.

use super::{geometry::SourceRect, CropError};
use image::{imageops, imageops::FilterType, RgbaImage};

/// Resamples `rect` of `source` into a new `target_width` x
/// `target_height` bitmap.
pub fn crop_and_resize(
    source: &RgbaImage,
    rect: SourceRect,
    target_width: u32,
    target_height: u32,
) -> Result<RgbaImage, CropError> {
    if rect.is_empty() || target_width == 0 || target_height == 0 {
        return Err(CropError::DegenerateRegion);
    }
    let (width, height) = source.dimensions();
    let exceeds =
        |start: u32, len: u32, limit: u32| start.checked_add(len).map_or(true, |end| end > limit);
    if exceeds(rect.x, rect.width, width) || exceeds(rect.y, rect.height, height) {
        return Err(CropError::OutOfBounds {
            rect,
            width,
            height,
        });
    }

    let clipped = imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image();
    if clipped.dimensions() == (target_width, target_height) {
        return Ok(clipped);
    }
    Ok(imageops::resize(
        &clipped,
        target_width,
        target_height,
        FilterType::Triangle,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn coordinate_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_same_size_is_a_plain_crop() {
        let source = coordinate_image(200, 200);
        let rect = SourceRect {
            x: 10,
            y: 20,
            width: 30,
            height: 40,
        };
        let out = crop_and_resize(&source, rect, 30, 40).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [10, 20, 0, 255]);
        assert_eq!(out.get_pixel(29, 39).0, [39, 59, 0, 255]);
    }

    #[test]
    fn test_output_has_target_size() {
        let source = coordinate_image(640, 480);
        let rect = SourceRect {
            x: 0,
            y: 0,
            width: 150,
            height: 200,
        };
        let out = crop_and_resize(&source, rect, 300, 400).unwrap();
        assert_eq!(out.dimensions(), (300, 400));
    }

    #[test]
    fn test_rejects_degenerate_and_out_of_bounds() {
        let source = coordinate_image(50, 50);
        let empty = SourceRect {
            x: 0,
            y: 0,
            width: 0,
            height: 10,
        };
        assert!(matches!(
            crop_and_resize(&source, empty, 10, 10),
            Err(CropError::DegenerateRegion)
        ));

        let outside = SourceRect {
            x: 40,
            y: 0,
            width: 20,
            height: 10,
        };
        assert!(matches!(
            crop_and_resize(&source, outside, 10, 10),
            Err(CropError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_rect_past_u32_range_is_out_of_bounds() {
        let source = coordinate_image(50, 50);
        let wrapping = SourceRect {
            x: u32::MAX - 1,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!(matches!(
            crop_and_resize(&source, wrapping, 10, 10),
            Err(CropError::OutOfBounds { .. })
        ));

        let tall = SourceRect {
            x: 0,
            y: 5,
            width: 10,
            height: u32::MAX,
        };
        assert!(matches!(
            crop_and_resize(&source, tall, 10, 10),
            Err(CropError::OutOfBounds { .. })
        ));
    }
}
