//! Raw camera frames.

use image::RgbaImage;

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A single frame snapshotted from the camera stream.
///
/// Pixels are stored as packed RGBA8 at the stream's native resolution.
#[derive(Clone)]
pub struct Frame {
    /// Raw RGBA pixel data, row-major.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Monotonic sequence number within one stream.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame from packed RGBA pixels.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
        }
    }

    /// Creates a frame from packed RGB pixels, widening to RGBA.
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32, sequence: u64) -> Self {
        let pixels = rgb
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
            .collect();
        Self::new(pixels, width, height, sequence)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether the buffer holds exactly `width * height` RGBA pixels.
    pub fn is_valid(&self) -> bool {
        let expected = self.width as usize * self.height as usize * BYTES_PER_PIXEL;
        self.width > 0 && self.pixels.len() == expected
    }

    /// Converts the frame into an owned bitmap.
    ///
    /// Returns `None` if the buffer does not match the dimensions.
    pub fn into_image(self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 640 * 480 * BYTES_PER_PIXEL];
        let frame = Frame::new(pixels, 640, 480, 1);

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let pixels = vec![0u8; 100];
        let frame = Frame::new(pixels, 640, 480, 1);

        assert!(!frame.is_valid());
        assert!(frame.into_image().is_none());
    }

    #[test]
    fn test_rgb_is_widened() {
        let frame = Frame::from_rgb(&[10, 20, 30, 40, 50, 60], 2, 1, 7);
        assert!(frame.is_valid());
        assert_eq!(frame.pixels(), &[10, 20, 30, 255, 40, 50, 60, 255]);

        let image = frame.into_image().unwrap();
        assert_eq!(image.get_pixel(1, 0).0, [40, 50, 60, 255]);
    }
}
