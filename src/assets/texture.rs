//! Decoded texture images.

use crate::error::AssetError;

/// An RGBA8 image in CPU memory, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// A 1x1 image of a single colour.
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: color.to_vec(),
        }
    }

    /// Decodes any supported image file (JPEG, PNG) into RGBA8.
    pub fn decode(locator: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let image = image::load_from_memory(bytes).map_err(|source| AssetError::Image {
            locator: locator.to_string(),
            source,
        })?;
        let rgba = image.to_rgba8();

        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    /// Builds an RGBA8 image from tightly packed pixels with `channels` components each.
    ///
    /// One channel is treated as grey, two as grey + alpha, three as RGB.
    /// Returns `None` for any other channel count or a size mismatch.
    pub fn from_channels(width: u32, height: u32, channels: usize, pixels: &[u8]) -> Option<Self> {
        let pixel_count = width as usize * height as usize;
        if channels == 0 || channels > 4 || pixels.len() != pixel_count * channels {
            return None;
        }

        let mut rgba = Vec::with_capacity(pixel_count * 4);
        for px in pixels.chunks_exact(channels) {
            let expanded = match *px {
                [g] => [g, g, g, 255],
                [g, a] => [g, g, g, a],
                [r, g, b] => [r, g, b, 255],
                [r, g, b, a] => [r, g, b, a],
                _ => return None,
            };
            rgba.extend_from_slice(&expanded);
        }

        Some(Self {
            width,
            height,
            rgba,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_to_rgba() {
        let mut png = Vec::new();
        let source = image::RgbImage::from_pixel(2, 3, image::Rgb([10, 20, 30]));
        source
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let decoded = ImageData::decode("test.png", &png).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 3));
        assert_eq!(&decoded.rgba[0..4], &[10, 20, 30, 255]);
        assert_eq!(decoded.rgba.len(), 2 * 3 * 4);
    }

    #[test]
    fn garbage_bytes_report_the_locator() {
        let err = ImageData::decode("textures/floor.jpg", b"not an image").unwrap_err();
        assert_eq!(err.locator(), "textures/floor.jpg");
    }

    #[test]
    fn rgb_pixels_expand_to_opaque_rgba() {
        let image = ImageData::from_channels(2, 1, 3, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(image.rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(ImageData::from_channels(2, 1, 3, &[1, 2, 3]).is_none());
    }
}
