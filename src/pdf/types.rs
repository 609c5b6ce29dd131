//! Core types shared by the render pipeline

/// Page dimensions in pixels at scale 1.0
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Landscape pages are wider than they are tall
    #[must_use]
    pub fn is_landscape(self) -> bool {
        self.width > self.height
    }

    /// Dimensions of the page viewport at the given scale
    #[must_use]
    pub fn scaled(self, scale: f32) -> Self {
        Self::new(self.width * scale, self.height * scale)
    }
}

/// Size of the scrollable document container
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Raw rendered page image.
///
/// RGB pixel data, 3 bytes per pixel, rows packed without padding.
/// This is what a host blits onto its drawing surface.
#[derive(Clone)]
pub struct Bitmap {
    /// Raw RGB pixel data (3 bytes per pixel: R, G, B)
    pub pixels: Vec<u8>,
    /// Image width in pixels
    pub width_px: u32,
    /// Image height in pixels
    pub height_px: u32,
}

impl Bitmap {
    /// A bitmap filled with a single color
    #[must_use]
    pub fn filled(width_px: u32, height_px: u32, rgb: (u8, u8, u8)) -> Self {
        let len = width_px as usize * height_px as usize;
        let mut pixels = Vec::with_capacity(len * 3);
        for _ in 0..len {
            pixels.extend_from_slice(&[rgb.0, rgb.1, rgb.2]);
        }
        Self {
            pixels,
            width_px,
            height_px,
        }
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// A page bitmap together with the parameters it was drawn with
#[derive(Clone, Debug)]
pub struct RenderedPage {
    /// Page number (1-based)
    pub page: usize,
    /// Scale the page was drawn at
    pub scale: f32,
    pub bitmap: Bitmap,
}

/// Document metadata reported once the engine has opened a source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: usize,
}

/// Extension trait for Vec operations
pub trait VecExt<T> {
    /// Reset vector to a given length, clearing existing items
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default;
}

impl<T> VecExt<T> for Vec<T> {
    #[inline]
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default,
    {
        self.clear();
        self.resize_with(len, T::default);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_is_derived_from_dimensions() {
        assert!(PageSize::new(842.0, 595.0).is_landscape());
        assert!(!PageSize::new(595.0, 842.0).is_landscape());
        assert!(!PageSize::new(500.0, 500.0).is_landscape());
    }

    #[test]
    fn filled_bitmap_has_rgb_layout() {
        let bmp = Bitmap::filled(4, 2, (1, 2, 3));
        assert_eq!(bmp.pixels.len(), 4 * 2 * 3);
        assert_eq!(&bmp.pixels[..3], &[1, 2, 3]);
    }

    #[test]
    fn reset_to_len_replaces_contents() {
        let mut v = vec![5u8, 6, 7];
        v.reset_to_len(2);
        assert_eq!(v, vec![0, 0]);
    }
}
