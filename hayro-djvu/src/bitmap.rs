//! Bi-level bitmaps.

use alloc::vec;
use alloc::vec::Vec;

/// A bi-level bitmap.
///
/// Pixels are stored as booleans in row-major order, where `true` means black
/// (foreground) and `false` means white (background). Row 0 is the top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Bitmap {
    /// Create a new white bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// The width of the bitmap in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height of the bitmap in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixels of the bitmap, one bool per pixel in row-major order.
    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Whether the bitmap has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the pixel at (x, y). Pixels outside the bitmap are white.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }

        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Set the pixel at (x, y). Pixels outside the bitmap are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, black: bool) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.data[(y as usize) * (self.width as usize) + x as usize] = black;
    }

    /// Get the pixel at signed coordinates as `0` or `1`, treating
    /// everything outside the bitmap as white.
    ///
    /// Context templates reach up to two pixels past each edge.
    #[inline(always)]
    pub(crate) fn bit(&self, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 {
            return 0;
        }

        self.get_pixel(x as u32, y as u32) as u32
    }

    /// Crop the bitmap to the bounding box of its black pixels.
    ///
    /// A bitmap without any black pixels becomes empty.
    pub fn trim(&self) -> Self {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;

        for y in 0..self.height {
            for x in 0..self.width {
                if !self.get_pixel(x, y) {
                    continue;
                }

                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }

        let Some((x0, y0, x1, y1)) = bounds else {
            return Self::new(0, 0);
        };

        if x0 == 0 && y0 == 0 && x1 + 1 == self.width && y1 + 1 == self.height {
            return self.clone();
        }

        let mut trimmed = Self::new(x1 - x0 + 1, y1 - y0 + 1);

        for y in 0..trimmed.height {
            let start = ((y + y0) as usize) * (self.width as usize) + x0 as usize;
            let row = &self.data[start..start + trimmed.width as usize];
            let dest = (y as usize) * (trimmed.width as usize);
            trimmed.data[dest..dest + row.len()].copy_from_slice(row);
        }

        trimmed
    }

    /// Paint the black pixels of `other` onto this bitmap, with the top-left
    /// corner of `other` at (x, y). Parts outside this bitmap are clipped.
    pub(crate) fn blit(&mut self, other: &Self, x: i64, y: i64) {
        for sy in 0..other.height {
            let dy = y + i64::from(sy);

            if dy < 0 {
                continue;
            }

            if dy >= i64::from(self.height) {
                break;
            }

            for sx in 0..other.width {
                let dx = x + i64::from(sx);

                if dx < 0 || !other.get_pixel(sx, sy) {
                    continue;
                }

                if dx >= i64::from(self.width) {
                    break;
                }

                self.set_pixel(dx as u32, dy as u32, true);
            }
        }
    }

    /// Convert the bitmap into 8-bit grayscale, with black as `0` and white
    /// as `255`.
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&black| if black { 0 } else { 255 })
            .collect()
    }

    /// Pack the bitmap into one bit per pixel.
    ///
    /// Returns the stride in bytes and the packed rows. Within each byte the
    /// most significant bit comes first, a set bit means black and each row
    /// is padded to a full byte. This is the raster layout of binary PBM
    /// files.
    pub fn to_packed(&self) -> (usize, Vec<u8>) {
        let stride = (self.width as usize).div_ceil(8);
        let mut packed = vec![0; stride * self.height as usize];

        if stride == 0 {
            return (stride, packed);
        }

        for (row, out) in self
            .data
            .chunks_exact(self.width as usize)
            .zip(packed.chunks_exact_mut(stride))
        {
            for (x, _) in row.iter().enumerate().filter(|(_, black)| **black) {
                out[x / 8] |= 0x80 >> (x % 8);
            }
        }

        (stride, packed)
    }

    /// Convert the bitmap into an `image` crate grayscale image.
    #[cfg(feature = "image")]
    pub fn to_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([if self.get_pixel(x, y) { 0 } else { 255 }])
        })
    }
}

#[cfg(test)]
impl Bitmap {
    /// Build a bitmap from rows of `#` (black) and `.` (white).
    pub(crate) fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |row| row.len()) as u32;
        let mut bitmap = Self::new(width, height);

        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                bitmap.set_pixel(x as u32, y as u32, c == '#');
            }
        }

        bitmap
    }

    pub(crate) fn to_ascii(&self) -> Vec<alloc::string::String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.get_pixel(x, y) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }
}
