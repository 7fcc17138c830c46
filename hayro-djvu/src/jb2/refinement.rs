//! Refinement coding of symbol bitmaps.
//!
//! A refined bitmap is decoded as a correction of a reference symbol from the
//! library. The context of every pixel combines four decoded neighbors with
//! seven pixels around the corresponding position in the reference, which is
//! centered on the new bitmap:
//!
//! ```text
//!     decoded      reference
//!     X X X          . X .
//!     X ?            X X X
//!                    X X X
//! ```

use alloc::vec;
use alloc::vec::Vec;

use crate::bitmap::Bitmap;
use crate::error::{Jb2Error, Result, err};
use crate::zp::{Context, ZpDecoder};

/// Number of distinct refinement contexts.
pub(crate) const CONTEXT_COUNT: usize = 1 << 11;

pub(crate) fn new_contexts() -> Vec<Context> {
    vec![Context::default(); CONTEXT_COUNT]
}

/// The size of `reference` grown by the decoded differences.
pub(crate) fn refined_size(reference: &Bitmap, dw: i32, dh: i32) -> Result<(u32, u32)> {
    let width = i64::from(reference.width()) + i64::from(dw);
    let height = i64::from(reference.height()) + i64::from(dh);

    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => err!(Jb2Error::InvalidDimension),
    }
}

/// Offset from a pixel of the refined bitmap to the corresponding pixel of
/// the reference, so that both are centered on each other.
fn alignment(reference: &Bitmap, width: u32, height: u32) -> (i32, i32) {
    // Halving rounds towards zero, also for empty bitmaps.
    let (sw, sh) = (reference.width() as i32, reference.height() as i32);
    let (w, h) = (width as i32, height as i32);

    ((sw - 1) / 2 - (w - 1) / 2, sh / 2 - h / 2)
}

/// Decode a `width` x `height` bitmap as a refinement of `reference`.
pub(crate) fn decode(
    zp: &mut ZpDecoder<'_>,
    contexts: &mut [Context],
    reference: &Bitmap,
    width: u32,
    height: u32,
) -> Bitmap {
    let (dx, dy) = alignment(reference, width, height);
    let mut bitmap = Bitmap::new(width, height);

    for y in 0..height as i32 {
        let mut context = gather_context(&bitmap, 0, y, reference, dx, y + dy);

        for x in 0..width as i32 {
            let pixel = zp.decode(&mut contexts[context as usize]);
            bitmap.set_pixel(x as u32, y as u32, pixel);
            context = shift_context(
                &bitmap,
                x + 1,
                y,
                reference,
                x + dx + 1,
                y + dy,
                context,
                pixel,
            );
        }
    }

    bitmap
}

/// Compute the context of the pixel at (x, y), whose counterpart in the
/// reference is at (rx, ry).
#[inline]
fn gather_context(bitmap: &Bitmap, x: i32, y: i32, reference: &Bitmap, rx: i32, ry: i32) -> u32 {
    let b = |dx: i32, dy: i32| bitmap.bit(x + dx, y + dy);
    let r = |dx: i32, dy: i32| reference.bit(rx + dx, ry + dy);

    (b(-1, -1) << 10)
        | (b(0, -1) << 9)
        | (b(1, -1) << 8)
        | (b(-1, 0) << 7)
        | (r(0, -1) << 6)
        | (r(-1, 0) << 5)
        | (r(0, 0) << 4)
        | (r(1, 0) << 3)
        | (r(-1, 1) << 2)
        | (r(0, 1) << 1)
        | r(1, 1)
}

/// Derive the context of the pixel at (x, y) from the context of its left
/// neighbor, whose value was `pixel`.
#[inline(always)]
fn shift_context(
    bitmap: &Bitmap,
    x: i32,
    y: i32,
    reference: &Bitmap,
    rx: i32,
    ry: i32,
    context: u32,
    pixel: bool,
) -> u32 {
    ((context << 1) & 0x636)
        | (bitmap.bit(x + 1, y - 1) << 8)
        | ((pixel as u32) << 7)
        | (reference.bit(rx, ry - 1) << 6)
        | (reference.bit(rx + 1, ry) << 3)
        | reference.bit(rx + 1, ry + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifted_context_matches_gathered() {
        let reference = Bitmap::from_ascii(&[
            ".##.#", //
            "#..##", //
            "##.#.", //
        ]);
        let bitmap = Bitmap::from_ascii(&[
            "#.##..", //
            ".###.#", //
            "#...##", //
            ".#.#.#", //
        ]);
        let (dx, dy) = alignment(&reference, bitmap.width(), bitmap.height());

        for y in 0..4 {
            let mut context = gather_context(&bitmap, 0, y, &reference, dx, y + dy);

            for x in 0..6 {
                let expected = gather_context(&bitmap, x, y, &reference, x + dx, y + dy);
                assert_eq!(context, expected, "at ({x}, {y})");

                let pixel = bitmap.get_pixel(x as u32, y as u32);
                context = shift_context(
                    &bitmap,
                    x + 1,
                    y,
                    &reference,
                    x + dx + 1,
                    y + dy,
                    context,
                    pixel,
                );
            }
        }
    }

    #[test]
    fn centered_alignment() {
        let reference = Bitmap::new(3, 3);

        assert_eq!(alignment(&reference, 3, 3), (0, 0));
        assert_eq!(alignment(&reference, 4, 4), (0, -1));
        assert_eq!(alignment(&reference, 1, 1), (1, 1));
        assert_eq!(alignment(&Bitmap::new(0, 0), 1, 1), (0, 0));
    }

    #[test]
    fn refined_sizes() {
        let reference = Bitmap::new(3, 3);

        assert_eq!(refined_size(&reference, 1, 1), Ok((4, 4)));
        assert_eq!(refined_size(&reference, -3, 0), Ok((0, 3)));
        assert!(refined_size(&reference, -4, 0).is_err());
        assert!(refined_size(&reference, 0, -262143).is_err());
    }
}
