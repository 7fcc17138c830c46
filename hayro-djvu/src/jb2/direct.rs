//! Direct coding of symbol bitmaps.
//!
//! Every pixel is decoded with a context formed by ten already decoded
//! neighbors:
//!
//! ```text
//!     . X X X .
//!     X X X X X
//!     X X ?
//! ```

use alloc::vec;
use alloc::vec::Vec;

use crate::bitmap::Bitmap;
use crate::zp::{Context, ZpDecoder};

/// Number of distinct direct coding contexts.
pub(crate) const CONTEXT_COUNT: usize = 1 << 10;

pub(crate) fn new_contexts() -> Vec<Context> {
    vec![Context::default(); CONTEXT_COUNT]
}

/// Decode a `width` x `height` bitmap.
pub(crate) fn decode(
    zp: &mut ZpDecoder<'_>,
    contexts: &mut [Context],
    width: u32,
    height: u32,
) -> Bitmap {
    let mut bitmap = Bitmap::new(width, height);

    for y in 0..height as i32 {
        let mut context = gather_context(&bitmap, 0, y);

        for x in 0..width as i32 {
            let pixel = zp.decode(&mut contexts[context as usize]);
            bitmap.set_pixel(x as u32, y as u32, pixel);
            context = shift_context(&bitmap, x + 1, y, context, pixel);
        }
    }

    bitmap
}

/// Compute the context of the pixel at (x, y) from scratch.
#[inline]
fn gather_context(bitmap: &Bitmap, x: i32, y: i32) -> u32 {
    let b = |dx: i32, dy: i32| bitmap.bit(x + dx, y + dy);

    (b(-1, -2) << 9)
        | (b(0, -2) << 8)
        | (b(1, -2) << 7)
        | (b(-2, -1) << 6)
        | (b(-1, -1) << 5)
        | (b(0, -1) << 4)
        | (b(1, -1) << 3)
        | (b(2, -1) << 2)
        | (b(-2, 0) << 1)
        | b(-1, 0)
}

/// Derive the context of the pixel at (x, y) from the context of its left
/// neighbor, whose value was `pixel`.
#[inline(always)]
fn shift_context(bitmap: &Bitmap, x: i32, y: i32, context: u32, pixel: bool) -> u32 {
    ((context << 1) & 0x37a)
        | (bitmap.bit(x + 1, y - 2) << 7)
        | (bitmap.bit(x + 2, y - 1) << 2)
        | pixel as u32
}
