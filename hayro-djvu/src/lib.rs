/*!
A memory-safe, pure-Rust decoder for the compression codecs of DjVu documents.

`hayro-djvu` implements the three codecs that DjVu chunks are encoded with:

- [`zp`]: the Z'-coder, an adaptive binary arithmetic decoder that the other
  two codecs are built upon.
- [`bzz`]: a general purpose decompressor based on the Burrows-Wheeler
  transform, used for annotations, text layers and directories.
- [`jb2`]: a bi-level image decoder that reconstructs pages from a library of
  symbols, optionally shared between pages through a dictionary.

Walking the IFF container of a DjVu file is out of scope. The decoders take the
raw contents of a single chunk, such as `Sjbz`, `Djbz` or a BZZ-compressed
`ANTz` chunk.

# Example
```rust,no_run
let sjbz = std::fs::read("page.sjbz").unwrap();
let page = hayro_djvu::decode_jb2(&sjbz, None).unwrap();

println!("{}x{} page", page.width(), page.height());
```

# Cargo features
- `std` (default): Enables standard library support.
- `image` (default): Conversion of decoded bitmaps into `image` crate images.
- `logging`: Emits diagnostics through the `log` crate.

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod bitmap;
pub mod bzz;
pub mod error;
pub mod jb2;
mod log;
mod number;
pub mod zp;

use alloc::vec::Vec;

pub use bitmap::Bitmap;
pub use error::{BzzError, DecodeError, Jb2Error, Result};
pub use jb2::{Jb2Decoder, Library};

/// Settings that apply to JB2 decoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodeSettings {
    /// The largest number of pixels a page or a symbol may have.
    ///
    /// Larger bitmaps are rejected before they are allocated.
    pub max_pixels: u64,
    /// Whether a stream whose data runs out before the end-of-data record is
    /// an error. Otherwise, whatever was decoded up to that point is kept.
    pub strict: bool,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            max_pixels: 1 << 28,
            strict: true,
        }
    }
}

/// Decompress a BZZ stream.
///
/// This is a shorthand for [`bzz::decode`].
pub fn decode_bzz(data: &[u8]) -> Result<Vec<u8>> {
    bzz::decode(data)
}

/// Decode a JB2 page stream (usually an `Sjbz` chunk) and return its page.
///
/// Streams that don't declare a page yield an empty bitmap.
pub fn decode_jb2(data: &[u8], dictionary: Option<&Jb2Decoder<'_>>) -> Result<Bitmap> {
    let mut decoder = Jb2Decoder::new(data, dictionary);
    decoder.decode()?;

    Ok(decoder.into_page().unwrap_or_else(|| Bitmap::new(0, 0)))
}

/// Decode a JB2 dictionary stream (usually a `Djbz` chunk).
///
/// The returned decoder can be passed to [`Jb2Decoder::new`] or
/// [`decode_jb2`] for pages that share its symbols.
pub fn decode_jb2_dictionary(data: &[u8]) -> Result<Jb2Decoder<'_>> {
    let mut decoder = Jb2Decoder::new(data, None);
    decoder.decode()?;

    Ok(decoder)
}
