//! The BZZ general purpose decompressor.
//!
//! BZZ streams consist of blocks that were transformed with the
//! Burrows-Wheeler transform, coded with an adaptive move-to-front scheme and
//! then compressed with the Z'-coder. All blocks share one arithmetic decoder
//! and one bank of contexts. A block with size zero ends the stream.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{BzzError, Result, bail};
use crate::log::{ldebug, ltrace};
use crate::zp::{Context, ZpDecoder};

/// The largest allowed block size.
pub const MAX_BLOCK_SIZE: u32 = 4096 * 1024;

const CONTEXT_COUNT: usize = 260;

/// Rank buckets beyond the first two ranks as
/// `(selector context, first magnitude context, magnitude bits, first rank)`.
const BUCKETS: [(usize, usize, u32, usize); 7] = [
    (6, 7, 1, 2),
    (8, 9, 2, 4),
    (12, 13, 3, 8),
    (20, 21, 4, 16),
    (36, 37, 5, 32),
    (68, 69, 6, 64),
    (132, 133, 7, 128),
];

/// Frequency weights are rescaled once they grow past this value.
const RESCALE_THRESHOLD: u32 = 0x1000_0000;

/// Decode a complete BZZ stream.
///
/// # Example
/// ```rust,no_run
/// let data = std::fs::read("annotations.bzz").unwrap();
/// let text = hayro_djvu::bzz::decode(&data).unwrap();
/// println!("{} bytes", text.len());
/// ```
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut zp = ZpDecoder::new(data);
    let mut contexts = [Context::default(); CONTEXT_COUNT];
    let mut output = Vec::new();
    let mut blocks = 0;

    while let Some(block) = decode_block(&mut zp, &mut contexts)? {
        blocks += 1;
        output.extend_from_slice(&block);
    }

    if blocks == 0 {
        bail!(BzzError::InvalidBlockSize);
    }

    ldebug!("decoded {} BZZ blocks into {} bytes", blocks, output.len());

    Ok(output)
}

/// Decode the next block, or return `None` at the end of the stream.
fn decode_block(
    zp: &mut ZpDecoder<'_>,
    contexts: &mut [Context; CONTEXT_COUNT],
) -> Result<Option<Vec<u8>>> {
    let size = zp.decode_raw_bits(24);

    if size == 0 {
        return Ok(None);
    }

    if size > MAX_BLOCK_SIZE {
        bail!(BzzError::InvalidBlockSize);
    }

    let shift = if zp.decode_raw() {
        if zp.decode_raw() { 2 } else { 1 }
    } else {
        0
    };

    ltrace!("BZZ block of {} bytes, estimation speed {}", size, shift);

    let mut mtf = MoveToFront::new(shift);
    let mut data = vec![0_u8; size as usize];
    let mut marker = None;
    // Selects the first contexts. Starts out as if rank 3 had been decoded.
    let mut last_rank = Some(3);

    for (i, slot) in data.iter_mut().enumerate() {
        let first = last_rank.map_or(2, |rank: usize| rank.min(2));
        last_rank = decode_rank(zp, contexts, first);

        match last_rank {
            Some(rank) => *slot = mtf.take(rank),
            None => {
                if marker.is_some() {
                    bail!(BzzError::DuplicateMarker);
                }

                marker = Some(i);
            }
        }
    }

    let Some(marker) = marker else {
        bail!(BzzError::MissingMarker);
    };

    Ok(Some(inverse_bwt(&data, marker)?))
}

/// Decode a move-to-front rank, or `None` for the end-of-block marker.
#[inline]
fn decode_rank(
    zp: &mut ZpDecoder<'_>,
    contexts: &mut [Context; CONTEXT_COUNT],
    first: usize,
) -> Option<usize> {
    if zp.decode(&mut contexts[first]) {
        return Some(0);
    }

    if zp.decode(&mut contexts[first + 3]) {
        return Some(1);
    }

    for (selector, base, bits, offset) in BUCKETS {
        if zp.decode(&mut contexts[selector]) {
            return Some(offset + decode_magnitude(zp, contexts, base, bits));
        }
    }

    None
}

/// Decode a `bits`-wide number MSB first, walking a binary tree of contexts
/// whose root sits at `base`.
fn decode_magnitude(
    zp: &mut ZpDecoder<'_>,
    contexts: &mut [Context; CONTEXT_COUNT],
    base: usize,
    bits: u32,
) -> usize {
    let limit = 1 << bits;
    let mut n = 1;

    while n < limit {
        n = (n << 1) | zp.decode(&mut contexts[base - 1 + n]) as usize;
    }

    n - limit
}

/// A move-to-front table whose first four slots are ordered by frequency.
struct MoveToFront {
    table: [u8; 256],
    frequencies: [u32; 4],
    increment: u32,
    shift: u32,
}

impl MoveToFront {
    fn new(shift: u32) -> Self {
        Self {
            table: core::array::from_fn(|i| i as u8),
            frequencies: [0; 4],
            increment: 4,
            shift,
        }
    }

    /// Return the byte at `rank` and move it towards the front.
    #[inline]
    fn take(&mut self, rank: usize) -> u8 {
        let byte = self.table[rank];

        self.increment += self.increment >> self.shift;

        if self.increment > RESCALE_THRESHOLD {
            self.increment >>= 24;

            for frequency in &mut self.frequencies {
                *frequency >>= 24;
            }
        }

        let mut weight = self.increment;
        if rank < 4 {
            weight += self.frequencies[rank];
        }

        let mut k = rank;

        while k > 3 {
            self.table[k] = self.table[k - 1];
            k -= 1;
        }

        while k > 0 && weight >= self.frequencies[k - 1] {
            self.table[k] = self.table[k - 1];
            self.frequencies[k] = self.frequencies[k - 1];
            k -= 1;
        }

        self.table[k] = byte;
        self.frequencies[k] = weight;

        byte
    }
}

/// Invert the Burrows-Wheeler transform.
///
/// `data` is the last column of the sorted rotations, with the end-of-block
/// marker at index `marker`. The result is one byte shorter than `data`.
pub(crate) fn inverse_bwt(data: &[u8], marker: usize) -> Result<Vec<u8>> {
    let size = data.len();

    // Rank of every byte among the equal bytes before it.
    let mut ranks = vec![0_u32; size];
    let mut counts = [0_u32; 256];

    for (i, (&byte, rank)) in data.iter().zip(ranks.iter_mut()).enumerate() {
        if i != marker {
            *rank = counts[byte as usize];
            counts[byte as usize] += 1;
        }
    }

    // The marker sorts before everything, so the first byte value starts at
    // offset 1.
    let mut total = 1;
    for count in &mut counts {
        let n = *count;
        *count = total;
        total += n;
    }

    if total as usize != size {
        bail!(BzzError::CountMismatch);
    }

    let mut output = vec![0_u8; size - 1];
    let mut k = 0;

    for out in output.iter_mut().rev() {
        let byte = data[k];
        *out = byte;
        k = (counts[byte as usize] + ranks[k]) as usize;
    }

    if k != marker {
        bail!(BzzError::BrokenChain);
    }

    Ok(output)
}
