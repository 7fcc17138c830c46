//! The Z'-coder, an adaptive binary arithmetic decoder.
//!
//! The decoder tracks an interval through the two 16-bit registers `a` and
//! `c`. Each decoded decision is modeled by a [`Context`], a single byte that
//! walks through a fixed table of probability estimates as the statistics of
//! the stream are learned. Bits that carry no statistics are decoded with
//! [`ZpDecoder::decode_raw`].
//!
//! Running past the end of the input is not an error: missing bytes are read
//! as `0xff`. Callers bound the amount of decoded data structurally.

/// An adaptive context for the Z'-coder.
///
/// The byte indexes a row of the transition table. Its lowest bit is the
/// current more probable symbol.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Context(u8);

impl Context {
    /// The more probable symbol of this context.
    #[inline(always)]
    pub fn mps(self) -> bool {
        self.0 & 1 == 1
    }

    /// The current row in the transition table.
    #[inline(always)]
    pub fn state(self) -> u8 {
        self.0
    }
}

/// The Z'-coder decoder state.
#[derive(Debug, Clone)]
pub struct ZpDecoder<'a> {
    /// The underlying encoded data.
    data: &'a [u8],
    /// Offset of the next unread byte.
    offset: usize,
    /// The interval width register.
    a: u32,
    /// The code register.
    c: u32,
    /// `min(c, 0x7fff)`, the fast path threshold.
    fence: u32,
    /// Bits that still have to be shifted into `c`.
    buffer: u32,
    /// Number of valid bits in `buffer`.
    avail: u32,
}

impl<'a> ZpDecoder<'a> {
    /// Create a new decoder over the given data.
    pub fn new(data: &'a [u8]) -> Self {
        let mut decoder = Self {
            data,
            offset: 0,
            a: 0,
            c: 0,
            fence: 0,
            buffer: 0,
            avail: 0,
        };

        decoder.c = (decoder.next_byte() << 8) | decoder.next_byte();
        decoder.buffer = decoder.next_byte();
        decoder.avail = 8;
        decoder.update_fence();

        decoder
    }

    /// Decode a single bit, adapting the given context.
    #[inline(always)]
    pub fn decode(&mut self, context: &mut Context) -> bool {
        let row = &TABLE[context.0 as usize];
        let mps = context.mps();
        let mut z = self.a + row.p;

        if z <= self.fence {
            self.a = z;
            return mps;
        }

        let d = 0x6000 + ((z + self.a) >> 2);
        if z > d {
            z = d;
        }

        let bit = if self.c >= z {
            if self.a >= row.m {
                context.0 = row.up;
            }

            self.a = z;

            mps
        } else {
            self.a += 0x10000 - z;
            self.c += 0x10000 - z;
            context.0 = row.dn;

            !mps
        };

        self.renormalize();

        bit
    }

    /// Decode a bit with a fixed probability of one half.
    ///
    /// No context is involved, so the bit doesn't influence any statistics.
    #[inline]
    pub fn decode_raw(&mut self) -> bool {
        let z = 0x8000 + (self.a >> 1);

        let bit = if self.c >= z {
            self.a = z;

            false
        } else {
            self.a += 0x10000 - z;
            self.c += 0x10000 - z;

            true
        };

        self.renormalize();

        bit
    }

    /// Decode an unsigned integer of `bits` raw bits, most significant first.
    pub fn decode_raw_bits(&mut self, bits: u32) -> u32 {
        (0..bits).fold(0, |n, _| (n << 1) | self.decode_raw() as u32)
    }

    /// Number of filler bytes that were synthesized past the end of the input.
    pub(crate) fn padding(&self) -> usize {
        self.offset.saturating_sub(self.data.len())
    }

    /// Shift `a` left until its top bit is clear, pulling new bits into `c`.
    #[inline(always)]
    fn renormalize(&mut self) {
        // `a` always fits into 16 bits, so the number of shifts is the
        // number of leading ones.
        let shift = (self.a as u16).leading_ones();

        self.a = (self.a << shift) & 0xffff;

        for _ in 0..shift {
            self.c = ((self.c << 1) | self.read_bit()) & 0xffff;
        }

        self.update_fence();
    }

    #[inline(always)]
    fn update_fence(&mut self) {
        self.fence = self.c.min(0x7fff);
    }

    #[inline(always)]
    fn read_bit(&mut self) -> u32 {
        self.avail -= 1;
        let bit = (self.buffer >> self.avail) & 1;

        if self.avail == 0 {
            self.buffer = self.next_byte();
            self.avail = 8;
        }

        bit
    }

    #[inline(always)]
    fn next_byte(&mut self) -> u32 {
        let byte = self.data.get(self.offset).copied().unwrap_or(0xff);
        self.offset += 1;

        byte as u32
    }
}

/// A row of the transition table.
#[derive(Debug, Clone, Copy)]
struct Row {
    /// The probability estimate of the less probable symbol.
    p: u32,
    /// Threshold for adapting after a more probable symbol.
    m: u32,
    /// Next state after a more probable symbol.
    up: u8,
    /// Next state after a less probable symbol.
    dn: u8,
}

macro_rules! rows {
    ($($p:expr, $m:expr, $up:expr, $dn:expr),+ $(,)?) => {
        [
            $(
                Row {
                    p: $p,
                    m: $m,
                    up: $up,
                    dn: $dn,
                }
            ),+
        ]
    };
}

/// The state transition table. Rows 251 and up are never reached.
#[rustfmt::skip]
static TABLE: [Row; 256] = rows!(
    // State   P        M      UP    DN
    /*   0 */ 0x8000, 0x0000,  84,  145,
    /*   1 */ 0x8000, 0x0000,   3,    4,
    /*   2 */ 0x8000, 0x0000,   4,    3,
    /*   3 */ 0x6bbd, 0x10a5,   5,    1,
    /*   4 */ 0x6bbd, 0x10a5,   6,    2,
    /*   5 */ 0x5d45, 0x1f28,   7,    3,
    /*   6 */ 0x5d45, 0x1f28,   8,    4,
    /*   7 */ 0x51b9, 0x2bd3,   9,    5,
    /*   8 */ 0x51b9, 0x2bd3,  10,    6,
    /*   9 */ 0x4813, 0x36e3,  11,    7,
    /*  10 */ 0x4813, 0x36e3,  12,    8,
    /*  11 */ 0x3fd5, 0x408c,  13,    9,
    /*  12 */ 0x3fd5, 0x408c,  14,   10,
    /*  13 */ 0x38b1, 0x48fd,  15,   11,
    /*  14 */ 0x38b1, 0x48fd,  16,   12,
    /*  15 */ 0x3275, 0x505d,  17,   13,
    /*  16 */ 0x3275, 0x505d,  18,   14,
    /*  17 */ 0x2cfd, 0x56d0,  19,   15,
    /*  18 */ 0x2cfd, 0x56d0,  20,   16,
    /*  19 */ 0x2825, 0x5c71,  21,   17,
    /*  20 */ 0x2825, 0x5c71,  22,   18,
    /*  21 */ 0x23ab, 0x615b,  23,   19,
    /*  22 */ 0x23ab, 0x615b,  24,   20,
    /*  23 */ 0x1f87, 0x65a5,  25,   21,
    /*  24 */ 0x1f87, 0x65a5,  26,   22,
    /*  25 */ 0x1bbb, 0x6962,  27,   23,
    /*  26 */ 0x1bbb, 0x6962,  28,   24,
    /*  27 */ 0x1845, 0x6ca2,  29,   25,
    /*  28 */ 0x1845, 0x6ca2,  30,   26,
    /*  29 */ 0x1523, 0x6f74,  31,   27,
    /*  30 */ 0x1523, 0x6f74,  32,   28,
    /*  31 */ 0x1253, 0x71e6,  33,   29,
    /*  32 */ 0x1253, 0x71e6,  34,   30,
    /*  33 */ 0x0fcf, 0x7404,  35,   31,
    /*  34 */ 0x0fcf, 0x7404,  36,   32,
    /*  35 */ 0x0d95, 0x75d6,  37,   33,
    /*  36 */ 0x0d95, 0x75d6,  38,   34,
    /*  37 */ 0x0b9d, 0x7768,  39,   35,
    /*  38 */ 0x0b9d, 0x7768,  40,   36,
    /*  39 */ 0x09e3, 0x78c2,  41,   37,
    /*  40 */ 0x09e3, 0x78c2,  42,   38,
    /*  41 */ 0x0861, 0x79ea,  43,   39,
    /*  42 */ 0x0861, 0x79ea,  44,   40,
    /*  43 */ 0x0711, 0x7ae7,  45,   41,
    /*  44 */ 0x0711, 0x7ae7,  46,   42,
    /*  45 */ 0x05f1, 0x7bbe,  47,   43,
    /*  46 */ 0x05f1, 0x7bbe,  48,   44,
    /*  47 */ 0x04f9, 0x7c75,  49,   45,
    /*  48 */ 0x04f9, 0x7c75,  50,   46,
    /*  49 */ 0x0425, 0x7d0f,  51,   47,
    /*  50 */ 0x0425, 0x7d0f,  52,   48,
    /*  51 */ 0x0371, 0x7d91,  53,   49,
    /*  52 */ 0x0371, 0x7d91,  54,   50,
    /*  53 */ 0x02d9, 0x7dfe,  55,   51,
    /*  54 */ 0x02d9, 0x7dfe,  56,   52,
    /*  55 */ 0x0259, 0x7e5a,  57,   53,
    /*  56 */ 0x0259, 0x7e5a,  58,   54,
    /*  57 */ 0x01ed, 0x7ea6,  59,   55,
    /*  58 */ 0x01ed, 0x7ea6,  60,   56,
    /*  59 */ 0x0193, 0x7ee6,  61,   57,
    /*  60 */ 0x0193, 0x7ee6,  62,   58,
    /*  61 */ 0x0149, 0x7f1a,  63,   59,
    /*  62 */ 0x0149, 0x7f1a,  64,   60,
    /*  63 */ 0x010b, 0x7f45,  65,   61,
    /*  64 */ 0x010b, 0x7f45,  66,   62,
    /*  65 */ 0x00d5, 0x7f6b,  67,   63,
    /*  66 */ 0x00d5, 0x7f6b,  68,   64,
    /*  67 */ 0x00a5, 0x7f8d,  69,   65,
    /*  68 */ 0x00a5, 0x7f8d,  70,   66,
    /*  69 */ 0x007b, 0x7faa,  71,   67,
    /*  70 */ 0x007b, 0x7faa,  72,   68,
    /*  71 */ 0x0057, 0x7fc3,  73,   69,
    /*  72 */ 0x0057, 0x7fc3,  74,   70,
    /*  73 */ 0x003b, 0x7fd7,  75,   71,
    /*  74 */ 0x003b, 0x7fd7,  76,   72,
    /*  75 */ 0x0023, 0x7fe7,  77,   73,
    /*  76 */ 0x0023, 0x7fe7,  78,   74,
    /*  77 */ 0x0013, 0x7ff2,  79,   75,
    /*  78 */ 0x0013, 0x7ff2,  80,   76,
    /*  79 */ 0x0007, 0x7ffa,  81,   77,
    /*  80 */ 0x0007, 0x7ffa,  82,   78,
    /*  81 */ 0x0001, 0x7fff,  81,   79,
    /*  82 */ 0x0001, 0x7fff,  82,   80,
    /*  83 */ 0x5695, 0x0000,   9,   85,
    /*  84 */ 0x24ee, 0x0000,  86,  226,
    /*  85 */ 0x8000, 0x0000,   5,    6,
    /*  86 */ 0x0d30, 0x0000,  88,  176,
    /*  87 */ 0x481a, 0x0000,  89,  143,
    /*  88 */ 0x0481, 0x0000,  90,  138,
    /*  89 */ 0x3579, 0x0000,  91,  141,
    /*  90 */ 0x017a, 0x0000,  92,  112,
    /*  91 */ 0x24ef, 0x0000,  93,  135,
    /*  92 */ 0x007b, 0x0000,  94,  104,
    /*  93 */ 0x1978, 0x0000,  95,  133,
    /*  94 */ 0x0028, 0x0000,  96,  100,
    /*  95 */ 0x10ca, 0x0000,  97,  129,
    /*  96 */ 0x000d, 0x0000,  82,   98,
    /*  97 */ 0x0b5d, 0x0000,  99,  127,
    /*  98 */ 0x0034, 0x0000,  76,   72,
    /*  99 */ 0x078a, 0x0000, 101,  125,
    /* 100 */ 0x00a0, 0x0000,  70,  102,
    /* 101 */ 0x050f, 0x0000, 103,  123,
    /* 102 */ 0x0117, 0x0000,  66,   60,
    /* 103 */ 0x0358, 0x0000, 105,  121,
    /* 104 */ 0x01ea, 0x0000, 106,  110,
    /* 105 */ 0x0234, 0x0000, 107,  119,
    /* 106 */ 0x0144, 0x0000,  66,  108,
    /* 107 */ 0x0173, 0x0000, 109,  117,
    /* 108 */ 0x0234, 0x0000,  60,   54,
    /* 109 */ 0x00f5, 0x0000, 111,  115,
    /* 110 */ 0x0353, 0x0000,  56,   48,
    /* 111 */ 0x00a1, 0x0000,  69,  113,
    /* 112 */ 0x05c5, 0x0000, 114,  134,
    /* 113 */ 0x011a, 0x0000,  65,   59,
    /* 114 */ 0x03cf, 0x0000, 116,  132,
    /* 115 */ 0x01aa, 0x0000,  61,   55,
    /* 116 */ 0x0285, 0x0000, 118,  130,
    /* 117 */ 0x0286, 0x0000,  57,   51,
    /* 118 */ 0x01ab, 0x0000, 120,  128,
    /* 119 */ 0x03d3, 0x0000,  53,   47,
    /* 120 */ 0x011a, 0x0000, 122,  126,
    /* 121 */ 0x05c5, 0x0000,  49,   41,
    /* 122 */ 0x00ba, 0x0000, 124,   62,
    /* 123 */ 0x08ad, 0x0000,  43,   37,
    /* 124 */ 0x007a, 0x0000,  72,   66,
    /* 125 */ 0x0ccc, 0x0000,  39,   31,
    /* 126 */ 0x01eb, 0x0000,  60,   54,
    /* 127 */ 0x1302, 0x0000,  33,   25,
    /* 128 */ 0x02e6, 0x0000,  56,   50,
    /* 129 */ 0x1b81, 0x0000,  29,  131,
    /* 130 */ 0x045e, 0x0000,  52,   46,
    /* 131 */ 0x24ef, 0x0000,  23,   17,
    /* 132 */ 0x0690, 0x0000,  48,   40,
    /* 133 */ 0x2865, 0x0000,  23,   15,
    /* 134 */ 0x09de, 0x0000,  42,  136,
    /* 135 */ 0x3987, 0x0000, 137,    7,
    /* 136 */ 0x0dc8, 0x0000,  38,   32,
    /* 137 */ 0x2c99, 0x0000,  21,  139,
    /* 138 */ 0x10ca, 0x0000, 140,  172,
    /* 139 */ 0x3b5f, 0x0000,  15,    9,
    /* 140 */ 0x0b5d, 0x0000, 142,  170,
    /* 141 */ 0x5695, 0x0000,   9,   85,
    /* 142 */ 0x078a, 0x0000, 144,  168,
    /* 143 */ 0x8000, 0x0000, 141,  248,
    /* 144 */ 0x050f, 0x0000, 146,  166,
    /* 145 */ 0x24ee, 0x0000, 147,  247,
    /* 146 */ 0x0358, 0x0000, 148,  164,
    /* 147 */ 0x0d30, 0x0000, 149,  197,
    /* 148 */ 0x0234, 0x0000, 150,  162,
    /* 149 */ 0x0481, 0x0000, 151,   95,
    /* 150 */ 0x0173, 0x0000, 152,  160,
    /* 151 */ 0x017a, 0x0000, 153,  173,
    /* 152 */ 0x00f5, 0x0000, 154,  158,
    /* 153 */ 0x007b, 0x0000, 155,  165,
    /* 154 */ 0x00a1, 0x0000,  70,  156,
    /* 155 */ 0x0028, 0x0000, 157,  161,
    /* 156 */ 0x011a, 0x0000,  66,   60,
    /* 157 */ 0x000d, 0x0000,  81,  159,
    /* 158 */ 0x01aa, 0x0000,  62,   56,
    /* 159 */ 0x0034, 0x0000,  75,   71,
    /* 160 */ 0x0286, 0x0000,  58,   52,
    /* 161 */ 0x00a0, 0x0000,  69,  163,
    /* 162 */ 0x03d3, 0x0000,  54,   48,
    /* 163 */ 0x0117, 0x0000,  65,   59,
    /* 164 */ 0x05c5, 0x0000,  50,   42,
    /* 165 */ 0x01ea, 0x0000, 167,  171,
    /* 166 */ 0x08ad, 0x0000,  44,   38,
    /* 167 */ 0x0144, 0x0000,  65,  169,
    /* 168 */ 0x0ccc, 0x0000,  40,   32,
    /* 169 */ 0x0234, 0x0000,  59,   53,
    /* 170 */ 0x1302, 0x0000,  34,   26,
    /* 171 */ 0x0353, 0x0000,  55,   47,
    /* 172 */ 0x1b81, 0x0000,  30,  174,
    /* 173 */ 0x05c5, 0x0000, 175,  193,
    /* 174 */ 0x24ef, 0x0000,  24,   18,
    /* 175 */ 0x03cf, 0x0000, 177,  191,
    /* 176 */ 0x2b74, 0x0000, 178,  222,
    /* 177 */ 0x0285, 0x0000, 179,  189,
    /* 178 */ 0x201d, 0x0000, 180,  218,
    /* 179 */ 0x01ab, 0x0000, 181,  187,
    /* 180 */ 0x1715, 0x0000, 182,  216,
    /* 181 */ 0x011a, 0x0000, 183,  185,
    /* 182 */ 0x0fb7, 0x0000, 184,  214,
    /* 183 */ 0x00ba, 0x0000,  69,   61,
    /* 184 */ 0x0a67, 0x0000, 186,  212,
    /* 185 */ 0x01eb, 0x0000,  59,   53,
    /* 186 */ 0x06e7, 0x0000, 188,  210,
    /* 187 */ 0x02e6, 0x0000,  55,   49,
    /* 188 */ 0x0496, 0x0000, 190,  208,
    /* 189 */ 0x045e, 0x0000,  51,   45,
    /* 190 */ 0x030d, 0x0000, 192,  206,
    /* 191 */ 0x0690, 0x0000,  47,   39,
    /* 192 */ 0x0206, 0x0000, 194,  204,
    /* 193 */ 0x09de, 0x0000,  41,  195,
    /* 194 */ 0x0155, 0x0000, 196,  202,
    /* 195 */ 0x0dc8, 0x0000,  37,   31,
    /* 196 */ 0x00e1, 0x0000, 198,  200,
    /* 197 */ 0x2b74, 0x0000, 199,  243,
    /* 198 */ 0x0094, 0x0000,  72,   64,
    /* 199 */ 0x201d, 0x0000, 201,  239,
    /* 200 */ 0x0188, 0x0000,  62,   56,
    /* 201 */ 0x1715, 0x0000, 203,  237,
    /* 202 */ 0x0252, 0x0000,  58,   52,
    /* 203 */ 0x0fb7, 0x0000, 205,  235,
    /* 204 */ 0x0383, 0x0000,  54,   48,
    /* 205 */ 0x0a67, 0x0000, 207,  233,
    /* 206 */ 0x0547, 0x0000,  50,   44,
    /* 207 */ 0x06e7, 0x0000, 209,  231,
    /* 208 */ 0x07e2, 0x0000,  46,   38,
    /* 209 */ 0x0496, 0x0000, 211,  229,
    /* 210 */ 0x0bc0, 0x0000,  40,   34,
    /* 211 */ 0x030d, 0x0000, 213,  227,
    /* 212 */ 0x1178, 0x0000,  36,   28,
    /* 213 */ 0x0206, 0x0000, 215,  225,
    /* 214 */ 0x19da, 0x0000,  30,   22,
    /* 215 */ 0x0155, 0x0000, 217,  223,
    /* 216 */ 0x24ef, 0x0000,  26,   16,
    /* 217 */ 0x00e1, 0x0000, 219,  221,
    /* 218 */ 0x320e, 0x0000,  20,  220,
    /* 219 */ 0x0094, 0x0000,  71,   63,
    /* 220 */ 0x432a, 0x0000,  14,    8,
    /* 221 */ 0x0188, 0x0000,  61,   55,
    /* 222 */ 0x447d, 0x0000,  14,  224,
    /* 223 */ 0x0252, 0x0000,  57,   51,
    /* 224 */ 0x5ece, 0x0000,   8,    2,
    /* 225 */ 0x0383, 0x0000,  53,   47,
    /* 226 */ 0x8000, 0x0000, 228,   87,
    /* 227 */ 0x0547, 0x0000,  49,   43,
    /* 228 */ 0x481a, 0x0000, 230,  246,
    /* 229 */ 0x07e2, 0x0000,  45,   37,
    /* 230 */ 0x3579, 0x0000, 232,  244,
    /* 231 */ 0x0bc0, 0x0000,  39,   33,
    /* 232 */ 0x24ef, 0x0000, 234,  238,
    /* 233 */ 0x1178, 0x0000,  35,   27,
    /* 234 */ 0x1978, 0x0000, 138,  236,
    /* 235 */ 0x19da, 0x0000,  29,   21,
    /* 236 */ 0x2865, 0x0000,  24,   16,
    /* 237 */ 0x24ef, 0x0000,  25,   15,
    /* 238 */ 0x3987, 0x0000, 240,    8,
    /* 239 */ 0x320e, 0x0000,  19,  241,
    /* 240 */ 0x2c99, 0x0000,  22,  242,
    /* 241 */ 0x432a, 0x0000,  13,    7,
    /* 242 */ 0x3b5f, 0x0000,  16,   10,
    /* 243 */ 0x447d, 0x0000,  13,  245,
    /* 244 */ 0x5695, 0x0000,  10,    2,
    /* 245 */ 0x5ece, 0x0000,   7,    1,
    /* 246 */ 0x8000, 0x0000, 244,   83,
    /* 247 */ 0x8000, 0x0000, 249,  250,
    /* 248 */ 0x5695, 0x0000,  10,    2,
    /* 249 */ 0x481a, 0x0000,  89,  143,
    /* 250 */ 0x481a, 0x0000, 230,  246,
    /* 251 */ 0x0000, 0x0000,   0,    0,
    /* 252 */ 0x0000, 0x0000,   0,    0,
    /* 253 */ 0x0000, 0x0000,   0,    0,
    /* 254 */ 0x0000, 0x0000,   0,    0,
    /* 255 */ 0x0000, 0x0000,   0,    0,
);
