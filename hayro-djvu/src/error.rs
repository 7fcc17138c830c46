//! Error types for BZZ and JB2 decoding.

use core::fmt;

/// The main error type for DjVu decoding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A BZZ stream was corrupt.
    Bzz(BzzError),
    /// A JB2 symbol stream was corrupt.
    Jb2(Jb2Error),
}

/// Structural violations inside a BZZ block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BzzError {
    /// The declared block size is zero or larger than 4 MiB.
    InvalidBlockSize,
    /// No end-of-block marker was decoded.
    MissingMarker,
    /// More than one end-of-block marker was decoded.
    DuplicateMarker,
    /// The symbol counts don't add up to the block size.
    CountMismatch,
    /// The inverse transform didn't end on the marker position.
    BrokenChain,
}

/// Structural violations inside a JB2 symbol stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jb2Error {
    /// A record type outside the known range.
    UnknownRecord,
    /// A second start-of-data record.
    DuplicateStart,
    /// A symbol record appeared before start-of-data.
    MissingStart,
    /// Symbols were inherited but no dictionary was supplied.
    MissingDictionary,
    /// More symbols were inherited than the dictionary holds.
    DictionaryTooSmall,
    /// Symbols were inherited after local symbols had been decoded.
    LibraryNotEmpty,
    /// A matched symbol index outside the library.
    SymbolOutOfRange,
    /// A refinement produced a negative size.
    InvalidDimension,
    /// A bitmap exceeds the configured pixel limit.
    TooLarge,
    /// The data ran out long before the end-of-data record.
    MissingEnd,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bzz(e) => write!(f, "corrupt BZZ block: {e}"),
            Self::Jb2(e) => write!(f, "corrupt JB2 stream: {e}"),
        }
    }
}

impl fmt::Display for BzzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBlockSize => write!(f, "invalid block size"),
            Self::MissingMarker => write!(f, "missing end-of-block marker"),
            Self::DuplicateMarker => write!(f, "duplicate end-of-block marker"),
            Self::CountMismatch => write!(f, "symbol counts don't match block size"),
            Self::BrokenChain => write!(f, "inverse transform didn't reach the marker"),
        }
    }
}

impl fmt::Display for Jb2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRecord => write!(f, "unknown record type"),
            Self::DuplicateStart => write!(f, "duplicate start-of-data record"),
            Self::MissingStart => write!(f, "symbol record before start-of-data"),
            Self::MissingDictionary => write!(f, "inherited symbols without a dictionary"),
            Self::DictionaryTooSmall => write!(f, "dictionary has fewer symbols than requested"),
            Self::LibraryNotEmpty => write!(f, "inherited symbols after local symbols"),
            Self::SymbolOutOfRange => write!(f, "symbol index out of range"),
            Self::InvalidDimension => write!(f, "invalid bitmap dimension"),
            Self::TooLarge => write!(f, "bitmap exceeds the pixel limit"),
            Self::MissingEnd => write!(f, "missing end-of-data record"),
        }
    }
}

impl core::error::Error for DecodeError {}
impl core::error::Error for BzzError {}
impl core::error::Error for Jb2Error {}

impl From<BzzError> for DecodeError {
    fn from(e: BzzError) -> Self {
        Self::Bzz(e)
    }
}

impl From<Jb2Error> for DecodeError {
    fn from(e: Jb2Error) -> Self {
        Self::Jb2(e)
    }
}

/// Result type for DjVu decoding operations.
pub type Result<T> = core::result::Result<T, DecodeError>;

macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
}

macro_rules! err {
    ($err:expr) => {
        Err($err.into())
    };
}

pub(crate) use bail;
pub(crate) use err;
