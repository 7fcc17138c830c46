//! The JB2 bi-level image decoder.
//!
//! A JB2 stream is a sequence of records. Most records describe a symbol,
//! either coded directly or as a refinement of a library symbol, which is
//! then placed on the page, added to the library, or both. Streams may
//! inherit the symbols of a shared dictionary, which is itself a JB2 stream
//! without a page.

mod direct;
mod library;
mod location;
mod refinement;

use alloc::vec::Vec;

use crate::DecodeSettings;
use crate::bitmap::Bitmap;
use crate::error::{Jb2Error, Result, bail};
use crate::log::{ldebug, ltrace, lwarn};
use crate::number::{BIG_NEGATIVE, BIG_POSITIVE, NumberDecoder, Tree};
use crate::zp::{Context, ZpDecoder};

pub use library::Library;
use location::Layout;

/// Once the arithmetic decoder reads past the end of the data, the stream has
/// to end within this many records.
const MAX_RECORDS_PAST_END: u32 = 1024;
/// How many pixels and comment octets may still be decoded after the data
/// ran out.
const MAX_WORK_PAST_END: u64 = 1 << 20;

/// The record types of a JB2 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Record {
    StartOfData,
    NewSymbol,
    NewSymbolLibraryOnly,
    NewSymbolImageOnly,
    MatchedRefine,
    MatchedRefineLibraryOnly,
    MatchedRefineImageOnly,
    MatchedCopy,
    NonSymbolData,
    DictionaryOrReset,
    Comment,
    EndOfData,
}

impl Record {
    fn from_value(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::StartOfData,
            1 => Self::NewSymbol,
            2 => Self::NewSymbolLibraryOnly,
            3 => Self::NewSymbolImageOnly,
            4 => Self::MatchedRefine,
            5 => Self::MatchedRefineLibraryOnly,
            6 => Self::MatchedRefineImageOnly,
            7 => Self::MatchedCopy,
            8 => Self::NonSymbolData,
            9 => Self::DictionaryOrReset,
            10 => Self::Comment,
            11 => Self::EndOfData,
            _ => return None,
        })
    }

    /// Whether the decoded symbol is placed on the page.
    fn places_symbol(self) -> bool {
        !matches!(
            self,
            Self::NewSymbolLibraryOnly | Self::MatchedRefineLibraryOnly
        )
    }

    /// Whether the decoded symbol is added to the library.
    fn stores_symbol(self) -> bool {
        !matches!(
            self,
            Self::NewSymbolImageOnly | Self::MatchedRefineImageOnly
        )
    }
}

/// A decoder for a single JB2 stream.
///
/// # Example
/// ```rust,no_run
/// use hayro_djvu::Jb2Decoder;
///
/// let djbz = std::fs::read("shared.djbz").unwrap();
/// let sjbz = std::fs::read("page.sjbz").unwrap();
///
/// let mut dictionary = Jb2Decoder::new(&djbz, None);
/// dictionary.decode().unwrap();
///
/// let mut page = Jb2Decoder::new(&sjbz, Some(&dictionary));
/// page.decode().unwrap();
///
/// if let Some(bitmap) = page.page() {
///     println!("{}x{} page", bitmap.width(), bitmap.height());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Jb2Decoder<'a> {
    data: &'a [u8],
    dictionary: Option<&'a Jb2Decoder<'a>>,
    settings: DecodeSettings,
    library: Library<'a>,
    page: Option<Bitmap>,
    comments: Vec<Vec<u8>>,
}

impl<'a> Jb2Decoder<'a> {
    /// Create a decoder for `data`, optionally inheriting symbols from an
    /// already decoded dictionary.
    pub fn new(data: &'a [u8], dictionary: Option<&'a Jb2Decoder<'a>>) -> Self {
        Self::with_settings(data, dictionary, DecodeSettings::default())
    }

    /// Create a decoder with custom settings.
    pub fn with_settings(
        data: &'a [u8],
        dictionary: Option<&'a Jb2Decoder<'a>>,
        settings: DecodeSettings,
    ) -> Self {
        Self {
            data,
            dictionary,
            settings,
            library: Library::default(),
            page: None,
            comments: Vec::new(),
        }
    }

    /// Decode the stream.
    ///
    /// Decoding again starts over from the beginning.
    pub fn decode(&mut self) -> Result<()> {
        self.library.clear();
        self.page = None;
        self.comments.clear();

        let mut stream = Stream::new(self.data);

        loop {
            if !stream.begin_record() {
                self.missing_end()?;
                break;
            }

            let value = stream.number(Tree::RecordType, 0, 11);
            let Some(record) = Record::from_value(value) else {
                bail!(Jb2Error::UnknownRecord);
            };

            ltrace!("JB2 record {:?}", record);

            match record {
                Record::StartOfData => self.start_of_data(&mut stream)?,
                Record::NewSymbol | Record::NewSymbolLibraryOnly | Record::NewSymbolImageOnly => {
                    stream.require_start()?;
                    let (width, height) = (
                        stream.number(Tree::AbsoluteSizeX, 0, BIG_POSITIVE) as u32,
                        stream.number(Tree::AbsoluteSizeY, 0, BIG_POSITIVE) as u32,
                    );
                    self.check_size(width, height)?;

                    if !stream.begin_work(u64::from(width) * u64::from(height)) {
                        self.missing_end()?;
                        break;
                    }

                    let bitmap = direct::decode(&mut stream.zp, &mut stream.direct, width, height);
                    self.finish_symbol(&mut stream, record, bitmap);
                }
                Record::MatchedRefine
                | Record::MatchedRefineLibraryOnly
                | Record::MatchedRefineImageOnly => {
                    stream.require_start()?;
                    let index = stream.match_index(self.library.len());
                    let reference = self
                        .library
                        .get(index)
                        .ok_or(Jb2Error::SymbolOutOfRange)?;

                    let dw = stream.number(Tree::RelativeSizeX, BIG_NEGATIVE, BIG_POSITIVE);
                    let dh = stream.number(Tree::RelativeSizeY, BIG_NEGATIVE, BIG_POSITIVE);
                    let (width, height) = refinement::refined_size(reference, dw, dh)?;
                    self.check_size(width, height)?;

                    if !stream.begin_work(u64::from(width) * u64::from(height)) {
                        self.missing_end()?;
                        break;
                    }

                    let bitmap = refinement::decode(
                        &mut stream.zp,
                        &mut stream.refine,
                        reference,
                        width,
                        height,
                    );
                    self.finish_symbol(&mut stream, record, bitmap);
                }
                Record::MatchedCopy => {
                    stream.require_start()?;
                    let index = stream.match_index(self.library.len());
                    let symbol = self
                        .library
                        .get(index)
                        .ok_or(Jb2Error::SymbolOutOfRange)?;

                    let (x, y) = stream.relative_location(symbol.width(), symbol.height());

                    if let Some(page) = &mut self.page {
                        page.blit(symbol, x, y);
                    }
                }
                Record::NonSymbolData => {
                    stream.require_start()?;
                    let (width, height) = (
                        stream.number(Tree::AbsoluteSizeX, 0, BIG_POSITIVE) as u32,
                        stream.number(Tree::AbsoluteSizeY, 0, BIG_POSITIVE) as u32,
                    );
                    self.check_size(width, height)?;

                    if !stream.begin_work(u64::from(width) * u64::from(height)) {
                        self.missing_end()?;
                        break;
                    }

                    let bitmap = direct::decode(&mut stream.zp, &mut stream.direct, width, height);
                    let x = stream.number(Tree::AbsoluteLocationX, 1, BIG_POSITIVE) - 1;
                    let y = stream.number(Tree::AbsoluteLocationY, 1, BIG_POSITIVE) - 1;

                    if let Some(page) = &mut self.page {
                        page.blit(&bitmap, i64::from(x), i64::from(y));
                    }
                }
                Record::DictionaryOrReset => {
                    if stream.started {
                        ltrace!("resetting number contexts");
                        stream.numbers.reset();
                    } else {
                        self.inherit(&mut stream)?;
                    }
                }
                Record::Comment => {
                    let length = stream.number(Tree::CommentLength, 0, BIG_POSITIVE);

                    if !stream.begin_work(length as u64) {
                        self.missing_end()?;
                        break;
                    }

                    let comment = (0..length)
                        .map(|_| stream.number(Tree::CommentOctet, 0, 255) as u8)
                        .collect();
                    self.comments.push(comment);
                }
                Record::EndOfData => break,
            }
        }

        ldebug!(
            "decoded JB2 stream with {} symbols ({} inherited)",
            self.library.len(),
            self.library.inherited()
        );

        Ok(())
    }

    /// The decoded page, if the stream declared one.
    pub fn page(&self) -> Option<&Bitmap> {
        self.page.as_ref()
    }

    /// Take the decoded page out of the decoder.
    pub fn into_page(self) -> Option<Bitmap> {
        self.page
    }

    /// The symbol library, for use by streams inheriting from this one.
    pub fn library(&self) -> &Library<'a> {
        &self.library
    }

    /// The comments embedded in the stream.
    pub fn comments(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.comments.iter().map(Vec::as_slice)
    }

    fn start_of_data(&mut self, stream: &mut Stream<'_>) -> Result<()> {
        if stream.started {
            bail!(Jb2Error::DuplicateStart);
        }

        let width = stream.number(Tree::ImageSize, 0, BIG_POSITIVE) as u32;
        let height = stream.number(Tree::ImageSize, 0, BIG_POSITIVE) as u32;
        // The refinement flag carries no information for decoding.
        let _ = stream.zp.decode(&mut stream.refinement_flag);
        stream.started = true;

        if width == 0 || height == 0 {
            lwarn!("JB2 stream declares an empty {}x{} page", width, height);
            return Ok(());
        }

        self.check_size(width, height)?;
        ldebug!("JB2 page is {}x{}", width, height);
        self.page = Some(Bitmap::new(width, height));

        Ok(())
    }

    fn inherit(&mut self, stream: &mut Stream<'_>) -> Result<()> {
        let count = stream.number(Tree::InheritedShapeCount, 0, BIG_POSITIVE) as usize;

        let Some(dictionary) = self.dictionary else {
            bail!(Jb2Error::MissingDictionary);
        };

        if !self.library.is_empty() {
            bail!(Jb2Error::LibraryNotEmpty);
        }

        if dictionary.library.len() < count {
            bail!(Jb2Error::DictionaryTooSmall);
        }

        ldebug!("inheriting {} symbols", count);
        self.library.inherit(&dictionary.library, count);

        Ok(())
    }

    /// Place and store a freshly decoded symbol as the record demands.
    fn finish_symbol(&mut self, stream: &mut Stream<'_>, record: Record, bitmap: Bitmap) {
        if record.places_symbol() {
            let (x, y) = stream.relative_location(bitmap.width(), bitmap.height());

            if let Some(page) = &mut self.page {
                page.blit(&bitmap, x, y);
            }
        }

        if record.stores_symbol() {
            let trimmed = bitmap.trim();

            if trimmed.is_empty() {
                lwarn!("JB2 symbol {} has no black pixels", self.library.len());
            }

            self.library.push(trimmed);
        }
    }

    /// Deal with a stream that keeps going long after its data ran out.
    fn missing_end(&self) -> Result<()> {
        if self.settings.strict {
            bail!(Jb2Error::MissingEnd);
        }

        lwarn!("JB2 stream ended without end-of-data record");

        Ok(())
    }

    fn check_size(&self, width: u32, height: u32) -> Result<()> {
        if u64::from(width) * u64::from(height) > self.settings.max_pixels {
            bail!(Jb2Error::TooLarge);
        }

        Ok(())
    }
}

/// The state that only lives while a stream is being decoded.
struct Stream<'a> {
    zp: ZpDecoder<'a>,
    numbers: NumberDecoder,
    direct: Vec<Context>,
    refine: Vec<Context>,
    offset_type: Context,
    refinement_flag: Context,
    layout: Layout,
    started: bool,
    records_past_end: u32,
    work_past_end: u64,
}

impl<'a> Stream<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            zp: ZpDecoder::new(data),
            numbers: NumberDecoder::new(),
            direct: direct::new_contexts(),
            refine: refinement::new_contexts(),
            offset_type: Context::default(),
            refinement_flag: Context::default(),
            layout: Layout::new(),
            started: false,
            records_past_end: 0,
            work_past_end: 0,
        }
    }

    /// Account for the next record. Returns `false` once the stream has run
    /// too far past the end of its data.
    fn begin_record(&mut self) -> bool {
        if self.zp.padding() > 0 {
            self.records_past_end += 1;
        }

        self.records_past_end <= MAX_RECORDS_PAST_END
    }

    /// Account for `work` pixels or octets that are about to be decoded, with
    /// the same result as [`Self::begin_record`].
    fn begin_work(&mut self, work: u64) -> bool {
        if self.zp.padding() > 0 {
            self.work_past_end = self.work_past_end.saturating_add(work);
        }

        self.work_past_end <= MAX_WORK_PAST_END
    }

    fn number(&mut self, tree: Tree, low: i32, high: i32) -> i32 {
        self.numbers.decode(&mut self.zp, tree, low, high)
    }

    /// Decode the index of a library symbol. With an empty library no data
    /// is consumed and the result is out of range.
    fn match_index(&mut self, library_len: usize) -> usize {
        let high = i32::try_from(library_len).map_or(BIG_POSITIVE, |len| len - 1);
        self.number(Tree::MatchIndex, 0, high) as usize
    }

    fn require_start(&self) -> Result<()> {
        if !self.started {
            bail!(Jb2Error::MissingStart);
        }

        Ok(())
    }

    /// Decode where a `width` x `height` symbol goes and return its top-left
    /// corner on the page.
    fn relative_location(&mut self, width: u32, height: u32) -> (i64, i64) {
        let new_line = self.zp.decode(&mut self.offset_type);

        let (dx, dy) = if new_line {
            (
                self.number(Tree::NewLineX, BIG_NEGATIVE, BIG_POSITIVE),
                -self.number(Tree::NewLineY, BIG_NEGATIVE, BIG_POSITIVE),
            )
        } else {
            (
                self.number(Tree::SameLineX, BIG_NEGATIVE, BIG_POSITIVE),
                -self.number(Tree::SameLineY, BIG_NEGATIVE, BIG_POSITIVE),
            )
        };

        self.layout.place(new_line, dx, dy, width, height)
    }
}
