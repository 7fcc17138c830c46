//! The symbol library of a JB2 stream.

use alloc::vec::Vec;

use crate::bitmap::Bitmap;

/// A library entry, either decoded by this stream or borrowed from a
/// dictionary.
#[derive(Debug, Clone)]
enum Symbol<'a> {
    Inherited(&'a Bitmap),
    Owned(Bitmap),
}

impl<'a> Symbol<'a> {
    fn bitmap(&self) -> &Bitmap {
        match self {
            Self::Inherited(bitmap) => bitmap,
            Self::Owned(bitmap) => bitmap,
        }
    }

    /// Borrow the bitmap for as long as the entry itself lives.
    fn share(&'a self) -> &'a Bitmap {
        match self {
            Self::Inherited(bitmap) => bitmap,
            Self::Owned(bitmap) => bitmap,
        }
    }
}

/// The ordered collection of symbols a JB2 stream can refer back to.
///
/// Entries are only ever appended. The first entries may be borrowed from a
/// dictionary, everything after them was decoded by the stream itself.
#[derive(Debug, Clone, Default)]
pub struct Library<'a> {
    symbols: Vec<Symbol<'a>>,
}

impl<'a> Library<'a> {
    /// The number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the library contains no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbol at `index`.
    pub fn get(&self, index: usize) -> Option<&Bitmap> {
        self.symbols.get(index).map(Symbol::bitmap)
    }

    /// Iterate over all symbols in order.
    pub fn iter(&self) -> impl Iterator<Item = &Bitmap> + '_ {
        self.symbols.iter().map(Symbol::bitmap)
    }

    /// The number of leading symbols that are borrowed from a dictionary.
    pub fn inherited(&self) -> usize {
        self.symbols
            .iter()
            .take_while(|symbol| matches!(symbol, Symbol::Inherited(_)))
            .count()
    }

    pub(crate) fn push(&mut self, bitmap: Bitmap) {
        self.symbols.push(Symbol::Owned(bitmap));
    }

    /// Borrow the first `count` symbols of `dictionary`.
    ///
    /// The caller checks that `dictionary` holds at least `count` symbols.
    pub(crate) fn inherit(&mut self, dictionary: &'a Library<'a>, count: usize) {
        self.symbols.extend(
            dictionary.symbols[..count]
                .iter()
                .map(|symbol| Symbol::Inherited(symbol.share())),
        );
    }

    pub(crate) fn clear(&mut self) {
        self.symbols.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherit_borrows_prefix() {
        let mut dictionary = Library::default();
        dictionary.push(Bitmap::from_ascii(&["#"]));
        dictionary.push(Bitmap::from_ascii(&["##"]));
        dictionary.push(Bitmap::from_ascii(&["###"]));

        let mut library = Library::default();
        library.inherit(&dictionary, 2);
        library.push(Bitmap::from_ascii(&["#", "#"]));

        assert_eq!(library.len(), 3);
        assert_eq!(library.inherited(), 2);
        assert!(core::ptr::eq(
            library.get(1).unwrap(),
            dictionary.get(1).unwrap()
        ));

        let widths: Vec<u32> = library.iter().map(Bitmap::width).collect();
        assert_eq!(widths, [1, 2, 1]);
        assert!(library.get(3).is_none());
    }

    #[test]
    fn inherit_through_chain() {
        let mut first = Library::default();
        first.push(Bitmap::from_ascii(&["#."]));

        let mut second = Library::default();
        second.inherit(&first, 1);

        let mut third = Library::default();
        third.inherit(&second, 1);

        assert!(core::ptr::eq(third.get(0).unwrap(), first.get(0).unwrap()));
    }
}
