//! Fixed-size grouping of a row stream
//!
//! Works on any iterator, lazy or not, and consumes it exactly once.

use std::num::NonZeroUsize;

/// Iterator over successive groups of at most `size` items
///
/// Every group is non-empty; only the last may be shorter than `size`.
#[derive(Debug, Clone)]
pub struct Chunks<I> {
    iter: I,
    size: NonZeroUsize,
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<I::Item> = self.iter.by_ref().take(self.size.get()).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.size.get();
        let (lower, upper) = self.iter.size_hint();
        (lower.div_ceil(size), upper.map(|u| u.div_ceil(size)))
    }
}

/// Split `items` into groups of `size`
pub fn chunky<I: IntoIterator>(items: I, size: NonZeroUsize) -> Chunks<I::IntoIter> {
    Chunks {
        iter: items.into_iter(),
        size,
    }
}
