use std::borrow::Cow;

use super::{merge_streams, split_streams};
use crate::arith::Element;
use crate::error::{FirError, Result};
use crate::fir::StageInput;

/// What a source hands to the first stage for one block
#[derive(Debug, Clone, PartialEq)]
pub enum SourceBlock<D> {
    Single(Vec<D>),
    /// Two interleaved streams
    Dual(Vec<D>, Vec<D>),
}

impl<D: Element> SourceBlock<D> {
    pub fn as_input(&self) -> StageInput<'_, D> {
        match self {
            Self::Single(s) => StageInput::Single(s),
            Self::Dual(a, b) => StageInput::Dual(a, b),
        }
    }

    /// The block as one sequence, for broadcast to later stages
    pub fn samples(&self) -> Cow<'_, [D]> {
        match self {
            Self::Single(s) => Cow::Borrowed(s),
            Self::Dual(a, b) => Cow::Owned(merge_streams(a, b)),
        }
    }
}

pub trait SampleSource<D>: Send {
    /// Wrap the next block of new samples for the first stage
    fn next_block(&mut self, block: &[D]) -> Result<SourceBlock<D>>;

    /// New samples expected per block
    fn block_len(&self) -> usize;
}

/// Window source: prefixes each block with `margin` samples of history
///
/// History starts as zeros, so the first outputs of a stream see a
/// zero-padded past.
pub struct WindowSource<D> {
    margin: usize,
    window_size: usize,
    history: Vec<D>,
}

impl<D: Element> WindowSource<D> {
    pub fn new(margin: usize, window_size: usize) -> Self {
        Self {
            margin,
            window_size,
            history: vec![D::default(); margin],
        }
    }
}

impl<D: Element> SampleSource<D> for WindowSource<D> {
    fn next_block(&mut self, block: &[D]) -> Result<SourceBlock<D>> {
        if block.len() != self.window_size {
            return Err(FirError::BlockSize {
                expected: self.window_size,
                actual: block.len(),
            });
        }
        let mut window = Vec::with_capacity(self.margin + block.len());
        window.extend_from_slice(&self.history);
        window.extend_from_slice(block);
        let keep = window.len() - self.margin;
        self.history.copy_from_slice(&window[keep..]);
        Ok(SourceBlock::Single(window))
    }

    fn block_len(&self) -> usize {
        self.window_size
    }
}

/// Stream source: passes new samples through, optionally split over two
/// interleaved streams
pub struct StreamSource {
    window_size: usize,
    dual: bool,
}

impl StreamSource {
    pub fn new(window_size: usize, dual: bool) -> Self {
        Self { window_size, dual }
    }
}

impl<D: Element> SampleSource<D> for StreamSource {
    fn next_block(&mut self, block: &[D]) -> Result<SourceBlock<D>> {
        if block.len() != self.window_size {
            return Err(FirError::BlockSize {
                expected: self.window_size,
                actual: block.len(),
            });
        }
        if self.dual {
            let (a, b) = split_streams(block);
            Ok(SourceBlock::Dual(a, b))
        } else {
            Ok(SourceBlock::Single(block.to_vec()))
        }
    }

    fn block_len(&self) -> usize {
        self.window_size
    }
}
