mod sink;
mod source;
pub mod stimulus;

pub use sink::{OutputSink, PipelineOutput};
pub use source::{SampleSource, SourceBlock, StreamSource, WindowSource};
pub use stimulus::Stimulus;

use crate::arith::Element;
use crate::constants::STREAM_INTERLEAVE_BYTES;

/// Samples per interleave chunk for element type `D`
pub fn interleave_chunk<D: Element>() -> usize {
    (STREAM_INTERLEAVE_BYTES / D::ELEMENT.bytes()).max(1)
}

/// Split `samples` into two streams of alternating chunks, starting on the
/// first
pub fn split_streams<D: Element>(samples: &[D]) -> (Vec<D>, Vec<D>) {
    let mut first = Vec::with_capacity(samples.len() / 2 + 1);
    let mut second = Vec::with_capacity(samples.len() / 2 + 1);
    for (i, chunk) in samples.chunks(interleave_chunk::<D>()).enumerate() {
        if i % 2 == 0 {
            first.extend_from_slice(chunk);
        } else {
            second.extend_from_slice(chunk);
        }
    }
    (first, second)
}

/// Rebuild one sequence from two interleaved streams
pub fn merge_streams<D: Element>(first: &[D], second: &[D]) -> Vec<D> {
    let chunk = interleave_chunk::<D>();
    let mut merged = Vec::with_capacity(first.len() + second.len());
    let mut a = first.chunks(chunk);
    let mut b = second.chunks(chunk);
    loop {
        match (a.next(), b.next()) {
            (None, None) => break,
            (x, y) => {
                if let Some(x) = x {
                    merged.extend_from_slice(x);
                }
                if let Some(y) = y {
                    merged.extend_from_slice(y);
                }
            }
        }
    }
    merged
}
