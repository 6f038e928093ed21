use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::arith::Sample;
use crate::error::Result;
use crate::fir::CascadePacket;
use crate::io::SourceBlock;

/// Sample block shared between the stages that read it
pub type SampleLink<D> = Arc<SourceBlock<D>>;

/// Per-block coefficient message: `None` keeps the taps in use
pub type CoefficientLink<C> = Option<Arc<[C]>>;

pub struct StageLinks<D: Sample, C> {
    pub samples_in: Receiver<SampleLink<D>>,
    pub samples_out: Option<Sender<SampleLink<D>>>,
    pub cascade_in: Option<Receiver<CascadePacket<D, C>>>,
    pub cascade_out: Option<Sender<CascadePacket<D, C>>>,
    pub coefficients_in: Option<Receiver<CoefficientLink<C>>>,
    pub output: Option<Sender<Result<Vec<D>>>>,
}

/// Caller-side ends of a wired pipeline
pub struct ExternalLinks<D, C> {
    pub samples: Sender<SampleLink<D>>,
    pub coefficients: Option<Sender<CoefficientLink<C>>>,
    pub output: Receiver<Result<Vec<D>>>,
}

/// Create the links for `stages` stages with `depth` slots per channel
pub fn wire<D: Sample, C>(
    stages: usize,
    depth: usize,
    reload: bool,
) -> (ExternalLinks<D, C>, Vec<StageLinks<D, C>>) {
    let (samples_tx, mut samples_rx) = bounded(depth);
    let (coeff_tx, coeff_rx) = if reload {
        let (tx, rx) = bounded(depth);
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };
    let (output_tx, output_rx) = bounded(depth);

    let mut links = Vec::with_capacity(stages);
    let mut cascade_rx = None;
    let mut coefficients_in = coeff_rx;
    for index in 0..stages {
        let last = index + 1 == stages;
        let (samples_out, next_samples_rx) = if last {
            (None, None)
        } else {
            let (tx, rx) = bounded(depth);
            (Some(tx), Some(rx))
        };
        let (cascade_out, next_cascade_rx) = if last {
            (None, None)
        } else {
            let (tx, rx) = bounded(depth);
            (Some(tx), Some(rx))
        };

        links.push(StageLinks {
            samples_in: samples_rx.clone(),
            samples_out,
            cascade_in: cascade_rx.take(),
            cascade_out,
            coefficients_in: coefficients_in.take(),
            output: last.then(|| output_tx.clone()),
        });

        if let Some(rx) = next_samples_rx {
            samples_rx = rx;
        }
        cascade_rx = next_cascade_rx;
    }

    (
        ExternalLinks {
            samples: samples_tx,
            coefficients: coeff_tx,
            output: output_rx,
        },
        links,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_stage_has_no_internal_links() {
        let (_external, links) = wire::<i16, i16>(1, 2, false);
        assert_eq!(links.len(), 1);
        let l = &links[0];
        assert!(l.samples_out.is_none());
        assert!(l.cascade_in.is_none());
        assert!(l.cascade_out.is_none());
        assert!(l.coefficients_in.is_none());
        assert!(l.output.is_some());
    }

    #[test]
    fn test_chain_wiring() {
        let (external, links) = wire::<i16, i16>(3, 2, true);
        assert!(external.coefficients.is_some());
        assert!(links[0].coefficients_in.is_some());
        assert!(links[1].coefficients_in.is_none());
        assert!(links[0].cascade_in.is_none());
        assert!(links[1].cascade_in.is_some());
        assert!(links[2].cascade_out.is_none());
        assert!(links[2].output.is_some());
        assert!(links[1].output.is_none());
    }

    #[test]
    fn test_sample_link_reaches_next_stage() {
        let (_external, links) = wire::<i16, i16>(2, 2, false);
        let block = Arc::new(SourceBlock::Single(vec![1i16, 2, 3]));
        links[0]
            .samples_out
            .as_ref()
            .unwrap()
            .send(block.clone())
            .unwrap();
        let received = links[1].samples_in.recv().unwrap();
        assert!(Arc::ptr_eq(&received, &block));
    }
}
