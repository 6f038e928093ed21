use log::trace;

use crate::arith::{Coefficient, Sample};
use crate::config::{FilterSpec, PipelineOptions};
use crate::error::{FirError, Result};
use crate::fir::{StageDescriptor, Stage, StageInput, StageOutput, StageStats};
use crate::io::{OutputSink, PipelineOutput, SampleSource};

/// Synchronous pipeline: every call runs all stages in order
///
/// Built by [`PipelineBuilder`](super::PipelineBuilder).
pub struct Pipeline<D: Sample, C: Coefficient<D>> {
    spec: FilterSpec,
    options: PipelineOptions,
    margin: usize,
    stages: Vec<Stage<D, C>>,
    source: Box<dyn SampleSource<D>>,
    sink: OutputSink,
    blocks: u64,
}

impl<D: Sample, C: Coefficient<D>> Pipeline<D, C> {
    pub(super) fn new(
        spec: FilterSpec,
        options: PipelineOptions,
        margin: usize,
        stages: Vec<Stage<D, C>>,
        source: Box<dyn SampleSource<D>>,
        sink: OutputSink,
    ) -> Self {
        Self {
            spec,
            options,
            margin,
            stages,
            source,
            sink,
            blocks: 0,
        }
    }

    /// Filter one block of `window_size` new samples with the current taps
    pub fn process(&mut self, block: &[D]) -> Result<PipelineOutput<D>> {
        self.run(block, None)
    }

    /// Filter one block, first swapping to `coefficients` if they differ
    /// from the ones in use
    ///
    /// All stages switch on this block, whatever the stage count.
    pub fn process_with_coefficients(
        &mut self,
        block: &[D],
        coefficients: &[C],
    ) -> Result<PipelineOutput<D>> {
        if !self.options.reload {
            return Err(FirError::Config(
                "pipeline was not built for coefficient reload".into(),
            ));
        }
        let expected = self.spec.coefficient_count();
        if coefficients.len() != expected {
            return Err(FirError::CoefficientCount {
                expected,
                actual: coefficients.len(),
            });
        }
        self.run(block, Some(coefficients))
    }

    fn run(&mut self, block: &[D], coefficients: Option<&[C]>) -> Result<PipelineOutput<D>> {
        let input = self.source.next_block(block)?;
        let broadcast = input.samples();

        let mut packet = None;
        for stage in &mut self.stages {
            let (samples, coeffs) = if stage.descriptor().index == 0 {
                (input.as_input(), coefficients)
            } else {
                (StageInput::Single(&broadcast[..]), None)
            };
            match stage.process(samples, packet.take(), coeffs)? {
                StageOutput::Cascade(next) => packet = Some(next),
                StageOutput::Samples(out) => {
                    self.blocks += 1;
                    trace!("block {}: {} output samples", self.blocks, out.len());
                    return Ok(self.sink.emit(out));
                }
            }
        }
        Err(FirError::Disconnected("no stage drives the output"))
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// History samples prefixed to each window (0 for stream pipelines)
    pub fn margin(&self) -> usize {
        self.margin
    }

    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    pub fn descriptors(&self) -> Vec<&StageDescriptor> {
        self.stages.iter().map(|s| s.descriptor()).collect()
    }

    pub fn stats(&self) -> Vec<StageStats> {
        self.stages.iter().map(|s| s.stats()).collect()
    }
}
