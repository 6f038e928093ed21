//! Data-flow runner with one thread per stage
//!
//! A stage starts block `k` as soon as block `k` has arrived on its sample
//! link and, unless it is the first stage, on its cascade link. Blocks
//! leave in the order they were submitted. Links are bounded, so callers
//! must keep receiving outputs: at most about `link_depth` blocks per
//! stage can be in flight.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use log::{debug, error};

use super::links::{CoefficientLink, ExternalLinks, SampleLink, StageLinks};
use crate::arith::{Coefficient, Sample};
use crate::config::{FilterSpec, PipelineOptions};
use crate::error::{FirError, Result};
use crate::fir::{Stage, StageOutput, StageStats};
use crate::io::{OutputSink, PipelineOutput, SampleSource, SourceBlock};

pub struct ThreadedPipeline<D: Sample, C: Coefficient<D>> {
    spec: FilterSpec,
    options: PipelineOptions,
    source: Box<dyn SampleSource<D>>,
    sink: OutputSink,
    samples: Option<Sender<SampleLink<D>>>,
    coefficients: Option<Sender<CoefficientLink<C>>>,
    output: crossbeam_channel::Receiver<Result<Vec<D>>>,
    handles: Vec<JoinHandle<StageStats>>,
}

impl<D: Sample, C: Coefficient<D>> ThreadedPipeline<D, C> {
    pub(super) fn spawn(
        spec: FilterSpec,
        options: PipelineOptions,
        stages: Vec<Stage<D, C>>,
        source: Box<dyn SampleSource<D>>,
        sink: OutputSink,
    ) -> Result<Self> {
        let (external, links) =
            super::links::wire::<D, C>(stages.len(), options.link_depth, options.reload);
        let ExternalLinks {
            samples,
            coefficients,
            output,
        } = external;

        let mut handles = Vec::with_capacity(stages.len());
        for (stage, links) in stages.into_iter().zip(links) {
            let index = stage.descriptor().index;
            let handle = std::thread::Builder::new()
                .name(format!("fir-stage-{}", index))
                .spawn(move || run_stage(stage, links))
                .map_err(|e| {
                    error!("failed to spawn stage {}: {}", index, e);
                    FirError::Disconnected("stage thread could not be started")
                })?;
            handles.push(handle);
        }
        debug!("spawned {} stage threads", handles.len());

        Ok(Self {
            spec,
            options,
            source,
            sink,
            samples: Some(samples),
            coefficients,
            output,
            handles,
        })
    }

    /// Queue one block with the current taps
    pub fn submit(&mut self, block: &[D]) -> Result<()> {
        self.send(block, None)
    }

    /// Queue one block together with the coefficients it should use
    pub fn submit_with_coefficients(&mut self, block: &[D], coefficients: &[C]) -> Result<()> {
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
        self.send(block, Some(Arc::from(coefficients)))
    }

    fn send(&mut self, block: &[D], coefficients: CoefficientLink<C>) -> Result<()> {
        let samples = self
            .samples
            .as_ref()
            .ok_or(FirError::Disconnected("pipeline input closed"))?;
        let input = self.source.next_block(block)?;
        samples
            .send(Arc::new(input))
            .map_err(|_| FirError::Disconnected("stage 0 sample link"))?;
        if let Some(tx) = &self.coefficients {
            tx.send(coefficients)
                .map_err(|_| FirError::Disconnected("stage 0 coefficient link"))?;
        }
        Ok(())
    }

    /// Wait for the next output block
    pub fn recv(&self) -> Result<PipelineOutput<D>> {
        let samples = self
            .output
            .recv()
            .map_err(|_| FirError::Disconnected("pipeline output"))??;
        Ok(self.sink.emit(samples))
    }

    /// Submit one block and wait for its output
    pub fn process(&mut self, block: &[D]) -> Result<PipelineOutput<D>> {
        self.submit(block)?;
        self.recv()
    }

    pub fn process_with_coefficients(
        &mut self,
        block: &[D],
        coefficients: &[C],
    ) -> Result<PipelineOutput<D>> {
        self.submit_with_coefficients(block, coefficients)?;
        self.recv()
    }

    /// Close the input, let in-flight blocks drain and join every stage
    ///
    /// Outputs not yet received are discarded.
    pub fn finish(mut self) -> Result<Vec<StageStats>> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<Vec<StageStats>> {
        self.samples = None;
        self.coefficients = None;
        // Drain so the last stage never blocks on a full output link.
        while self.output.recv().is_ok() {}

        let mut stats = Vec::with_capacity(self.handles.len());
        for handle in self.handles.drain(..) {
            let s = handle
                .join()
                .map_err(|_| FirError::Disconnected("stage thread panicked"))?;
            stats.push(s);
        }
        Ok(stats)
    }
}

impl<D: Sample, C: Coefficient<D>> Drop for ThreadedPipeline<D, C> {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            if let Err(e) = self.shutdown() {
                error!("pipeline shutdown: {}", e);
            }
        }
    }
}

fn run_stage<D: Sample, C: Coefficient<D>>(
    mut stage: Stage<D, C>,
    links: StageLinks<D, C>,
) -> StageStats {
    let index = stage.descriptor().index;
    while let Ok(block) = links.samples_in.recv() {
        let upstream = match &links.cascade_in {
            Some(rx) => match rx.recv() {
                Ok(packet) => Some(packet),
                Err(_) => break,
            },
            None => None,
        };
        let coefficients = match &links.coefficients_in {
            Some(rx) => match rx.recv() {
                Ok(c) => c,
                Err(_) => break,
            },
            None => None,
        };

        // Later stages see one merged sequence.
        if let Some(tx) = &links.samples_out {
            let broadcast = match &*block {
                SourceBlock::Single(_) => block.clone(),
                SourceBlock::Dual(..) => Arc::new(SourceBlock::Single(block.samples().into_owned())),
            };
            if tx.send(broadcast).is_err() {
                break;
            }
        }

        match stage.process(block.as_input(), upstream, coefficients.as_deref()) {
            Ok(StageOutput::Cascade(packet)) => {
                if let Some(tx) = &links.cascade_out {
                    if tx.send(packet).is_err() {
                        break;
                    }
                }
            }
            Ok(StageOutput::Samples(samples)) => {
                if let Some(tx) = &links.output {
                    if tx.send(Ok(samples)).is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                error!("stage {}: {}", index, e);
                if let Some(tx) = &links.output {
                    let _ = tx.send(Err(e));
                }
                break;
            }
        }
    }
    debug!("stage {} exiting", index);
    stage.stats()
}
