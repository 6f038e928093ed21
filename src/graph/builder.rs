use std::marker::PhantomData;

use log::info;

use super::{Pipeline, ThreadedPipeline};
use crate::arith::{Coefficient, Element, Sample};
use crate::config::{FilterSpec, IoMode, PipelineOptions, PlatformConfig};
use crate::error::{FirError, Result};
use crate::fir::{BufferArch, Stage, describe, fir_margin};
use crate::io::{OutputSink, SampleSource, StreamSource, WindowSource};

/// Builds a pipeline of `D` samples filtered by `C` coefficients
///
/// ```
/// use tilefir::config::{ElementType, FilterSpec};
/// use tilefir::graph::PipelineBuilder;
///
/// let spec = FilterSpec::asymmetric(ElementType::Int16, ElementType::Int16, 8, 2, 16);
/// let mut pipeline = PipelineBuilder::<i16, i16>::new(spec)
///     .stages(2)
///     .coefficients(&[1, 2, 3, 4, 4, 3, 2, 1])
///     .build()
///     .unwrap();
///
/// let mut block = vec![0i16; 16];
/// block[0] = 1;
/// let out = pipeline.process(&block).unwrap();
/// assert_eq!(&out.primary[..8], &[1, 2, 3, 4, 4, 3, 2, 1]);
/// ```
pub struct PipelineBuilder<D, C> {
    spec: FilterSpec,
    options: PipelineOptions,
    platform: PlatformConfig,
    coefficients: Option<Vec<C>>,
    _data: PhantomData<D>,
}

impl<D: Sample, C: Coefficient<D>> PipelineBuilder<D, C> {
    pub fn new(spec: FilterSpec) -> Self {
        Self {
            spec,
            options: PipelineOptions::default(),
            platform: PlatformConfig::default(),
            coefficients: None,
            _data: PhantomData,
        }
    }

    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn platform(mut self, platform: PlatformConfig) -> Self {
        self.platform = platform;
        self
    }

    pub fn stages(mut self, stages: usize) -> Self {
        self.options.stages = stages;
        self
    }

    pub fn reload(mut self, reload: bool) -> Self {
        self.options.reload = reload;
        self
    }

    pub fn dual_input(mut self, dual_input: bool) -> Self {
        self.options.dual_input = dual_input;
        self
    }

    pub fn outputs(mut self, outputs: usize) -> Self {
        self.options.outputs = outputs;
        self
    }

    pub fn io_mode(mut self, io_mode: IoMode) -> Self {
        self.options.io_mode = io_mode;
        self
    }

    /// Force every stage onto `arch` instead of letting the selector choose
    pub fn architecture(mut self, arch: BufferArch) -> Self {
        self.options.architecture = Some(arch);
        self
    }

    pub fn link_depth(mut self, depth: usize) -> Self {
        self.options.link_depth = depth;
        self
    }

    /// Initial coefficients: the full tap vector, or the unique form for a
    /// half-band filter
    pub fn coefficients(mut self, coefficients: &[C]) -> Self {
        self.coefficients = Some(coefficients.to_vec());
        self
    }

    pub fn build(self) -> Result<Pipeline<D, C>> {
        let parts = self.assemble()?;
        Ok(Pipeline::new(
            parts.spec,
            parts.options,
            parts.margin,
            parts.stages,
            parts.source,
            parts.sink,
        ))
    }

    /// Build and start one thread per stage
    pub fn build_threaded(self) -> Result<ThreadedPipeline<D, C>> {
        let parts = self.assemble()?;
        ThreadedPipeline::spawn(
            parts.spec,
            parts.options,
            parts.stages,
            parts.source,
            parts.sink,
        )
    }

    fn assemble(self) -> Result<Parts<D, C>> {
        let spec = self.spec;
        let options = self.options;
        if spec.data_type != D::ELEMENT || spec.coeff_type != C::ELEMENT {
            return Err(FirError::Config(format!(
                "spec declares {}/{} but the pipeline is built for {}/{}",
                spec.data_type,
                spec.coeff_type,
                D::ELEMENT,
                <C as Element>::ELEMENT
            )));
        }
        let shape = spec.validate(&self.platform)?;
        options.validate(&self.platform)?;

        match &self.coefficients {
            Some(c) if c.len() != spec.coefficient_count() => {
                return Err(FirError::CoefficientCount {
                    expected: spec.coefficient_count(),
                    actual: c.len(),
                });
            }
            None if !options.reload => {
                return Err(FirError::Config(
                    "a static pipeline needs coefficients at build time".into(),
                ));
            }
            _ => {}
        }

        let descriptors = describe(&spec, &options, &shape)?;
        let stages = descriptors
            .into_iter()
            .map(|desc| Stage::new(&spec, &shape, desc, self.coefficients.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let (margin, source): (usize, Box<dyn SampleSource<D>>) = match options.io_mode {
            IoMode::Window => {
                let margin = fir_margin(spec.phase_taps(), shape.align_samples);
                let source = WindowSource::new(margin, spec.window_size);
                (margin, Box::new(source) as Box<dyn SampleSource<D>>)
            }
            IoMode::Stream => {
                let source = StreamSource::new(spec.window_size, options.dual_input);
                (0, Box::new(source) as Box<dyn SampleSource<D>>)
            }
        };
        let sink = OutputSink::new(options.outputs, options.io_mode);

        info!(
            "built {:?} {}/{} interpolator: {} taps x{}, {} stage(s), {:?} I/O, margin {}, reload {}",
            spec.family,
            spec.data_type,
            spec.coeff_type,
            spec.fir_len,
            spec.interpolate_factor,
            stages.len(),
            options.io_mode,
            margin,
            options.reload
        );

        Ok(Parts {
            spec,
            options,
            margin,
            stages,
            source,
            sink,
        })
    }
}

struct Parts<D: Sample, C: Coefficient<D>> {
    spec: FilterSpec,
    options: PipelineOptions,
    margin: usize,
    stages: Vec<Stage<D, C>>,
    source: Box<dyn SampleSource<D>>,
    sink: OutputSink,
}
