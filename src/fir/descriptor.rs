use log::info;

use super::arch::{BufferArch, SelectorInputs, resolve};
use super::partition::{TapRange, fir_margin, partition};
use crate::config::{FilterFamily, FilterSpec, IoMode, PipelineOptions, VectorShape};
use crate::error::Result;

/// Where a stage sits in the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadePosition {
    /// Single-stage pipeline
    Only,
    First,
    Middle,
    Last,
}

/// Everything a stage needs to know about its place in the pipeline
///
/// Derived once from the filter spec and pipeline options by [`describe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    pub index: usize,
    pub stages: usize,
    /// Owned slice of the reversed tap vector, in partition units
    pub range: TapRange,
    /// First reversed data tap (asymmetric) or tap pair (half-band) owned
    pub first_tap: usize,
    /// Data taps or tap pairs owned
    pub tap_count: usize,
    /// Data samples spanned by the owned taps for one output
    pub span: usize,
    /// Applies the half-band centre tap
    pub centre_tap: bool,
    pub cascade_in: bool,
    pub cascade_out: bool,
    /// External output ports driven by this stage
    pub outputs: usize,
    pub reloadable: bool,
    pub io_mode: IoMode,
    /// Input arrives as two interleaved streams
    pub dual_input: bool,
    pub arch: BufferArch,
    /// History samples kept ahead of each new block
    pub lookback: usize,
    /// Sample-buffer index of the oldest sample feeding the first output
    pub origin: usize,
    /// Misalignment of `origin` within a load
    pub x_offset: usize,
}

impl StageDescriptor {
    pub fn position(&self) -> CascadePosition {
        match (self.cascade_in, self.cascade_out) {
            (false, false) => CascadePosition::Only,
            (false, true) => CascadePosition::First,
            (true, true) => CascadePosition::Middle,
            (true, false) => CascadePosition::Last,
        }
    }
}

/// Partition the filter and choose each stage's buffer architecture
pub fn describe(
    spec: &FilterSpec,
    options: &PipelineOptions,
    shape: &VectorShape,
) -> Result<Vec<StageDescriptor>> {
    let (total, unit) = spec.partition_units();
    let ranges = partition(total, options.stages, unit)?;
    let phase_taps = spec.phase_taps();
    let margin = fir_margin(phase_taps, shape.align_samples);
    let stages = ranges.len();

    let mut descriptors = Vec::with_capacity(stages);
    for (index, range) in ranges.into_iter().enumerate() {
        let (first_tap, tap_count, span) = match spec.family {
            FilterFamily::Asymmetric => {
                let first = range.offset / unit;
                let count = range.len / unit;
                (first, count, count)
            }
            FilterFamily::HalfBand => (range.offset, range.len, phase_taps - 2 * range.offset),
        };
        let lookback = phase_taps - 1 - first_tap;
        let origin = match options.io_mode {
            IoMode::Window => margin - (phase_taps - 1) + first_tap,
            IoMode::Stream => 0,
        };
        let dual_input = options.dual_input && index == 0;
        let last = index + 1 == stages;

        let inputs = SelectorInputs {
            lanes: shape.lanes,
            columns: shape.columns,
            load_vsize: shape.load_vsize,
            register_loads: shape.register_loads,
            window_size: spec.window_size,
            span,
            x_offset: origin % shape.load_vsize,
            symmetric: spec.is_symmetric(),
            io_mode: options.io_mode,
            dual_input,
        };
        let arch = resolve(&inputs, options.architecture, stages, index)?;

        info!(
            "stage {}/{}: taps {}..{} ({} x{}), span {}, lookback {}, arch {}",
            index,
            stages,
            range.offset,
            range.end(),
            tap_count,
            unit,
            span,
            lookback,
            arch
        );

        descriptors.push(StageDescriptor {
            index,
            stages,
            range,
            first_tap,
            tap_count,
            span,
            centre_tap: last && spec.is_symmetric(),
            cascade_in: index > 0,
            cascade_out: !last,
            outputs: if last { options.outputs } else { 0 },
            reloadable: options.reload,
            io_mode: options.io_mode,
            dual_input,
            arch,
            lookback,
            origin,
            x_offset: inputs.x_offset,
        });
    }
    Ok(descriptors)
}
