//! One cascade stage of an interpolating FIR
//!
//! A stage owns a contiguous slice of the filter's taps. Per call it
//! gathers its operands through the register discipline of its buffer
//! architecture, then runs the shared MAC over them. Partial sums enter
//! from the previous stage and leave for the next; the last stage shifts,
//! rounds and saturates them into output samples.
//!
//! Sample buffer layout: output `n` of the block (before interpolation)
//! reads reversed data tap `first_tap + j` from buffer index
//! `origin + n + j`. For window I/O the buffer is the window handed in by
//! the source; for stream I/O it is the stage's delay line followed by the
//! new block.

use log::trace;
use serde::Serialize;

use super::arch::BufferArch;
use super::descriptor::StageDescriptor;
use super::register::{DataRegister, Sweep};
use super::reload::{ReloadState, ReloadToken};
use super::taps::TapTable;
use crate::arith::{Coefficient, Element, OutputStage, Sample};
use crate::config::{FilterFamily, FilterSpec, IoMode, VectorShape};
use crate::error::{FirError, Result};
use crate::io::merge_streams;

/// Samples handed to a stage for one call
#[derive(Debug, Clone, Copy)]
pub enum StageInput<'a, D> {
    Single(&'a [D]),
    /// Two streams interleaved in fixed-size chunks
    Dual(&'a [D], &'a [D]),
}

/// Partial sums and reload trigger carried between adjacent stages
#[derive(Debug, Clone)]
pub struct CascadePacket<D: Sample, C> {
    /// One accumulator per output sample, in output order
    pub acc: Vec<D::Acc>,
    pub reload: Option<ReloadToken<C>>,
}

#[derive(Debug, Clone)]
pub enum StageOutput<D: Sample, C> {
    Cascade(CascadePacket<D, C>),
    Samples(Vec<D>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub calls: u64,
    /// Output vectors computed
    pub vectors: u64,
    /// Data loads issued into the stage's registers
    pub loads: u64,
    /// Coefficient swaps applied
    pub reloads: u64,
}

pub struct Stage<D: Sample, C: Coefficient<D>> {
    desc: StageDescriptor,
    family: FilterFamily,
    factor: usize,
    coefficient_count: usize,
    window_size: usize,
    /// Samples expected per call
    input_len: usize,
    /// Half the even-phase length of a half-band filter
    half_pairs: usize,
    lanes: usize,
    columns: usize,
    output: OutputStage,
    table: TapTable<C>,
    reload: Option<ReloadState<C>>,
    registers: Vec<DataRegister<D>>,
    history: Vec<D>,
    buffer: Vec<D>,
    forward: Vec<D>,
    reverse: Vec<D>,
    centre: Vec<D>,
    stats: StageStats,
}

impl<D: Sample, C: Coefficient<D>> Stage<D, C> {
    /// Build a stage from its descriptor
    ///
    /// Without `coefficients` the tap table starts zeroed; a reloadable
    /// stage then treats the first supplied vector as a change.
    pub fn new(
        spec: &FilterSpec,
        shape: &VectorShape,
        desc: StageDescriptor,
        coefficients: Option<&[C]>,
    ) -> Result<Self> {
        let coefficient_count = spec.coefficient_count();
        if let Some(c) = coefficients {
            if c.len() != coefficient_count {
                return Err(FirError::CoefficientCount {
                    expected: coefficient_count,
                    actual: c.len(),
                });
            }
        }

        let phase_taps = spec.phase_taps();
        let input_len = match desc.io_mode {
            IoMode::Window => desc.origin + (phase_taps - 1) - desc.first_tap + spec.window_size,
            IoMode::Stream => spec.window_size,
        };
        let registers = (0..desc.arch.registers())
            .map(|_| DataRegister::new(shape.load_vsize, shape.register_loads))
            .collect();
        let reload = desc.reloadable.then(|| ReloadState::new(coefficients));

        let zeros;
        let initial = match coefficients {
            Some(c) => c,
            None => {
                zeros = vec![C::default(); coefficient_count];
                &zeros[..]
            }
        };
        let table = tap_table(spec.family, spec.interpolate_factor, &desc, shape.columns, initial);
        let scratch = table.stride() * shape.lanes;

        Ok(Self {
            family: spec.family,
            factor: spec.interpolate_factor,
            coefficient_count,
            window_size: spec.window_size,
            input_len,
            half_pairs: phase_taps / 2,
            lanes: shape.lanes,
            columns: shape.columns,
            output: OutputStage::from_spec(spec),
            table,
            reload,
            registers,
            history: vec![D::default(); desc.lookback],
            buffer: Vec::new(),
            forward: vec![D::default(); scratch],
            reverse: vec![D::default(); scratch],
            centre: vec![D::default(); shape.lanes],
            stats: StageStats::default(),
            desc,
        })
    }

    pub fn descriptor(&self) -> &StageDescriptor {
        &self.desc
    }

    pub fn stats(&self) -> StageStats {
        self.stats
    }

    /// Samples this stage expects per call
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Run one block through the stage
    ///
    /// `upstream` is required exactly when the stage has a cascade input.
    /// `coefficients` is only read by the first stage of a reloadable
    /// pipeline; later stages take their trigger from `upstream`.
    pub fn process(
        &mut self,
        input: StageInput<'_, D>,
        upstream: Option<CascadePacket<D, C>>,
        coefficients: Option<&[C]>,
    ) -> Result<StageOutput<D, C>> {
        let index = self.desc.index;
        let (mut acc, token_in) = match upstream {
            Some(packet) => (packet.acc, packet.reload),
            None => (vec![Default::default(); self.window_size * self.factor], None),
        };
        if acc.len() != self.window_size * self.factor {
            return Err(FirError::BlockSize {
                expected: self.window_size * self.factor,
                actual: acc.len(),
            });
        }

        let merged;
        let samples = match input {
            StageInput::Single(s) => s,
            StageInput::Dual(a, b) => {
                merged = merge_streams(a, b);
                &merged[..]
            }
        };
        if samples.len() != self.input_len {
            return Err(FirError::BlockSize {
                expected: self.input_len,
                actual: samples.len(),
            });
        }

        // Reload decision precedes any MAC work for the block.
        let token = match self.reload.as_mut() {
            Some(state) if self.desc.cascade_in => state.follow(index, token_in),
            Some(state) => match coefficients {
                Some(c) if c.len() != self.coefficient_count => {
                    return Err(FirError::CoefficientCount {
                        expected: self.coefficient_count,
                        actual: c.len(),
                    });
                }
                Some(c) => state.compare(index, c),
                None => state.follow(index, None),
            },
            None => None,
        };
        if let Some(new_taps) = &token {
            self.table = tap_table(self.family, self.factor, &self.desc, self.columns, new_taps);
            self.stats.reloads += 1;
        }

        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        match self.desc.io_mode {
            IoMode::Window => buffer.extend_from_slice(samples),
            IoMode::Stream => {
                buffer.extend_from_slice(&self.history);
                buffer.extend_from_slice(samples);
                let keep = buffer.len() - self.history.len();
                self.history.copy_from_slice(&buffer[keep..]);
            }
        }

        for register in &mut self.registers {
            register.invalidate();
        }
        for vector in 0..self.window_size / self.lanes {
            self.gather(&buffer, vector);
            self.mac(&mut acc, vector * self.lanes);
        }
        self.buffer = buffer;

        self.stats.calls += 1;
        self.stats.vectors += (self.window_size / self.lanes) as u64;
        self.stats.loads = self.registers.iter().map(|r| r.loads()).sum();
        trace!(
            "stage {}: block {} done, {} loads so far",
            index, self.stats.calls, self.stats.loads
        );

        if self.desc.cascade_out {
            Ok(StageOutput::Cascade(CascadePacket { acc, reload: token }))
        } else {
            Ok(StageOutput::Samples(
                acc.into_iter()
                    .map(|a| D::finalize(a, &self.output))
                    .collect(),
            ))
        }
    }

    /// Sample-buffer index of reversed tap `j` on the forward side
    fn forward_index(&self, n0: usize, lane: usize, j: usize) -> usize {
        self.desc.origin + n0 + lane + j
    }

    /// Sample-buffer index of the mirrored partner of forward tap `j`
    fn reverse_index(&self, n0: usize, lane: usize, j: usize) -> usize {
        self.desc.origin + n0 + lane + self.desc.span - 1 - j
    }

    fn centre_index(&self, n0: usize, lane: usize) -> usize {
        self.desc.origin + n0 + lane + self.half_pairs - self.desc.first_tap
    }

    /// Load the operands of output vector `vector` into the scratch rows
    fn gather(&mut self, buffer: &[D], vector: usize) {
        let n0 = vector * self.lanes;
        let count = self.desc.tap_count;
        let symmetric = self.family == FilterFamily::HalfBand;

        match self.desc.arch {
            BufferArch::SingleIncremental | BufferArch::StreamIncremental => {
                let lo = self.desc.origin + n0;
                let hi = lo + self.lanes + self.desc.span - 2;
                let register = &mut self.registers[0];
                register.pin(lo, hi);
                register.prefetch(buffer, lo, hi, Sweep::Forward);
                self.read_forward(buffer, n0, 0, 0..count, Sweep::Forward);
                if symmetric {
                    self.read_reverse(buffer, n0, 0, 0..count, Sweep::Forward);
                }
            }
            BufferArch::DualBuffer | BufferArch::ZigZag => {
                let zig = self.desc.arch == BufferArch::DualBuffer || vector % 2 == 0;
                if self.desc.arch == BufferArch::DualBuffer {
                    for register in &mut self.registers {
                        register.invalidate();
                    }
                }
                let (ahead, behind) = if zig {
                    (Sweep::Forward, Sweep::Reverse)
                } else {
                    (Sweep::Reverse, Sweep::Forward)
                };
                if symmetric {
                    self.read_forward(buffer, n0, 0, 0..count, ahead);
                    self.read_reverse(buffer, n0, 1, 0..count, behind);
                } else {
                    let ops = count.div_ceil(self.columns);
                    let split = (ops.div_ceil(2) * self.columns).min(count);
                    self.read_forward(buffer, n0, 0, 0..split, ahead);
                    self.read_forward(buffer, n0, 1, split..count, behind);
                }
            }
        }

        if self.desc.centre_tap {
            for lane in 0..self.lanes {
                let idx = self.centre_index(n0, lane);
                self.centre[lane] = self.registers[0].read(buffer, idx, Sweep::Forward);
            }
        }
    }

    /// Forward-side operands for taps `taps` through register `reg`.
    /// `sweep` sets the traversal order; the scratch layout is fixed.
    fn read_forward(
        &mut self,
        buffer: &[D],
        n0: usize,
        reg: usize,
        taps: std::ops::Range<usize>,
        sweep: Sweep,
    ) {
        let lanes = self.lanes;
        let order: Vec<(usize, usize)> = match sweep {
            Sweep::Forward => taps.flat_map(|j| (0..lanes).map(move |l| (j, l))).collect(),
            Sweep::Reverse => taps
                .rev()
                .flat_map(|j| (0..lanes).rev().map(move |l| (j, l)))
                .collect(),
        };
        for (j, lane) in order {
            let idx = self.forward_index(n0, lane, j);
            self.forward[j * lanes + lane] = self.registers[reg].read(buffer, idx, sweep);
        }
    }

    /// Mirrored operands of a symmetric filter; addresses fall as `j` rises
    fn read_reverse(
        &mut self,
        buffer: &[D],
        n0: usize,
        reg: usize,
        taps: std::ops::Range<usize>,
        sweep: Sweep,
    ) {
        let lanes = self.lanes;
        let order: Vec<(usize, usize)> = match sweep {
            Sweep::Reverse => taps.flat_map(|j| (0..lanes).rev().map(move |l| (j, l))).collect(),
            Sweep::Forward => taps
                .rev()
                .flat_map(|j| (0..lanes).map(move |l| (j, l)))
                .collect(),
        };
        for (j, lane) in order {
            let idx = self.reverse_index(n0, lane, j);
            self.reverse[j * lanes + lane] = self.registers[reg].read(buffer, idx, sweep);
        }
    }

    /// Accumulate the gathered vector into `acc`, one `lanes x columns`
    /// op at a time, ascending over taps. Padding taps meet zeroed operands.
    fn mac(&self, acc: &mut [D::Acc], n0: usize) {
        let lanes = self.lanes;
        let columns = self.columns;
        match self.family {
            FilterFamily::Asymmetric => {
                for phase in 0..self.factor {
                    for lane in 0..lanes {
                        let out = (n0 + lane) * self.factor + phase;
                        let mut a = acc[out];
                        for (op, group) in self.table.ops(phase).enumerate() {
                            for (col, &tap) in group.iter().enumerate() {
                                let j = op * columns + col;
                                a += C::product(self.forward[j * lanes + lane].widen(), tap);
                            }
                        }
                        acc[out] = a;
                    }
                }
            }
            FilterFamily::HalfBand => {
                for lane in 0..lanes {
                    let out = (n0 + lane) * 2;
                    let mut a = acc[out];
                    for (op, group) in self.table.ops(0).enumerate() {
                        for (col, &tap) in group.iter().enumerate() {
                            let k = (op * columns + col) * lanes + lane;
                            let pair = self.forward[k].widen() + self.reverse[k].widen();
                            a += C::product(pair, tap);
                        }
                    }
                    acc[out] = a;

                    if let Some(tap) = self.table.centre() {
                        acc[out + 1] += C::product(self.centre[lane].widen(), tap);
                    }
                }
            }
        }
    }
}

fn tap_table<C: Element>(
    family: FilterFamily,
    factor: usize,
    desc: &StageDescriptor,
    columns: usize,
    coefficients: &[C],
) -> TapTable<C> {
    match family {
        FilterFamily::Asymmetric => TapTable::asymmetric(
            coefficients,
            factor,
            desc.first_tap,
            desc.tap_count,
            columns,
        ),
        FilterFamily::HalfBand => TapTable::half_band(
            coefficients,
            desc.first_tap,
            desc.tap_count,
            columns,
            desc.centre_tap,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ElementType, PipelineOptions, PlatformConfig};
    use crate::fir::describe;

    fn single_stage(
        spec: &FilterSpec,
        options: &PipelineOptions,
        taps: &[i16],
    ) -> Stage<i16, i16> {
        let shape = spec.validate(&PlatformConfig::default()).unwrap();
        let desc = describe(spec, options, &shape).unwrap().remove(0);
        Stage::new(spec, &shape, desc, Some(taps)).unwrap()
    }

    fn samples(output: StageOutput<i16, i16>) -> Vec<i16> {
        match output {
            StageOutput::Samples(s) => s,
            StageOutput::Cascade(_) => panic!("expected samples"),
        }
    }

    #[test]
    fn test_impulse_reproduces_taps() {
        let spec = FilterSpec::asymmetric(ElementType::Int16, ElementType::Int16, 8, 2, 16);
        let taps = [1i16, 2, 3, 4, 4, 3, 2, 1];
        let mut stage = single_stage(&spec, &PipelineOptions::default(), &taps);
        assert_eq!(stage.input_len(), 32);

        let mut window = vec![0i16; 32];
        window[16] = 1;
        let out = samples(stage.process(StageInput::Single(&window), None, None).unwrap());
        assert_eq!(&out[..8], &taps);
        assert!(out[8..].iter().all(|&y| y == 0));
    }

    #[test]
    fn test_odd_tap_count_sweeps_padded_ops() {
        // 3 taps per phase pad to two 2-column ops
        let spec = FilterSpec::asymmetric(ElementType::Int16, ElementType::Int16, 6, 2, 16);
        let taps = [5i16, -3, 7, 2, -1, 4];
        let mut stage = single_stage(&spec, &PipelineOptions::default(), &taps);
        assert_eq!(stage.forward.len(), 4 * stage.lanes);

        let mut window = vec![0i16; stage.input_len()];
        window[16] = 1;
        let out = samples(stage.process(StageInput::Single(&window), None, None).unwrap());
        assert_eq!(&out[..6], &taps);
        assert!(out[6..].iter().all(|&y| y == 0));
    }

    #[test]
    fn test_wrong_window_length() {
        let spec = FilterSpec::asymmetric(ElementType::Int16, ElementType::Int16, 8, 2, 16);
        let taps = [1i16; 8];
        let mut stage = single_stage(&spec, &PipelineOptions::default(), &taps);
        let window = vec![0i16; 16];
        assert!(matches!(
            stage.process(StageInput::Single(&window), None, None),
            Err(FirError::BlockSize {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_stream_history_carries_across_calls() {
        let spec = FilterSpec::asymmetric(ElementType::Int16, ElementType::Int16, 8, 2, 16);
        let options = PipelineOptions {
            io_mode: IoMode::Stream,
            ..Default::default()
        };
        let taps = [1i16, 2, 3, 4, 4, 3, 2, 1];
        let mut stage = single_stage(&spec, &options, &taps);

        let mut block = vec![0i16; 16];
        block[15] = 1;
        let first = samples(stage.process(StageInput::Single(&block), None, None).unwrap());
        assert_eq!(&first[30..], &taps[..2]);

        let zeros = vec![0i16; 16];
        let second = samples(stage.process(StageInput::Single(&zeros), None, None).unwrap());
        assert_eq!(&second[..6], &taps[2..]);
    }

    #[test]
    fn test_wrong_coefficient_count() {
        let spec = FilterSpec::asymmetric(ElementType::Int16, ElementType::Int16, 8, 2, 16);
        let shape = spec.validate(&PlatformConfig::default()).unwrap();
        let desc = describe(&spec, &PipelineOptions::default(), &shape)
            .unwrap()
            .remove(0);
        let result = Stage::<i16, i16>::new(&spec, &shape, desc, Some(&[1, 2, 3]));
        assert!(matches!(
            result,
            Err(FirError::CoefficientCount {
                expected: 8,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_stats_count_vectors_and_loads() {
        let spec = FilterSpec::asymmetric(ElementType::Int16, ElementType::Int16, 8, 2, 32);
        let taps = [1i16; 8];
        let mut stage = single_stage(&spec, &PipelineOptions::default(), &taps);
        let window = vec![1i16; stage.input_len()];
        stage.process(StageInput::Single(&window), None, None).unwrap();
        let stats = stage.stats();
        assert_eq!(stats.calls, 1);
        assert_eq!(stats.vectors, 4);
        assert!(stats.loads > 0);
        assert_eq!(stats.reloads, 0);
    }
}
