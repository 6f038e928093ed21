//! Direct-form reference interpolator
//!
//! Computes `y[n * I + p] = sum_k h[k * I + p] * x[n - k]` straight from
//! the full tap vector with a ring-buffer delay line, then applies the
//! same output stage as the pipeline. Used as the golden model in tests
//! and by `tilefir --verify`.

use crate::arith::{Coefficient, OutputStage, Sample};
use crate::config::{FilterFamily, FilterSpec};
use crate::constants::HALF_BAND_LEN_MIN;
use crate::error::{FirError, Result};
use crate::fir::expand_half_band;

pub struct ReferenceInterpolator<D: Sample, C> {
    taps: Vec<C>,
    factor: usize,
    delay_line: Vec<D>,
    pos: usize,
    output: OutputStage,
}

impl<D: Sample, C: Coefficient<D>> ReferenceInterpolator<D, C> {
    /// Create from a full tap vector whose length is a multiple of `factor`
    pub fn new(taps: Vec<C>, factor: usize, output: OutputStage) -> Result<Self> {
        if factor == 0 || taps.is_empty() || taps.len() % factor != 0 {
            return Err(FirError::TapLength {
                taps: taps.len(),
                reason: format!("must be a non-zero multiple of {}", factor),
            });
        }
        Ok(Self {
            delay_line: vec![D::default(); taps.len() / factor],
            taps,
            factor,
            pos: 0,
            output,
        })
    }

    /// Create the model of `spec` with user-facing `coefficients`
    ///
    /// Half-band coefficients are expanded, and padded with one zero tap so
    /// both polyphase branches have equal length.
    pub fn from_spec(spec: &FilterSpec, coefficients: &[C]) -> Result<Self> {
        if coefficients.len() != spec.coefficient_count() {
            return Err(FirError::CoefficientCount {
                expected: spec.coefficient_count(),
                actual: coefficients.len(),
            });
        }
        let taps = match spec.family {
            FilterFamily::Asymmetric => coefficients.to_vec(),
            FilterFamily::HalfBand => {
                if spec.fir_len < HALF_BAND_LEN_MIN || (spec.fir_len + 1) % 4 != 0 {
                    return Err(FirError::TapLength {
                        taps: spec.fir_len,
                        reason: "half-band length must be 4n-1 with n >= 1".into(),
                    });
                }
                let mut taps = expand_half_band(coefficients, spec.fir_len);
                taps.push(C::default());
                taps
            }
        };
        Self::new(taps, spec.interpolate_factor, OutputStage::from_spec(spec))
    }

    /// Replace the taps, keeping the delay line
    pub fn set_taps(&mut self, taps: Vec<C>) -> Result<()> {
        if taps.len() != self.taps.len() {
            return Err(FirError::CoefficientCount {
                expected: self.taps.len(),
                actual: taps.len(),
            });
        }
        self.taps = taps;
        Ok(())
    }

    /// Push one input sample and produce its `factor` output samples
    pub fn process(&mut self, sample: D, out: &mut Vec<D>) {
        self.delay_line[self.pos] = sample;
        let n = self.delay_line.len();

        for phase in 0..self.factor {
            let mut acc = D::Acc::default();
            // Walk the ring newest to oldest in two contiguous ranges.
            let mut k = 0usize;
            for delay_idx in (0..=self.pos).rev() {
                acc += C::product(self.delay_line[delay_idx].widen(), self.taps[k * self.factor + phase]);
                k += 1;
            }
            for delay_idx in ((self.pos + 1)..n).rev() {
                acc += C::product(self.delay_line[delay_idx].widen(), self.taps[k * self.factor + phase]);
                k += 1;
            }
            debug_assert_eq!(k, n);
            out.push(D::finalize(acc, &self.output));
        }

        self.pos += 1;
        if self.pos == n {
            self.pos = 0;
        }
    }

    pub fn process_block(&mut self, block: &[D]) -> Vec<D> {
        let mut out = Vec::with_capacity(block.len() * self.factor);
        for &sample in block {
            self.process(sample, &mut out);
        }
        out
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn taps(&self) -> &[C] {
        &self.taps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ElementType, RoundingMode};

    #[test]
    fn test_impulse_response() {
        let taps = vec![1i16, 2, 3, 4, 4, 3, 2, 1];
        let mut model = ReferenceInterpolator::<i16, i16>::new(taps.clone(), 2, OutputStage::default())
            .unwrap();
        let mut block = vec![0i16; 8];
        block[0] = 1;
        let out = model.process_block(&block);
        assert_eq!(&out[..8], &taps[..]);
        assert!(out[8..].iter().all(|&y| y == 0));
    }

    #[test]
    fn test_state_carries_across_blocks() {
        let taps: Vec<i32> = (1..=12).collect();
        let input: Vec<i32> = (0..24).map(|i| (i * 37 % 11) - 5).collect();

        let mut whole = ReferenceInterpolator::<i32, i32>::new(taps.clone(), 3, OutputStage::default())
            .unwrap();
        let expected = whole.process_block(&input);

        let mut split = ReferenceInterpolator::<i32, i32>::new(taps, 3, OutputStage::default())
            .unwrap();
        let mut actual = split.process_block(&input[..10]);
        actual.extend(split.process_block(&input[10..]));
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_output_stage_applied() {
        let spec = FilterSpec::asymmetric(ElementType::Int16, ElementType::Int16, 2, 1, 8)
            .with_shift(1)
            .with_rounding(RoundingMode::ConvEven);
        let mut model = ReferenceInterpolator::<i16, i16>::from_spec(&spec, &[5, 0]).unwrap();
        let out = model.process_block(&[1, 0, 0]);
        // 2.5 rounds to even
        assert_eq!(out, vec![2, 0, 0]);
    }

    #[test]
    fn test_half_band_from_spec() {
        let spec = FilterSpec::half_band(ElementType::Int16, ElementType::Int16, 7, 8);
        let model = ReferenceInterpolator::<i16, i16>::from_spec(&spec, &[1, 2, 8]).unwrap();
        assert_eq!(model.taps(), &[1, 0, 2, 8, 2, 0, 1, 0]);
    }

    #[test]
    fn test_rejects_ragged_taps() {
        assert!(ReferenceInterpolator::<i16, i16>::new(vec![1, 2, 3], 2, OutputStage::default()).is_err());
    }

    #[test]
    fn test_rejects_bad_half_band_length() {
        let spec = FilterSpec::half_band(ElementType::Int16, ElementType::Int16, 0, 8);
        assert!(matches!(
            ReferenceInterpolator::<i16, i16>::from_spec(&spec, &[1]),
            Err(FirError::TapLength { taps: 0, .. })
        ));
    }
}
