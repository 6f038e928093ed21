use crate::config::{FilterSpec, RoundingMode, SaturationMode};

/// Shift `acc` right by `shift` bits, rounding the discarded bits per `mode`
///
/// All modes are expressed as a bias added before an arithmetic shift, so
/// the result is exact for any accumulator value that fits in `i128` with
/// `shift` bits of headroom.
pub fn shift_round(acc: i128, shift: u32, mode: RoundingMode) -> i128 {
    if shift == 0 {
        return acc;
    }
    let half = 1i128 << (shift - 1);
    let below_half = half - 1;
    let odd = (acc >> shift) & 1 == 1;

    let bias = match mode {
        RoundingMode::Floor => 0,
        RoundingMode::Ceil => (1i128 << shift) - 1,
        RoundingMode::PosInf => half,
        RoundingMode::NegInf => below_half,
        RoundingMode::SymInf => {
            if acc < 0 {
                below_half
            } else {
                half
            }
        }
        RoundingMode::SymZero => {
            if acc < 0 {
                half
            } else {
                below_half
            }
        }
        RoundingMode::ConvEven => {
            if odd {
                half
            } else {
                below_half
            }
        }
        RoundingMode::ConvOdd => {
            if odd {
                below_half
            } else {
                half
            }
        }
    };
    (acc + bias) >> shift
}

/// Bring `value` into the signed `bits`-bit range per `mode`
pub fn saturate(value: i128, bits: u32, mode: SaturationMode) -> i128 {
    let max = (1i128 << (bits - 1)) - 1;
    let min = -(1i128 << (bits - 1));
    match mode {
        SaturationMode::None => {
            let unused = 128 - bits;
            (value << unused) >> unused
        }
        SaturationMode::Saturate => value.clamp(min, max),
        SaturationMode::Symmetric => value.clamp(min + 1, max),
    }
}

/// Shift, round and saturate applied to every finished accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputStage {
    pub shift: u32,
    pub rounding: RoundingMode,
    pub saturation: SaturationMode,
}

impl OutputStage {
    pub fn from_spec(spec: &FilterSpec) -> Self {
        Self {
            shift: spec.shift,
            rounding: spec.rounding,
            saturation: spec.saturation,
        }
    }

    /// Finish an integer accumulator component for a `bits`-wide output
    pub fn apply(&self, acc: i128, bits: u32) -> i128 {
        saturate(shift_round(acc, self.shift, self.rounding), bits, self.saturation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Accumulator values are fixed point with one fractional bit: 5 is 2.5.
    fn round_half(value_x2: i128, mode: RoundingMode) -> i128 {
        shift_round(value_x2, 1, mode)
    }

    #[test]
    fn test_half_to_even() {
        assert_eq!(round_half(5, RoundingMode::ConvEven), 2);
        assert_eq!(round_half(7, RoundingMode::ConvEven), 4);
        assert_eq!(round_half(-5, RoundingMode::ConvEven), -2);
        assert_eq!(round_half(-7, RoundingMode::ConvEven), -4);
    }

    #[test]
    fn test_half_to_odd() {
        assert_eq!(round_half(5, RoundingMode::ConvOdd), 3);
        assert_eq!(round_half(7, RoundingMode::ConvOdd), 3);
        assert_eq!(round_half(-5, RoundingMode::ConvOdd), -3);
    }

    #[test]
    fn test_halfway_modes() {
        // 2.5 and -2.5
        let cases = [
            (RoundingMode::Floor, 2, -3),
            (RoundingMode::Ceil, 3, -2),
            (RoundingMode::PosInf, 3, -2),
            (RoundingMode::NegInf, 2, -3),
            (RoundingMode::SymInf, 3, -3),
            (RoundingMode::SymZero, 2, -2),
            (RoundingMode::ConvEven, 2, -2),
            (RoundingMode::ConvOdd, 3, -3),
        ];
        for (mode, pos, neg) in cases {
            assert_eq!(round_half(5, mode), pos, "{:?} of 2.5", mode);
            assert_eq!(round_half(-5, mode), neg, "{:?} of -2.5", mode);
        }
    }

    #[test]
    fn test_non_halfway_values_round_to_nearest() {
        // 2.75 and 2.25 with two fractional bits
        for mode in [
            RoundingMode::PosInf,
            RoundingMode::NegInf,
            RoundingMode::SymInf,
            RoundingMode::SymZero,
            RoundingMode::ConvEven,
            RoundingMode::ConvOdd,
        ] {
            assert_eq!(shift_round(11, 2, mode), 3, "{:?}", mode);
            assert_eq!(shift_round(9, 2, mode), 2, "{:?}", mode);
            assert_eq!(shift_round(-11, 2, mode), -3, "{:?}", mode);
        }
        assert_eq!(shift_round(11, 2, RoundingMode::Floor), 2);
        assert_eq!(shift_round(9, 2, RoundingMode::Ceil), 3);
    }

    #[test]
    fn test_zero_shift_is_identity() {
        assert_eq!(shift_round(-12345, 0, RoundingMode::Ceil), -12345);
    }

    #[test]
    fn test_saturation_bounds() {
        assert_eq!(saturate(40000, 16, SaturationMode::Saturate), 32767);
        assert_eq!(saturate(-40000, 16, SaturationMode::Saturate), -32768);
        assert_eq!(saturate(-40000, 16, SaturationMode::Symmetric), -32767);
        assert_eq!(saturate(32767, 16, SaturationMode::Symmetric), 32767);
        assert_eq!(saturate(-32768, 16, SaturationMode::Saturate), -32768);
    }

    #[test]
    fn test_no_saturation_wraps() {
        assert_eq!(saturate(32768, 16, SaturationMode::None), -32768);
        assert_eq!(saturate(65537, 16, SaturationMode::None), 1);
        assert_eq!(saturate(-32769, 16, SaturationMode::None), 32767);
        assert_eq!(
            saturate(1i128 << 31, 32, SaturationMode::None),
            i32::MIN as i128
        );
    }

    #[test]
    fn test_output_stage() {
        let stage = OutputStage {
            shift: 4,
            rounding: RoundingMode::SymInf,
            saturation: SaturationMode::Saturate,
        };
        assert_eq!(stage.apply(24, 16), 2); // 1.5 away from zero
        assert_eq!(stage.apply(-24, 16), -2);
        assert_eq!(stage.apply(1 << 24, 16), 32767);
    }
}
