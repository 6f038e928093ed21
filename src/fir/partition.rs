use crate::error::{FirError, Result};

/// Contiguous slice of the reversed tap vector owned by one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapRange {
    pub offset: usize,
    pub len: usize,
}

impl TapRange {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

fn trunc(value: usize, unit: usize) -> usize {
    (value / unit) * unit
}

/// Round `value` up to a multiple of `align`
pub fn ceil_to(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// Length owned by a stage that is not the last
pub fn fir_range(total: usize, stages: usize, position: usize, unit: usize) -> usize {
    let whole = trunc(total, unit * stages);
    let base = whole / stages;
    let rem = total - whole;
    if rem >= unit * (position + 1) {
        base + unit
    } else {
        base
    }
}

/// Length owned by the last stage
pub fn fir_range_rem(total: usize, stages: usize, _position: usize, unit: usize) -> usize {
    let whole = trunc(total, unit * stages);
    whole / stages + (total - whole) % unit
}

/// Offset of a stage's range within the reversed tap vector
pub fn fir_range_offset(total: usize, stages: usize, position: usize, unit: usize) -> usize {
    let whole = trunc(total, unit * stages);
    let base = whole / stages;
    let rem = total - whole;
    let extra = if rem >= unit * position {
        unit * position
    } else {
        trunc(total, unit) - whole
    };
    position * base + extra
}

/// Samples of history a window must carry ahead of the new block
pub fn fir_margin(phase_taps: usize, align_samples: usize) -> usize {
    ceil_to(phase_taps, align_samples)
}

/// Range owned by `position`, using the remainder rule for the last stage
pub fn stage_range(total: usize, stages: usize, position: usize, unit: usize) -> TapRange {
    let len = if position + 1 == stages {
        fir_range_rem(total, stages, position, unit)
    } else {
        fir_range(total, stages, position, unit)
    };
    TapRange {
        offset: fir_range_offset(total, stages, position, unit),
        len,
    }
}

/// Split `total` taps over `stages`, rejecting splits that leave a stage empty
///
/// Ranges index the reversed tap vector, so stage 0 owns the taps applied
/// to the oldest samples. Earlier stages absorb the remainder units first.
pub fn partition(total: usize, stages: usize, unit: usize) -> Result<Vec<TapRange>> {
    if stages == 0 || unit == 0 {
        return Err(FirError::StageCount {
            stages,
            reason: "stage count and partition unit must be non-zero".into(),
        });
    }
    let ranges: Vec<TapRange> = (0..stages)
        .map(|position| stage_range(total, stages, position, unit))
        .collect();

    if let Some(empty) = ranges.iter().position(|r| r.len == 0) {
        return Err(FirError::StageCount {
            stages,
            reason: format!(
                "stage {} would own no taps ({} taps in units of {})",
                empty, total, unit
            ),
        });
    }
    Ok(ranges)
}
