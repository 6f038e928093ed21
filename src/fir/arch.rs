use std::fmt;

use serde::Deserialize;

use crate::config::IoMode;
use crate::error::{FirError, Result};

/// Register discipline a stage reads its samples through, fixed at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BufferArch {
    /// One register rolling forward over the whole block; loads are shared
    /// between consecutive output vectors
    SingleIncremental,
    /// Separate forward and reverse registers, both reloaded for every
    /// output vector
    DualBuffer,
    /// Forward and reverse registers whose sweep direction alternates
    /// between vectors so each sweep starts on data the last one loaded
    ZigZag,
    /// Persistent delay line carried across calls for stream input
    StreamIncremental,
}

impl BufferArch {
    pub const ALL: [BufferArch; 4] = [
        BufferArch::SingleIncremental,
        BufferArch::DualBuffer,
        BufferArch::ZigZag,
        BufferArch::StreamIncremental,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SingleIncremental => "single_incremental",
            Self::DualBuffer => "dual_buffer",
            Self::ZigZag => "zig_zag",
            Self::StreamIncremental => "stream_incremental",
        }
    }

    /// Data registers the architecture occupies
    pub fn registers(self) -> usize {
        match self {
            Self::SingleIncremental | Self::StreamIncremental => 1,
            Self::DualBuffer | Self::ZigZag => 2,
        }
    }

    /// Relative load traffic, used to break storage ties
    fn load_rank(self) -> usize {
        match self {
            Self::SingleIncremental | Self::StreamIncremental => 0,
            Self::ZigZag => 1,
            Self::DualBuffer => 2,
        }
    }
}

impl fmt::Display for BufferArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geometry of one stage as seen by the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorInputs {
    /// Outputs per vector op
    pub lanes: usize,
    /// Taps per vector op
    pub columns: usize,
    /// Samples per load
    pub load_vsize: usize,
    /// Load slots per register
    pub register_loads: usize,
    /// Input samples per call
    pub window_size: usize,
    /// Data samples the stage's taps reach across
    pub span: usize,
    /// Misalignment of the stage's first sample within a load
    pub x_offset: usize,
    pub symmetric: bool,
    pub io_mode: IoMode,
    pub dual_input: bool,
}

impl SelectorInputs {
    fn capacity(&self) -> usize {
        self.load_vsize * self.register_loads
    }
}

/// Check whether `arch` can serve a stage; `Err` carries the reason
pub fn qualifies(arch: BufferArch, inputs: &SelectorInputs) -> std::result::Result<(), String> {
    let window = inputs.io_mode == IoMode::Window;
    match arch {
        BufferArch::SingleIncremental => {
            if !window {
                return Err("requires window I/O".into());
            }
            let needed = inputs.x_offset + inputs.span + inputs.load_vsize;
            if needed > inputs.capacity() {
                return Err(format!(
                    "{} samples per vector exceed the {}-sample register",
                    needed,
                    inputs.capacity()
                ));
            }
            let stride = inputs.lanes * inputs.register_loads;
            if inputs.window_size % stride != 0 {
                return Err(format!(
                    "window size {} is not a multiple of {}",
                    inputs.window_size, stride
                ));
            }
            Ok(())
        }
        BufferArch::DualBuffer => {
            if window {
                Ok(())
            } else {
                Err("requires window I/O".into())
            }
        }
        BufferArch::ZigZag => {
            if !window {
                Err("requires window I/O".into())
            } else if !inputs.symmetric {
                Err("requires a symmetric filter".into())
            } else {
                Ok(())
            }
        }
        BufferArch::StreamIncremental => {
            if window {
                Err("requires stream I/O".into())
            } else {
                Ok(())
            }
        }
    }
}

/// Pick the qualifying architecture with the least storage, then the
/// fewest loads
pub fn select(inputs: &SelectorInputs) -> BufferArch {
    BufferArch::ALL
        .into_iter()
        .filter(|arch| qualifies(*arch, inputs).is_ok())
        .min_by_key(|arch| (arch.registers(), arch.load_rank()))
        .unwrap_or(BufferArch::DualBuffer)
}

/// Samples one stream read delivers into the register
pub fn stream_read_size(inputs: &SelectorInputs) -> usize {
    if inputs.dual_input {
        inputs.load_vsize
    } else {
        inputs.load_vsize / 2
    }
}

/// Reject stream stages whose taps cannot fit the register beside one read
pub fn check_stream_fit(inputs: &SelectorInputs, stages: usize, stage: usize) -> Result<()> {
    let needed = inputs.span.div_ceil(inputs.columns) * inputs.columns;
    let available = inputs.capacity().saturating_sub(stream_read_size(inputs));
    if needed > available {
        return Err(FirError::StageTooLong {
            stages,
            stage,
            needed,
            available,
        });
    }
    Ok(())
}

/// Choose the architecture for `stage`, honouring a forced choice
pub fn resolve(
    inputs: &SelectorInputs,
    forced: Option<BufferArch>,
    stages: usize,
    stage: usize,
) -> Result<BufferArch> {
    let arch = match forced {
        Some(arch) => {
            qualifies(arch, inputs).map_err(|reason| FirError::Architecture {
                arch: arch.name(),
                stage,
                reason,
            })?;
            arch
        }
        None => select(inputs),
    };
    if arch == BufferArch::StreamIncremental {
        check_stream_fit(inputs, stages, stage)?;
    }
    Ok(arch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> SelectorInputs {
        SelectorInputs {
            lanes: 8,
            columns: 2,
            load_vsize: 16,
            register_loads: 4,
            window_size: 64,
            span: 16,
            x_offset: 0,
            symmetric: false,
            io_mode: IoMode::Window,
            dual_input: false,
        }
    }

    #[test]
    fn test_small_filter_selects_single_buffer() {
        assert_eq!(select(&inputs()), BufferArch::SingleIncremental);
    }

    #[test]
    fn test_single_buffer_capacity_boundary() {
        let mut i = inputs();
        // 8 + 40 + 16 == 64
        i.x_offset = 8;
        i.span = 40;
        assert_eq!(select(&i), BufferArch::SingleIncremental);
        i.span = 41;
        assert_eq!(select(&i), BufferArch::DualBuffer);
    }

    #[test]
    fn test_single_buffer_window_multiple() {
        let mut i = inputs();
        i.window_size = 48;
        assert_eq!(select(&i), BufferArch::DualBuffer);
    }

    #[test]
    fn test_symmetric_large_filter_selects_zig_zag() {
        let mut i = inputs();
        i.symmetric = true;
        i.span = 100;
        assert_eq!(select(&i), BufferArch::ZigZag);
        i.span = 8;
        assert_eq!(select(&i), BufferArch::SingleIncremental);
    }

    #[test]
    fn test_stream_io_selects_stream() {
        let mut i = inputs();
        i.io_mode = IoMode::Stream;
        i.symmetric = true;
        assert_eq!(select(&i), BufferArch::StreamIncremental);
    }

    #[test]
    fn test_forced_architecture_is_checked() {
        let mut i = inputs();
        i.span = 100;
        let err = resolve(&i, Some(BufferArch::SingleIncremental), 1, 0);
        assert!(matches!(err, Err(FirError::Architecture { stage: 0, .. })));
        assert_eq!(
            resolve(&i, Some(BufferArch::DualBuffer), 1, 0).unwrap(),
            BufferArch::DualBuffer
        );
        assert!(resolve(&i, Some(BufferArch::ZigZag), 1, 0).is_err());
    }

    #[test]
    fn test_stream_fit() {
        let mut i = inputs();
        i.io_mode = IoMode::Stream;
        // capacity 64, single-input read 8
        i.span = 56;
        assert!(resolve(&i, None, 2, 1).is_ok());
        i.span = 57;
        assert!(matches!(
            resolve(&i, None, 2, 1),
            Err(FirError::StageTooLong {
                stage: 1,
                needed: 58,
                available: 56,
                ..
            })
        ));
        // dual-input reads a full load
        i.span = 56;
        i.dual_input = true;
        assert!(resolve(&i, None, 2, 1).is_err());
    }
}
