use thiserror::Error;

use crate::config::ElementType;

#[derive(Error, Debug)]
pub enum FirError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid rounding mode code {0} (valid codes are 0-7)")]
    RoundingMode(u8),

    #[error("Invalid saturation mode code {0} (valid codes are 0, 1 and 3)")]
    SaturationMode(u8),

    #[error("Unsupported data/coefficient combination {data}/{coeff}: {reason}")]
    TypeCombination {
        data: ElementType,
        coeff: ElementType,
        reason: &'static str,
    },

    #[error("Invalid tap length {taps}: {reason}")]
    TapLength { taps: usize, reason: String },

    #[error("Invalid stage count {stages}: {reason}")]
    StageCount { stages: usize, reason: String },

    #[error("FIR length too large for {stages} stage(s): stage {stage} needs {needed} samples, register holds {available}")]
    StageTooLong {
        stages: usize,
        stage: usize,
        needed: usize,
        available: usize,
    },

    #[error("Architecture {arch} not available for stage {stage}: {reason}")]
    Architecture {
        arch: &'static str,
        stage: usize,
        reason: String,
    },

    #[error("Expected {expected} coefficients, got {actual}")]
    CoefficientCount { expected: usize, actual: usize },

    #[error("Expected a block of {expected} samples, got {actual}")]
    BlockSize { expected: usize, actual: usize },

    #[error("Pipeline link disconnected: {0}")]
    Disconnected(&'static str),

    #[error("Filter design failed: {0}")]
    FilterDesign(String),
}

pub type Result<T> = std::result::Result<T, FirError>;
