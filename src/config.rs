//! Configuration for tilefir pipelines.
//!
//! A pipeline is described by a [`FilterSpec`] (what the filter computes),
//! [`PipelineOptions`] (how it is spread over stages and wired) and a
//! [`PlatformConfig`] (register and load widths of the target tiles).
//! All three can be built programmatically or loaded together from TOML:
//!
//! ```
//! use tilefir::config::PipelineConfig;
//!
//! let config: PipelineConfig = r#"
//!     [filter]
//!     data_type = "int16"
//!     coeff_type = "int16"
//!     taps = [1, 2, 3, 4, 4, 3, 2, 1]
//!     interpolate_factor = 2
//!     window_size = 16
//!
//!     [pipeline]
//!     stages = 2
//! "#.parse().unwrap();
//! assert_eq!(config.pipeline.stages, 2);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::constants::{
    HALF_BAND_FACTOR, HALF_BAND_LEN_MIN, INTERPOLATE_FACTOR_MAX, INTERPOLATE_FACTOR_MIN,
    LINK_DEPTH, SHIFT_MAX,
};
use crate::error::{FirError, Result};
use crate::fir::BufferArch;

/// Rounding applied when the accumulator is shifted down to the output width
///
/// Codes 0-7 follow the accumulator-shift hardware numbering. The ceiling
/// and floor variants never look at the halfway point; the remaining modes
/// round to nearest and differ only in how they resolve an exact half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(try_from = "u8")]
pub enum RoundingMode {
    /// 0: truncate the discarded bits (towards negative infinity)
    #[default]
    Floor,
    /// 1: always round up (towards positive infinity)
    Ceil,
    /// 2: nearest, halfway towards positive infinity
    PosInf,
    /// 3: nearest, halfway towards negative infinity
    NegInf,
    /// 4: nearest, halfway away from zero
    SymInf,
    /// 5: nearest, halfway towards zero
    SymZero,
    /// 6: nearest, halfway to even
    ConvEven,
    /// 7: nearest, halfway to odd
    ConvOdd,
}

impl RoundingMode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RoundingMode {
    type Error = FirError;

    fn try_from(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Self::Floor,
            1 => Self::Ceil,
            2 => Self::PosInf,
            3 => Self::NegInf,
            4 => Self::SymInf,
            5 => Self::SymZero,
            6 => Self::ConvEven,
            7 => Self::ConvOdd,
            _ => return Err(FirError::RoundingMode(code)),
        })
    }
}

/// Saturation applied after rounding
///
/// Code 2 is reserved by the hardware and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(try_from = "u8")]
pub enum SaturationMode {
    /// 0: no saturation, the value wraps (MSBs are dropped)
    None,
    /// 1: clamp to `[-2^(n-1), 2^(n-1) - 1]`
    #[default]
    Saturate,
    /// 3: clamp to `[-(2^(n-1) - 1), 2^(n-1) - 1]`
    Symmetric,
}

impl SaturationMode {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Saturate => 1,
            Self::Symmetric => 3,
        }
    }
}

impl TryFrom<u8> for SaturationMode {
    type Error = FirError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Saturate),
            3 => Ok(Self::Symmetric),
            _ => Err(FirError::SaturationMode(code)),
        }
    }
}

/// Element type of data samples or coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Int16,
    Int32,
    Cint16,
    Cint32,
    Float,
    Cfloat,
}

impl ElementType {
    /// Size of one element in bytes
    pub fn bytes(self) -> usize {
        match self {
            Self::Int16 => 2,
            Self::Int32 | Self::Cint16 | Self::Float => 4,
            Self::Cint32 | Self::Cfloat => 8,
        }
    }

    pub fn is_complex(self) -> bool {
        matches!(self, Self::Cint16 | Self::Cint32 | Self::Cfloat)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Cfloat)
    }

    /// Bits per real component
    pub fn component_bits(self) -> u32 {
        match self {
            Self::Int16 | Self::Cint16 => 16,
            Self::Int32 | Self::Cint32 | Self::Float | Self::Cfloat => 32,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Cint16 => "cint16",
            Self::Cint32 => "cint32",
            Self::Float => "float",
            Self::Cfloat => "cfloat",
        };
        f.write_str(name)
    }
}

/// Reject data/coefficient pairs the MAC datapath cannot express
pub fn check_type_combination(data: ElementType, coeff: ElementType) -> Result<()> {
    let reject = |reason| Err(FirError::TypeCombination { data, coeff, reason });
    if data.is_float() != coeff.is_float() {
        return reject("a mix of float and integer types is not supported");
    }
    if !data.is_complex() && coeff.is_complex() {
        return reject("real data with complex coefficients is not supported");
    }
    if coeff.component_bits() > data.component_bits() {
        return reject("coefficient precision exceeds data precision");
    }
    Ok(())
}

/// Filter family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FilterFamily {
    /// General interpolator, arbitrary (asymmetric) taps
    #[default]
    Asymmetric,
    /// Factor-2 half-band interpolator with symmetric taps and a centre tap
    HalfBand,
}

/// How samples arrive at the first stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IoMode {
    /// Addressable window per call, with margin supplied by the source
    #[default]
    Window,
    /// Sequential stream, history kept in a per-stage delay line
    Stream,
}

/// Register and load geometry of the target processing tiles
///
/// Defaults describe a tile with 256-bit loads into a 1024-bit data
/// register and 32-byte buffer alignment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Bytes moved by one load into a data register
    pub load_bytes: usize,
    /// Load slots in one data register
    pub register_loads: usize,
    /// Bytes produced per vector MAC lane group
    pub lane_bytes: usize,
    /// Alignment of window margins in bytes
    pub align_bytes: usize,
    /// Largest supported stage count
    pub max_stages: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            load_bytes: 32,
            register_loads: 4,
            lane_bytes: 16,
            align_bytes: 32,
            max_stages: 9,
        }
    }
}

/// Vector geometry for one data/coefficient type pair on a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorShape {
    /// Outputs computed per vector op
    pub lanes: usize,
    /// Taps consumed per vector op
    pub columns: usize,
    /// Samples per load
    pub load_vsize: usize,
    /// Load slots per data register
    pub register_loads: usize,
    /// Margin alignment in samples
    pub align_samples: usize,
}

impl VectorShape {
    /// Samples held by one data register
    pub fn register_capacity(&self) -> usize {
        self.load_vsize * self.register_loads
    }
}

impl PlatformConfig {
    pub fn vector_shape(&self, data: ElementType, coeff: ElementType) -> Result<VectorShape> {
        let db = data.bytes();
        if self.load_bytes == 0 || self.lane_bytes == 0 || self.align_bytes == 0 {
            return Err(FirError::Config(format!(
                "platform widths (load {}B, lane {}B, align {}B) must be non-zero",
                self.load_bytes, self.lane_bytes, self.align_bytes
            )));
        }
        if self.load_bytes % db != 0 || self.lane_bytes % db != 0 || self.align_bytes % db != 0 {
            return Err(FirError::Config(format!(
                "platform widths (load {}B, lane {}B, align {}B) must be multiples of the {}-byte {} element",
                self.load_bytes, self.lane_bytes, self.align_bytes, db, data
            )));
        }
        let lanes = self.lane_bytes / db;
        let load_vsize = self.load_bytes / db;
        let columns = if coeff.bytes() == 2 { 2 } else { 1 };
        if lanes == 0 || load_vsize % lanes != 0 {
            return Err(FirError::Config(format!(
                "load of {} samples is not a whole number of {}-lane vectors",
                load_vsize, lanes
            )));
        }
        if self.register_loads < 2
            || lanes + columns + load_vsize - 2 > (self.register_loads - 1) * load_vsize
        {
            return Err(FirError::Config(format!(
                "data register of {} loads cannot hold one {}x{} vector operation",
                self.register_loads, lanes, columns
            )));
        }
        if self.max_stages == 0 {
            return Err(FirError::Config("max_stages must be at least 1".into()));
        }
        Ok(VectorShape {
            lanes,
            columns,
            load_vsize,
            register_loads: self.register_loads,
            align_samples: self.align_bytes / db,
        })
    }
}

/// Immutable description of the logical filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub family: FilterFamily,
    pub data_type: ElementType,
    pub coeff_type: ElementType,
    /// Total number of taps of the (expanded) filter
    pub fir_len: usize,
    pub interpolate_factor: usize,
    /// Power-of-two downshift applied to the accumulator
    pub shift: u32,
    pub rounding: RoundingMode,
    pub saturation: SaturationMode,
    /// Input samples per processing call
    pub window_size: usize,
}

impl FilterSpec {
    /// Asymmetric interpolator with floor rounding, saturation and no shift
    pub fn asymmetric(
        data_type: ElementType,
        coeff_type: ElementType,
        fir_len: usize,
        interpolate_factor: usize,
        window_size: usize,
    ) -> Self {
        Self {
            family: FilterFamily::Asymmetric,
            data_type,
            coeff_type,
            fir_len,
            interpolate_factor,
            shift: 0,
            rounding: RoundingMode::default(),
            saturation: SaturationMode::default(),
            window_size,
        }
    }

    /// Half-band interpolator of `fir_len` taps (`fir_len + 1` divisible by 4)
    pub fn half_band(
        data_type: ElementType,
        coeff_type: ElementType,
        fir_len: usize,
        window_size: usize,
    ) -> Self {
        Self {
            family: FilterFamily::HalfBand,
            interpolate_factor: HALF_BAND_FACTOR,
            ..Self::asymmetric(data_type, coeff_type, fir_len, HALF_BAND_FACTOR, window_size)
        }
    }

    pub fn with_shift(mut self, shift: u32) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_saturation(mut self, saturation: SaturationMode) -> Self {
        self.saturation = saturation;
        self
    }

    pub fn is_symmetric(&self) -> bool {
        self.family == FilterFamily::HalfBand
    }

    /// Taps per polyphase branch that the MAC sweep walks over
    ///
    /// For the half-band family this is the even branch; the odd branch
    /// only carries the centre tap.
    pub fn phase_taps(&self) -> usize {
        match self.family {
            FilterFamily::Asymmetric => self.fir_len / self.interpolate_factor,
            FilterFamily::HalfBand => (self.fir_len + 1) / 2,
        }
    }

    /// Length of the coefficient vector supplied by the user
    pub fn coefficient_count(&self) -> usize {
        match self.family {
            FilterFamily::Asymmetric => self.fir_len,
            FilterFamily::HalfBand => (self.fir_len + 1) / 4 + 1,
        }
    }

    /// Items divided between stages and the granularity of the split
    ///
    /// Asymmetric filters split the full tap vector in whole polyphase
    /// columns; half-band filters split the symmetric tap pairs.
    pub fn partition_units(&self) -> (usize, usize) {
        match self.family {
            FilterFamily::Asymmetric => (self.fir_len, self.interpolate_factor),
            FilterFamily::HalfBand => ((self.fir_len + 1) / 4, 1),
        }
    }

    /// Output samples per call
    pub fn output_len(&self) -> usize {
        self.window_size * self.interpolate_factor
    }

    /// Check every build-time invariant and return the vector geometry
    pub fn validate(&self, platform: &PlatformConfig) -> Result<VectorShape> {
        check_type_combination(self.data_type, self.coeff_type)?;

        match self.family {
            FilterFamily::Asymmetric => {
                if !(INTERPOLATE_FACTOR_MIN..=INTERPOLATE_FACTOR_MAX)
                    .contains(&self.interpolate_factor)
                {
                    return Err(FirError::Config(format!(
                        "interpolate factor {} outside {}..={}",
                        self.interpolate_factor, INTERPOLATE_FACTOR_MIN, INTERPOLATE_FACTOR_MAX
                    )));
                }
                if self.fir_len == 0 || self.fir_len % self.interpolate_factor != 0 {
                    return Err(FirError::TapLength {
                        taps: self.fir_len,
                        reason: format!(
                            "must be a non-zero multiple of the interpolate factor {}",
                            self.interpolate_factor
                        ),
                    });
                }
            }
            FilterFamily::HalfBand => {
                if self.interpolate_factor != HALF_BAND_FACTOR {
                    return Err(FirError::Config(format!(
                        "half-band filters interpolate by {}, not {}",
                        HALF_BAND_FACTOR, self.interpolate_factor
                    )));
                }
                if self.fir_len < HALF_BAND_LEN_MIN || (self.fir_len + 1) % 4 != 0 {
                    return Err(FirError::TapLength {
                        taps: self.fir_len,
                        reason: "half-band length must be 4n-1 with n >= 1".into(),
                    });
                }
            }
        }

        if self.shift > SHIFT_MAX {
            return Err(FirError::Config(format!(
                "shift {} exceeds maximum {}",
                self.shift, SHIFT_MAX
            )));
        }
        if self.data_type.is_float() && self.shift != 0 {
            return Err(FirError::Config(format!(
                "shift must be 0 for {} data",
                self.data_type
            )));
        }

        let shape = platform.vector_shape(self.data_type, self.coeff_type)?;
        if self.window_size == 0 || self.window_size % shape.lanes != 0 {
            return Err(FirError::Config(format!(
                "window size {} must be a non-zero multiple of {} lanes",
                self.window_size, shape.lanes
            )));
        }
        Ok(shape)
    }
}

/// How the filter is spread over stages and connected
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Number of cascaded stages
    pub stages: usize,
    /// Coefficients supplied at run time alongside each block
    pub reload: bool,
    /// Stream input split over two interleaved streams
    pub dual_input: bool,
    /// Number of output ports (1 or 2)
    pub outputs: usize,
    pub io_mode: IoMode,
    /// Force every stage to this architecture instead of selecting one
    pub architecture: Option<BufferArch>,
    /// Depth of the bounded links in the threaded runner
    pub link_depth: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            stages: 1,
            reload: false,
            dual_input: false,
            outputs: 1,
            io_mode: IoMode::Window,
            architecture: None,
            link_depth: LINK_DEPTH,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self, platform: &PlatformConfig) -> Result<()> {
        if self.stages == 0 || self.stages > platform.max_stages {
            return Err(FirError::StageCount {
                stages: self.stages,
                reason: format!("must be in 1..={}", platform.max_stages),
            });
        }
        if !(1..=2).contains(&self.outputs) {
            return Err(FirError::Config(format!(
                "output count {} must be 1 or 2",
                self.outputs
            )));
        }
        if self.dual_input && self.io_mode != IoMode::Stream {
            return Err(FirError::Config(
                "dual input requires stream I/O".into(),
            ));
        }
        if self.link_depth == 0 {
            return Err(FirError::Config("link depth must be at least 1".into()));
        }
        Ok(())
    }
}

/// One coefficient as written in a config file: a real number or `[re, im]`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CoeffValue {
    Real(f64),
    Complex([f64; 2]),
}

impl CoeffValue {
    pub fn parts(self) -> (f64, f64) {
        match self {
            Self::Real(re) => (re, 0.0),
            Self::Complex([re, im]) => (re, im),
        }
    }
}

/// `[filter]` table of a pipeline config file
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSection {
    #[serde(default)]
    pub family: FilterFamily,
    pub data_type: ElementType,
    pub coeff_type: ElementType,
    /// Coefficients: the full tap vector, or the unique half-band form
    pub taps: Vec<CoeffValue>,
    /// Total filter length; derived from `taps` when omitted
    pub fir_len: Option<usize>,
    #[serde(default = "default_factor")]
    pub interpolate_factor: usize,
    #[serde(default)]
    pub shift: u32,
    #[serde(default)]
    pub rounding: RoundingMode,
    #[serde(default)]
    pub saturation: SaturationMode,
    pub window_size: usize,
}

fn default_factor() -> usize {
    HALF_BAND_FACTOR
}

/// Complete pipeline description loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub filter: FilterSection,
    #[serde(default)]
    pub pipeline: PipelineOptions,
    #[serde(default)]
    pub platform: PlatformConfig,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| FirError::Config(format!("{}: {}", path.display(), e)))?;
        text.parse()
    }

    pub fn filter_spec(&self) -> FilterSpec {
        let f = &self.filter;
        let fir_len = f.fir_len.unwrap_or(match f.family {
            FilterFamily::Asymmetric => f.taps.len(),
            // unique form holds (len + 1) / 4 side taps plus the centre tap
            // fewer than two unique taps yields 0, which validation rejects
            FilterFamily::HalfBand => (f.taps.len().saturating_sub(1) * 4).saturating_sub(1),
        });
        let base = match f.family {
            FilterFamily::Asymmetric => FilterSpec::asymmetric(
                f.data_type,
                f.coeff_type,
                fir_len,
                f.interpolate_factor,
                f.window_size,
            ),
            FilterFamily::HalfBand => {
                let mut spec =
                    FilterSpec::half_band(f.data_type, f.coeff_type, fir_len, f.window_size);
                spec.interpolate_factor = f.interpolate_factor;
                spec
            }
        };
        base.with_shift(f.shift)
            .with_rounding(f.rounding)
            .with_saturation(f.saturation)
    }
}

impl FromStr for PipelineConfig {
    type Err = FirError;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FirError::Config(e.to_string()))
    }
}
