//! Build-time limits for filter and pipeline configuration
//!
//! Platform-specific register and load widths live in
//! [`PlatformConfig`](crate::config::PlatformConfig); the values here are
//! properties of the filter family itself.

/// Smallest supported interpolation factor.
pub const INTERPOLATE_FACTOR_MIN: usize = 1;

/// Largest supported interpolation factor.
pub const INTERPOLATE_FACTOR_MAX: usize = 16;

/// Largest output shift. The accumulator-to-output stage supports 0..=62.
pub const SHIFT_MAX: u32 = 62;

/// Fixed interpolation factor of the half-band family.
pub const HALF_BAND_FACTOR: usize = 2;

/// Shortest half-band filter (one side tap pair plus the centre tap).
pub const HALF_BAND_LEN_MIN: usize = 3;

/// Width in bytes of one interleave chunk on dual input/output streams.
pub const STREAM_INTERLEAVE_BYTES: usize = 16;

/// Default depth of the bounded channels linking threaded stages.
pub const LINK_DEPTH: usize = 4;
