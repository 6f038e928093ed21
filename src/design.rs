//! Coefficient design for interpolation filters
//!
//! Parks-McClellan (Remez) equiripple lowpass designs. Frequencies are
//! normalized to the output sample rate, so the image band of an
//! interpolate-by-`I` filter starts at `0.5 / I`.

use pm_remez::{BandSetting, constant, pm_parameters, pm_remez};

use crate::arith::Element;
use crate::constants::{HALF_BAND_FACTOR, HALF_BAND_LEN_MIN, INTERPOLATE_FACTOR_MAX};
use crate::error::{FirError, Result};

pub use crate::fir::half_band_unique;

/// Design the lowpass prototype of an interpolate-by-`factor` filter
///
/// The passband gain is `factor`, so each polyphase branch has unit DC
/// gain. `transition` is the full transition width, centred on the
/// image-band edge `0.5 / factor`.
///
/// # Errors
/// Returns `FirError::FilterDesign` if the bands do not fit or Remez fails
pub fn lowpass_prototype(num_taps: usize, factor: usize, transition: f64) -> Result<Vec<f64>> {
    if factor < 2 || factor > INTERPOLATE_FACTOR_MAX {
        return Err(FirError::FilterDesign(format!(
            "interpolation factor {} outside 2..={}",
            factor, INTERPOLATE_FACTOR_MAX
        )));
    }
    let edge = 0.5 / factor as f64;
    design_lowpass(num_taps, edge, transition, factor as f64)
}

/// Design a half-band interpolation filter of `num_taps` taps
///
/// `num_taps` must be `4n - 1`. Taps at even distance from the centre are
/// forced to exactly zero and the centre tap to the half gain.
pub fn half_band(num_taps: usize, transition: f64) -> Result<Vec<f64>> {
    if num_taps < HALF_BAND_LEN_MIN || (num_taps + 1) % 4 != 0 {
        return Err(FirError::FilterDesign(format!(
            "half-band length {} is not of the form 4n - 1",
            num_taps
        )));
    }
    let gain = HALF_BAND_FACTOR as f64;
    let mut taps = design_lowpass(num_taps, 0.25, transition, gain)?;

    let centre = (num_taps - 1) / 2;
    for (i, tap) in taps.iter_mut().enumerate() {
        let distance = i.abs_diff(centre);
        if distance == 0 {
            *tap = gain / 2.0;
        } else if distance % 2 == 0 {
            *tap = 0.0;
        }
    }
    Ok(taps)
}

fn design_lowpass(num_taps: usize, edge: f64, transition: f64, gain: f64) -> Result<Vec<f64>> {
    let pass_end = edge - transition / 2.0;
    let stop_start = edge + transition / 2.0;
    if transition <= 0.0 || pass_end <= 0.0 || stop_start >= 0.5 {
        return Err(FirError::FilterDesign(format!(
            "transition {} does not fit around band edge {}",
            transition, edge
        )));
    }

    let bands = [
        BandSetting::new(0.0, pass_end, constant(gain))
            .map_err(|e| FirError::FilterDesign(format!("Passband: {:?}", e)))?,
        BandSetting::new(stop_start, 0.5, constant(0.0))
            .map_err(|e| FirError::FilterDesign(format!("Stopband: {:?}", e)))?,
    ];

    let params = pm_parameters(num_taps, &bands)
        .map_err(|e| FirError::FilterDesign(format!("PM parameters: {:?}", e)))?;

    let design =
        pm_remez(&params).map_err(|e| FirError::FilterDesign(format!("PM Remez: {:?}", e)))?;

    Ok(design.impulse_response)
}

/// Scale to `frac_bits` fractional bits and round to integers
pub fn quantize(taps: &[f64], frac_bits: u32) -> Vec<i64> {
    let scale = (1u64 << frac_bits) as f64;
    taps.iter().map(|&t| (t * scale).round() as i64).collect()
}

/// Convert designed taps to coefficient elements, scaled by `2^frac_bits`
///
/// Float coefficient types take `frac_bits = 0`.
pub fn to_coefficients<C: Element>(taps: &[f64], frac_bits: u32) -> Vec<C> {
    let scale = (1u64 << frac_bits) as f64;
    taps.iter().map(|&t| C::from_parts(t * scale, 0.0)).collect()
}
