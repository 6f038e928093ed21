use std::fmt::Debug;
use std::ops::{Add, AddAssign};

use num_complex::Complex;

use super::OutputStage;
use crate::config::ElementType;

pub type CInt16 = Complex<i16>;
pub type CInt32 = Complex<i32>;
pub type CFloat = Complex<f32>;

/// A value that can sit in a sample window or a tap table
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const ELEMENT: ElementType;

    /// Build from real and imaginary parts, rounding and saturating integers.
    /// Real types ignore `im`.
    fn from_parts(re: f64, im: f64) -> Self;

    fn to_parts(self) -> (f64, f64);
}

/// A data element type with its accumulator
pub trait Sample: Element {
    type Acc: Copy
        + Default
        + PartialEq
        + Debug
        + Add<Output = Self::Acc>
        + AddAssign
        + Send
        + Sync
        + 'static;

    fn widen(self) -> Self::Acc;

    /// Shift, round and saturate a finished accumulator to the data width
    fn finalize(acc: Self::Acc, stage: &OutputStage) -> Self;
}

/// A coefficient type that can multiply data of type `D`
pub trait Coefficient<D: Sample>: Element {
    fn product(data: D::Acc, coeff: Self) -> D::Acc;
}

impl Element for i16 {
    const ELEMENT: ElementType = ElementType::Int16;

    fn from_parts(re: f64, _im: f64) -> Self {
        re.round() as i16
    }

    fn to_parts(self) -> (f64, f64) {
        (self as f64, 0.0)
    }
}

impl Element for i32 {
    const ELEMENT: ElementType = ElementType::Int32;

    fn from_parts(re: f64, _im: f64) -> Self {
        re.round() as i32
    }

    fn to_parts(self) -> (f64, f64) {
        (self as f64, 0.0)
    }
}

impl Element for f32 {
    const ELEMENT: ElementType = ElementType::Float;

    fn from_parts(re: f64, _im: f64) -> Self {
        re as f32
    }

    fn to_parts(self) -> (f64, f64) {
        (self as f64, 0.0)
    }
}

impl Element for CInt16 {
    const ELEMENT: ElementType = ElementType::Cint16;

    fn from_parts(re: f64, im: f64) -> Self {
        Complex::new(re.round() as i16, im.round() as i16)
    }

    fn to_parts(self) -> (f64, f64) {
        (self.re as f64, self.im as f64)
    }
}

impl Element for CInt32 {
    const ELEMENT: ElementType = ElementType::Cint32;

    fn from_parts(re: f64, im: f64) -> Self {
        Complex::new(re.round() as i32, im.round() as i32)
    }

    fn to_parts(self) -> (f64, f64) {
        (self.re as f64, self.im as f64)
    }
}

impl Element for CFloat {
    const ELEMENT: ElementType = ElementType::Cfloat;

    fn from_parts(re: f64, im: f64) -> Self {
        Complex::new(re as f32, im as f32)
    }

    fn to_parts(self) -> (f64, f64) {
        (self.re as f64, self.im as f64)
    }
}

impl Sample for i16 {
    type Acc = i64;

    fn widen(self) -> i64 {
        self as i64
    }

    fn finalize(acc: i64, stage: &OutputStage) -> Self {
        stage.apply(acc as i128, 16) as i16
    }
}

impl Sample for i32 {
    type Acc = i128;

    fn widen(self) -> i128 {
        self as i128
    }

    fn finalize(acc: i128, stage: &OutputStage) -> Self {
        stage.apply(acc, 32) as i32
    }
}

impl Sample for f32 {
    type Acc = f64;

    fn widen(self) -> f64 {
        self as f64
    }

    fn finalize(acc: f64, _stage: &OutputStage) -> Self {
        acc as f32
    }
}

impl Sample for CInt16 {
    type Acc = Complex<i64>;

    fn widen(self) -> Complex<i64> {
        Complex::new(self.re as i64, self.im as i64)
    }

    fn finalize(acc: Complex<i64>, stage: &OutputStage) -> Self {
        Complex::new(
            stage.apply(acc.re as i128, 16) as i16,
            stage.apply(acc.im as i128, 16) as i16,
        )
    }
}

impl Sample for CInt32 {
    type Acc = Complex<i128>;

    fn widen(self) -> Complex<i128> {
        Complex::new(self.re as i128, self.im as i128)
    }

    fn finalize(acc: Complex<i128>, stage: &OutputStage) -> Self {
        Complex::new(
            stage.apply(acc.re, 32) as i32,
            stage.apply(acc.im, 32) as i32,
        )
    }
}

impl Sample for CFloat {
    type Acc = Complex<f64>;

    fn widen(self) -> Complex<f64> {
        Complex::new(self.re as f64, self.im as f64)
    }

    fn finalize(acc: Complex<f64>, _stage: &OutputStage) -> Self {
        Complex::new(acc.re as f32, acc.im as f32)
    }
}

/// Implement `Coefficient<$data>` for `$coeff`, widening the coefficient
/// with `$widen` before the multiply
macro_rules! coefficient {
    ($data:ty, $coeff:ty, |$c:ident| $widen:expr) => {
        impl Coefficient<$data> for $coeff {
            fn product(data: <$data as Sample>::Acc, $c: Self) -> <$data as Sample>::Acc {
                data * $widen
            }
        }
    };
}

coefficient!(i16, i16, |c| c as i64);
coefficient!(i32, i16, |c| c as i128);
coefficient!(i32, i32, |c| c as i128);
coefficient!(CInt16, i16, |c| c as i64);
coefficient!(CInt16, CInt16, |c| Complex::new(c.re as i64, c.im as i64));
coefficient!(CInt32, i16, |c| c as i128);
coefficient!(CInt32, i32, |c| c as i128);
coefficient!(CInt32, CInt16, |c| Complex::new(c.re as i128, c.im as i128));
coefficient!(CInt32, CInt32, |c| Complex::new(c.re as i128, c.im as i128));
coefficient!(f32, f32, |c| c as f64);
coefficient!(CFloat, f32, |c| c as f64);
coefficient!(CFloat, CFloat, |c| Complex::new(c.re as f64, c.im as f64));
