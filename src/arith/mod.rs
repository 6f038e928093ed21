mod element;
mod rounding;

pub use element::{CFloat, CInt16, CInt32, Coefficient, Element, Sample};
pub use rounding::{OutputStage, saturate, shift_round};
