use serde::Deserialize;

use crate::arith::Element;

/// Period of the ramp stimulus in samples
const RAMP_PERIOD: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Stimulus {
    /// One sample of `amplitude` at the start of the stream, then zeros
    #[default]
    Impulse,
    /// `amplitude` from the start of the stream on
    Step,
    /// Sawtooth from `-amplitude` towards `amplitude`
    Ramp,
}

impl Stimulus {
    pub fn sample(self, n: usize, amplitude: f64) -> f64 {
        match self {
            Self::Impulse => {
                if n == 0 {
                    amplitude
                } else {
                    0.0
                }
            }
            Self::Step => amplitude,
            Self::Ramp => {
                let phase = (n % RAMP_PERIOD) as f64 / RAMP_PERIOD as f64;
                amplitude * (2.0 * phase - 1.0)
            }
        }
    }

    /// Block `index` of `len` samples; complex types get the same value on
    /// both components
    pub fn block<D: Element>(self, index: usize, len: usize, amplitude: f64) -> Vec<D> {
        let start = index * len;
        (start..start + len)
            .map(|n| {
                let v = self.sample(n, amplitude);
                D::from_parts(v, v)
            })
            .collect()
    }
}
