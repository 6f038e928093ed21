use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::arith::Element;

/// Seeded generator, or one seeded from the OS when `seed` is `None`
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// `len` elements with every component uniform in `[-amplitude, amplitude]`
///
/// Integer types receive rounded values.
pub fn random_elements<T: Element>(rng: &mut ChaCha8Rng, len: usize, amplitude: f64) -> Vec<T> {
    (0..len)
        .map(|_| {
            let re = (rng.random::<f64>() * 2.0 - 1.0) * amplitude;
            let im = (rng.random::<f64>() * 2.0 - 1.0) * amplitude;
            T::from_parts(re, im)
        })
        .collect()
}

/// One block of random input samples
pub fn random_block<D: Element>(rng: &mut ChaCha8Rng, len: usize, amplitude: f64) -> Vec<D> {
    random_elements(rng, len, amplitude)
}

/// A random coefficient set of `count` values
pub fn random_taps<C: Element>(rng: &mut ChaCha8Rng, count: usize, amplitude: f64) -> Vec<C> {
    random_elements(rng, count, amplitude)
}
