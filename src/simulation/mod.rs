mod random;

pub use random::{create_rng, random_block, random_elements, random_taps};
