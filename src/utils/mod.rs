pub mod rng;
pub mod test_utils;
