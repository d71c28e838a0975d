use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Randomness source threaded through trait sampling, brain wiring and food spawning.
pub type SimRng = ChaCha12Rng;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> SimRng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Create an RNG from `seed`, or from the OS entropy source when no seed is given.
pub fn rng_from_seed(seed: Option<u64>) -> SimRng {
    match seed {
        Some(seed) => create_rng(seed),
        None => ChaCha12Rng::from_os_rng(),
    }
}
