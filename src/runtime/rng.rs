//! Seeded randomness shared by every context of a run.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore as _, SeedableRng as _};

pub fn gen_seed() -> u64 {
    let mut seed = [0u8; 8];
    rand_core::OsRng.fill_bytes(&mut seed);
    u64::from_le_bytes(seed)
}

pub fn rng_from_seed(seed: u64) -> ChaCha20Rng {
    let seed_bytes = blake3::hash(&seed.to_le_bytes()).as_bytes().to_owned();
    let mut seed32 = [0u8; 32];
    seed32.copy_from_slice(&seed_bytes[..32]);
    ChaCha20Rng::from_seed(seed32)
}

/// Uniform draw from `lo..=hi`. Panics when `lo > hi`.
pub fn rand_range(rng: &mut ChaCha20Rng, lo: i64, hi: i64) -> i64 {
    assert!(lo <= hi, "rand_range: empty range {lo}..={hi}");
    let span = (hi as i128 - lo as i128 + 1) as u128;
    let draw = u128::from(rng.next_u64()) % span;
    (lo as i128 + draw as i128) as i64
}
