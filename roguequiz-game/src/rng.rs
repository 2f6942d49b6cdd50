//! Deterministic random streams for a single run.
//!
//! Every draw the engine makes comes from one of the named streams below. The
//! streams are derived from the user seed with HMAC domain separation so that
//! adding draws to one concern never shifts the sequence seen by another.

use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand::rngs::SmallRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Per-concern RNG streams owned by a run.
///
/// Map and question streams use `ChaCha20Rng` so a shared run code rebuilds
/// the same map on every platform; reward and roulette draws use `SmallRng`.
#[derive(Debug, Clone)]
pub struct RngBundle {
    map: CountingRng<ChaCha20Rng>,
    questions: CountingRng<ChaCha20Rng>,
    reward: CountingRng<SmallRng>,
    roulette: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            map: CountingRng::new(ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, b"map"))),
            questions: CountingRng::new(ChaCha20Rng::seed_from_u64(derive_stream_seed(
                seed,
                b"questions",
            ))),
            reward: CountingRng::new(SmallRng::seed_from_u64(derive_stream_seed(seed, b"reward"))),
            roulette: CountingRng::new(SmallRng::seed_from_u64(derive_stream_seed(
                seed,
                b"roulette",
            ))),
        }
    }

    /// Stream used for layout, stage-type shuffles and edge choices.
    pub fn map(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.map
    }

    /// Stream used to assign question indices to stages.
    pub fn questions(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.questions
    }

    /// Stream used for reward-box draws.
    pub fn reward(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.reward
    }

    /// Stream used for roulette offers.
    pub fn roulette(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.roulette
    }

    /// Total draws made across all streams.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.map
            .draws()
            .saturating_add(self.questions.draws())
            .saturating_add(self.reward.draws())
            .saturating_add(self.roulette.draws())
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl<R: RngCore> CountingRng<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
