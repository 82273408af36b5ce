//! Seeded, domain-separated random streams for race resolution.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Independent RNG streams, one per kind of draw, so that adding a nitro roll
/// never shifts the jitter sequence and vice versa.
#[derive(Debug, Clone)]
pub struct RngBundle {
    jitter: RefCell<CountingRng<SmallRng>>,
    nitro: RefCell<CountingRng<SmallRng>>,
    skill: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            jitter: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"jitter"))),
            nitro: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"nitro"))),
            skill: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"skill"))),
        }
    }

    /// Race-time jitter stream.
    #[must_use]
    pub fn jitter(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.jitter.borrow_mut()
    }

    /// Nitro activation stream.
    #[must_use]
    pub fn nitro(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.nitro.borrow_mut()
    }

    /// Skill pick and growth stream.
    #[must_use]
    pub fn skill(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.skill.borrow_mut()
    }

    /// Total draws across every stream.
    #[must_use]
    pub fn total_draws(&self) -> u64 {
        self.jitter.borrow().draws() + self.nitro.borrow().draws() + self.skill.borrow().draws()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
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
    // HMAC accepts keys of any length, so the fallbacks below are unreachable.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    digest[..8]
        .try_into()
        .map_or(user_seed, u64::from_le_bytes)
}
