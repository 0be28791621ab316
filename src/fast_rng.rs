// PCG-LCG random source for shower generation
//
// Every stochastic routine in the crate is generic over `rand::Rng`, so any
// generator works; this one is the default the driver builds from a seed.

use rand::{RngCore, SeedableRng};

const PRN_MULT: u64 = 6364136223846793005;
const PRN_ADD: u64 = 1442695040888963407;
/// Stride between the streams handed out by [`ShowerRng::stream`]
const STREAM_STRIDE: u64 = 152917;

/// Small-state PCG generator (LCG core, RXS-M-XS output permutation).
#[derive(Clone, Copy, Debug)]
pub struct ShowerRng {
    state: u64,
}

impl ShowerRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeded generator when a seed is given, otherwise one seeded from the
    /// thread-local entropy source.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::new(s),
            None => Self::new(rand::thread_rng().next_u64()),
        }
    }

    /// Independent-looking generator for the `index`-th shower of a run.
    pub fn stream(seed: u64, index: u64) -> Self {
        let mut rng = Self::new(seed ^ index.wrapping_mul(STREAM_STRIDE));
        // decorrelate neighbouring streams
        rng.next_u64();
        rng
    }

    #[inline(always)]
    fn step(&mut self) -> u64 {
        self.state = PRN_MULT.wrapping_mul(self.state).wrapping_add(PRN_ADD);
        let word = ((self.state >> ((self.state >> 59) + 5)) ^ self.state)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    /// Uniform in [0, 1)
    #[inline(always)]
    pub fn uniform(&mut self) -> f64 {
        (self.step() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

impl SeedableRng for ShowerRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }
}

impl RngCore for ShowerRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
