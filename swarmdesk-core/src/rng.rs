//! Randomness, split in two.
//!
//! `RngHierarchy` drives every choice that affects trading: whether an agent
//! scans this tick and in which order it visits candidates. A master seed is
//! expanded into per-(agent, purpose, tick) sub-seeds via BLAKE3, so the
//! result is identical regardless of how rayon schedules agents.
//!
//! `FlavorRng` is unseeded and only picks things that never touch balances:
//! which headline is active and how log lines are phrased.

use crate::domain::AgentId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What a derived stream is used for. Separate purposes never share a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    ScanGate,
    CandidateOrder,
    Synthetic,
}

impl Purpose {
    fn tag(&self) -> &'static [u8] {
        match self {
            Purpose::ScanGate => b"scan-gate",
            Purpose::CandidateOrder => b"candidate-order",
            Purpose::Synthetic => b"synthetic",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for `(agent, purpose, tick)`.
    ///
    /// Independent of derivation order: agents evaluated in any order on any
    /// number of threads see the same streams.
    pub fn sub_seed(&self, agent: &AgentId, purpose: Purpose, tick: u64) -> u64 {
        self.keyed_seed(agent.as_str(), purpose, tick)
    }

    /// Same derivation keyed by an arbitrary string (a symbol for the
    /// synthetic source).
    pub fn keyed_seed(&self, key: &str, purpose: Purpose, tick: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(key.as_bytes());
        // Separator keeps ("ab", "c") and ("a", "bc") apart.
        hasher.update(&[0]);
        hasher.update(purpose.tag());
        hasher.update(&tick.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, agent: &AgentId, purpose: Purpose, tick: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(agent, purpose, tick))
    }
}

/// Unseeded randomness for cosmetic choices. Seeded from OS entropy.
#[derive(Debug, Clone)]
pub struct FlavorRng {
    inner: StdRng,
}

impl Default for FlavorRng {
    fn default() -> Self {
        Self::new()
    }
}

impl FlavorRng {
    pub fn new() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    /// Uniform index into a collection of `len` items; `None` when empty.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.inner.gen_range(0..len))
    }
}
