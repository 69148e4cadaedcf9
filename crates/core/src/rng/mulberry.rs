//! The deterministic primitives everything else is built on: a Mulberry32
//! step function, a string hash, and a seed combiner. All three operate on
//! 32-bit words with wrapping arithmetic, and their exact bit patterns are
//! load-bearing — world generation, stream forking, and the noise
//! permutation tables all derive from these, so any change here reshuffles
//! every world ever generated.

use serde::{Deserialize, Serialize};

/// A single Mulberry32 PRNG: one u32 of state, advanced on every draw.
/// Cloneable and serializable so streams can be snapshotted and restored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advance the state one step and return the next value in the sequence.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut z = self.state;
        z = (z ^ (z >> 15)).wrapping_mul(z | 1);
        z ^= z.wrapping_add((z ^ (z >> 7)).wrapping_mul(z | 61));
        z ^ (z >> 14)
    }

    /// The raw state word. Exposed for serialization only.
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Hash a string into a u32. Iterates the string's **UTF-16 code units** (so
/// surrogate halves are hashed separately) with a multiplicative mix, then
/// runs the MurmurHash3 32-bit finalizer over the accumulator. The code-unit
/// choice is deliberate: it keeps stream names and fork labels hashing
/// identically across every platform this runs on.
pub fn hash_string(s: &str) -> u32 {
    let mut h: u32 = 0;
    for c in s.encode_utf16() {
        h = (h ^ u32::from(c)).wrapping_mul(0x5BD1_E995);
        h ^= h >> 15;
    }
    // MurmurHash3 finalizer
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    h
}

/// Mix two seeds into one. Used to derive per-stream seeds from the master
/// seed and per-fork seeds from a stream's origin seed.
pub fn combine_seed(a: u32, b: u32) -> u32 {
    let mut c = a ^ b;
    c = c.wrapping_mul(0x9E37_79B9);
    c ^= c >> 16;
    c = c.wrapping_mul(0x85EB_CA6B);
    c ^= c >> 13;
    c
}
