//! Deterministic RNG streams. A single master seed fans out into any number
//! of named streams, each an independent Mulberry32 sequence, so that
//! subsystems can't perturb each other's randomness: terrain placement can
//! draw as much or as little as it likes without shifting what a future
//! weather system will see.
//!
//! Streams can also [fork](RngStream::fork): the child's seed is derived from
//! the parent's *origin* seed and the fork label, never from the parent's
//! current position. Forking the same label twice, at any two points in the
//! parent's lifetime, yields identical children.

mod mulberry;

pub use mulberry::{combine_seed, hash_string, Mulberry32};

use crate::{
    error::{SimError, SimResult},
    util::NumRange,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Serialized form of a single PRNG word.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrngState {
    pub state: u32,
}

/// Serialized form of one stream: the seed it was created with plus the
/// current position of its generator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RngStreamState {
    pub original_seed: u32,
    pub prng_state: PrngState,
}

/// Serialized form of a whole [Rng] manager: master seed plus every stream
/// that has been materialized so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RngState {
    pub master_seed: u32,
    pub streams: IndexMap<String, RngStreamState>,
}

/// One deterministic random stream. Every draw mutates the stream's PRNG
/// state; everything else (the origin seed, the diagnostic label) is fixed at
/// construction.
#[derive(Clone, Debug)]
pub struct RngStream {
    original_seed: u32,
    prng: Mulberry32,
    /// Purely diagnostic; shows up in logs, never in derivation math
    label: Option<String>,
}

impl RngStream {
    fn with_seed(seed: u32, label: Option<String>) -> Self {
        Self {
            original_seed: seed,
            prng: Mulberry32::new(seed),
            label,
        }
    }

    /// The seed this stream was created with (not its current position).
    pub fn original_seed(&self) -> u32 {
        self.original_seed
    }

    /// Draw the next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.prng.next_u32()
    }

    /// Draw a float uniformly distributed in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Draw an integer uniformly distributed in `[min, max)`.
    pub fn next_in_range(&mut self, min: i64, max: i64) -> SimResult<i64> {
        if min >= max {
            return Err(SimError::InvalidArgument(format!(
                "empty integer range [{}, {})",
                min, max
            )));
        }
        let span = (max - min) as f64;
        Ok(min + (self.next_f64() * span).floor() as i64)
    }

    /// Draw a bool that is `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> SimResult<bool> {
        NumRange::normal_range().ensure_contains(p)?;
        Ok(self.next_f64() < p)
    }

    /// Pick one element of a non-empty slice uniformly.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> SimResult<&'a T> {
        if items.is_empty() {
            return Err(SimError::InvalidArgument(
                "cannot pick from an empty slice".into(),
            ));
        }
        let index = self.next_in_range(0, items.len() as i64)?;
        Ok(&items[index as usize])
    }

    /// Return a shuffled copy of the input (Fisher–Yates, high index down to
    /// 1). The input is never mutated.
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        for i in (1..out.len()).rev() {
            // The range is non-empty by construction, so this can't fail
            let j = self
                .next_in_range(0, i as i64 + 1)
                .expect("non-empty shuffle range")
                as usize;
            out.swap(i, j);
        }
        out
    }

    /// Derive a child stream from this stream's *origin* seed and a label.
    /// The parent's current position is irrelevant and untouched: a fork is
    /// position-stable no matter how much the parent has been consumed.
    pub fn fork(&self, label: &str) -> RngStream {
        let child_seed = combine_seed(self.original_seed, hash_string(label));
        let child_label = match &self.label {
            Some(parent) => format!("{}/{}", parent, label),
            None => label.to_owned(),
        };
        RngStream::with_seed(child_seed, Some(child_label))
    }

    /// Like [Self::fork] but with a numeric label, for callers forking per
    /// index rather than per name.
    pub fn fork_indexed(&self, index: u32) -> RngStream {
        let child_seed = combine_seed(self.original_seed, index);
        let child_label = self
            .label
            .as_ref()
            .map(|parent| format!("{}/{}", parent, index));
        RngStream::with_seed(child_seed, child_label)
    }

    /// Snapshot this stream's state.
    pub fn state(&self) -> RngStreamState {
        RngStreamState {
            original_seed: self.original_seed,
            prng_state: PrngState {
                state: self.prng.state(),
            },
        }
    }

    /// Restore a previously snapshotted position. The snapshot must belong
    /// to a stream with the same origin seed.
    pub fn set_state(&mut self, state: &RngStreamState) -> SimResult<()> {
        if state.original_seed != self.original_seed {
            return Err(SimError::StateMismatch(format!(
                "stream state has origin seed {}, expected {}",
                state.original_seed, self.original_seed
            )));
        }
        self.prng = Mulberry32::new(state.prng_state.state);
        Ok(())
    }
}

/// The stream manager: owns the master seed and hands out named streams. A
/// stream named `N` is seeded with `combine_seed(master, hash_string(N))`,
/// and asking for the same name twice returns the same stream object.
#[derive(Clone, Debug)]
pub struct Rng {
    master_seed: u32,
    streams: IndexMap<String, RngStream>,
}

impl Rng {
    pub fn new(master_seed: u32) -> Self {
        Self {
            master_seed,
            streams: IndexMap::new(),
        }
    }

    pub fn master_seed(&self) -> u32 {
        self.master_seed
    }

    /// Get the stream with the given name, creating it on first use.
    pub fn stream(&mut self, name: &str) -> &mut RngStream {
        let master_seed = self.master_seed;
        self.streams.entry(name.to_owned()).or_insert_with(|| {
            RngStream::with_seed(
                combine_seed(master_seed, hash_string(name)),
                Some(name.to_owned()),
            )
        })
    }

    /// Snapshot the master seed and the state of every materialized stream.
    pub fn state(&self) -> RngState {
        RngState {
            master_seed: self.master_seed,
            streams: self
                .streams
                .iter()
                .map(|(name, stream)| (name.clone(), stream.state()))
                .collect(),
        }
    }

    /// Restore a snapshot taken with [Self::state]. The snapshot's master
    /// seed must match this manager's.
    pub fn load_state(&mut self, state: &RngState) -> SimResult<()> {
        if state.master_seed != self.master_seed {
            return Err(SimError::StateMismatch(format!(
                "rng state has master seed {}, expected {}",
                state.master_seed, self.master_seed
            )));
        }
        for (name, stream_state) in &state.streams {
            self.stream(name).set_state(stream_state)?;
        }
        Ok(())
    }
}
