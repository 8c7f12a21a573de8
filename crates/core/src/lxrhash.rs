//! Core LXRHash implementation
//!
//! The input is reduced to 32 source bytes by a double digest, then the
//! source is swept several times. Every source byte drives one mixing
//! step: the accumulator absorbs a lane, makes a chain of dependent table
//! lookups, and is folded back into that lane. Each lookup index depends
//! on the previous lookup's result, so the cost of a hash is bounded by
//! memory latency rather than arithmetic.
//!
//! Two drivers share the step:
//! - [`LxrHash::hash`] runs one input to completion
//! - [`LxrHash::batch`] runs many inputs step-major, so the lookups of
//!   different inputs are independent and can be in flight together
//!
//! Both produce identical digests for the same input.

#[cfg(not(feature = "std"))]
use alloc::{sync::Arc, vec, vec::Vec};
#[cfg(feature = "std")]
use std::sync::Arc;

use core::fmt;

use log::debug;
use sha2::{Digest, Sha256};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{HashConfig, SourceDigest, Variant};
use crate::error::ConfigError;
use crate::params::SOURCE_SIZE;
use crate::table::{ShuffleTable, TableProvider};

/// Inputs handled per rayon task by [`LxrHash::batch_parallel`]
#[cfg(feature = "parallel")]
const PARALLEL_CHUNK: usize = 64;

/// A validated hash configuration with its lookup table
///
/// Immutable after construction. Cloning shares the table, so one
/// instance (or its clones) can serve any number of threads without
/// locking.
#[derive(Clone)]
pub struct LxrHash {
    table: Arc<[u8]>,
    config: HashConfig,
    mask: u64,
}

/// Per-computation mixing state
struct MixState {
    accumulator: u64,
    lanes: Vec<u64>,
    mask: u64,
}

/// One batch member: its own mixing state and source bytes
struct BatchState {
    mix: MixState,
    source: [u8; SOURCE_SIZE],
}

impl LxrHash {
    /// Validate `config` and build its table with [`ShuffleTable`]
    ///
    /// At the reference size (30 bits) this allocates 1 GiB and takes a
    /// while; embedders usually cache the table and use [`from_table`].
    ///
    /// [`from_table`]: Self::from_table
    pub fn new(config: HashConfig) -> Result<Self, ConfigError> {
        Self::with_provider(config, &ShuffleTable)
    }

    /// Validate `config` and build its table with `provider`
    pub fn with_provider<P>(config: HashConfig, provider: &P) -> Result<Self, ConfigError>
    where
        P: TableProvider + ?Sized,
    {
        config.validate()?;
        let table = provider.generate(
            config.seed,
            config.map_size_bits(),
            config.hash_size,
            config.table_passes,
        );
        Self::from_table(config, Arc::from(table))
    }

    /// Validate `config` against an existing table
    pub fn from_table(config: HashConfig, table: Arc<[u8]>) -> Result<Self, ConfigError> {
        config.validate()?;

        let actual = table.len() as u64;
        if actual != config.map_size {
            return Err(ConfigError::TableSizeMismatch {
                expected: config.map_size,
                actual,
            });
        }

        debug!(
            "lxrhash ready: variant {}, {} bit table, {} lanes, {} mixing passes",
            config.variant,
            config.map_size_bits(),
            config.hash_size,
            config.mixing_passes
        );

        Ok(Self {
            mask: config.map_size - 1,
            table,
            config,
        })
    }

    pub fn config(&self) -> &HashConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn map_size(&self) -> u64 {
        self.config.map_size
    }

    pub fn map_size_bits(&self) -> u32 {
        self.config.map_size_bits()
    }

    pub fn hash_size(&self) -> usize {
        self.config.hash_size
    }

    pub fn table_passes(&self) -> u32 {
        self.config.table_passes
    }

    pub fn mixing_passes(&self) -> u32 {
        self.config.mixing_passes
    }

    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    /// The lookup table
    pub fn table(&self) -> &[u8] {
        &self.table
    }

    /// A shared handle to the lookup table
    pub fn shared_table(&self) -> Arc<[u8]> {
        Arc::clone(&self.table)
    }

    /// Length of every digest this instance returns
    pub fn digest_len(&self) -> usize {
        self.config.variant.digest_len(self.config.hash_size)
    }

    /// Hash one input
    ///
    /// Returns `hash_size` bytes for variant 1 and 32 bytes for variant 2.
    pub fn hash(&self, input: &[u8]) -> Vec<u8> {
        let source = preprocess(self.config.digest, input);
        let mut state = self.start(&source);

        for _ in 0..self.config.mixing_passes {
            let mut lane = 0;
            for &byte in &source {
                if lane == self.config.hash_size {
                    lane = 0;
                }
                self.step(&mut state, lane, byte);
                lane += 1;
            }
        }

        self.finalize(state)
    }

    /// Hash many inputs, interleaving their mixing steps
    ///
    /// For every pass and source position one step is issued per input
    /// before moving on, so consecutive lookups belong to different
    /// inputs and do not wait on each other. `batch(xs)[i]` always equals
    /// `hash(xs[i])`.
    pub fn batch<T: AsRef<[u8]>>(&self, inputs: &[T]) -> Vec<Vec<u8>> {
        let mut members: Vec<BatchState> = inputs
            .iter()
            .map(|input| {
                let source = preprocess(self.config.digest, input.as_ref());
                BatchState {
                    mix: self.start(&source),
                    source,
                }
            })
            .collect();

        let hash_size = self.config.hash_size;
        for _ in 0..self.config.mixing_passes {
            for position in 0..SOURCE_SIZE {
                let lane = position % hash_size;
                for member in members.iter_mut() {
                    self.step(&mut member.mix, lane, member.source[position]);
                }
            }
        }

        members
            .into_iter()
            .map(|member| self.finalize(member.mix))
            .collect()
    }

    /// [`batch`](Self::batch) spread over the rayon pool
    ///
    /// Each worker interleaves its own chunk of inputs. Results keep the
    /// input order and match `batch` exactly.
    #[cfg(feature = "parallel")]
    pub fn batch_parallel<T: AsRef<[u8]> + Sync>(&self, inputs: &[T]) -> Vec<Vec<u8>> {
        let chunks: Vec<Vec<Vec<u8>>> = inputs
            .par_chunks(PARALLEL_CHUNK)
            .map(|chunk| self.batch(chunk))
            .collect();
        chunks.into_iter().flatten().collect()
    }

    /// Fresh state for one source: the first four source bytes are folded
    /// into the accumulator so the first lookup is input dependent
    fn start(&self, source: &[u8; SOURCE_SIZE]) -> MixState {
        let prefix = u32::from_le_bytes([source[0], source[1], source[2], source[3]]);
        MixState {
            accumulator: self.config.variant.initial_accumulator(self.config.seed)
                ^ u64::from(prefix),
            lanes: vec![0; self.config.hash_size],
            mask: self.mask,
        }
    }

    /// One mixing step: absorb a lane, chain the table lookups, write the
    /// lane back. Shifts are on wrapping 64-bit words.
    #[inline(always)]
    fn step(&self, state: &mut MixState, lane: usize, byte: u8) {
        let table = &*self.table;
        let value = u64::from(byte);
        let previous = state.lanes[lane];

        let mut acc = state.accumulator;
        acc ^= (acc << 23) ^ (acc >> 11) ^ previous;

        for &(left, right) in self.config.variant.lookup_shifts() {
            // In bounds: mask = table.len() - 1
            let index = ((value ^ acc) & state.mask) as usize;
            acc = (acc << left) ^ (acc >> right) ^ u64::from(table[index]);
        }

        state.lanes[lane] =
            (previous << self.config.variant.lane_shift()) ^ (previous >> 1) ^ acc;
        state.accumulator = acc;
    }

    /// Fold the lanes into the digest, last lane first
    fn finalize(&self, state: MixState) -> Vec<u8> {
        match self.config.variant {
            Variant::V1 => state.lanes.iter().rev().map(|&lane| lane as u8).collect(),
            Variant::V2 => {
                // The leading byte comes out last, after every lane has
                // passed through the accumulator.
                let mut acc = state.accumulator;
                let mut digest = vec![0u8; SOURCE_SIZE];
                for (i, &lane) in state.lanes.iter().enumerate().rev() {
                    acc = (acc << 8) ^ (acc >> 1) ^ lane;
                    digest[i] = acc as u8;
                }
                digest
            }
        }
    }
}

impl fmt::Debug for LxrHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LxrHash")
            .field("config", &self.config)
            .field("table_len", &self.table.len())
            .finish()
    }
}

/// Reduce an arbitrary input to the fixed-size source: `D(D(input))`
///
/// Hash cost is therefore independent of input length.
pub fn preprocess(digest: SourceDigest, input: &[u8]) -> [u8; SOURCE_SIZE] {
    let mut source = [0u8; SOURCE_SIZE];
    match digest {
        SourceDigest::Sha256 => {
            let first = Sha256::digest(input);
            source.copy_from_slice(&Sha256::digest(first));
        }
        SourceDigest::Blake3 => {
            let first = blake3::hash(input);
            source.copy_from_slice(blake3::hash(first.as_bytes()).as_bytes());
        }
    }
    source
}

/// Mining score of a digest: its first 8 bytes as a big-endian integer
///
/// Higher is better. Digests shorter than 8 bytes are zero padded on the
/// right.
///
/// # Example
///
/// ```rust
/// use lxrhash_core::difficulty;
///
/// let hash = [0xFF, 0xFF, 0x00, 0x01, 0, 0, 0, 0, 0xAB];
/// assert_eq!(difficulty(&hash), 0xFFFF_0001_0000_0000);
/// ```
#[inline(always)]
pub fn difficulty(hash: &[u8]) -> u64 {
    let mut prefix = [0u8; 8];
    let len = hash.len().min(prefix.len());
    prefix[..len].copy_from_slice(&hash[..len]);
    u64::from_be_bytes(prefix)
}

/// Check whether a digest's [`difficulty`] reaches `target`
#[inline(always)]
pub fn meets_difficulty(hash: &[u8], target: u64) -> bool {
    difficulty(hash) >= target
}
