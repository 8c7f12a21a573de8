//! Lookup table generation
//!
//! The table (ByteMap) is the memory the hash is bound by. It must be
//! reproducible from `(seed, bits, passes)` alone so that independent
//! processes agree on every digest.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use log::debug;

/// Initial walk offset, mixed with the seed
const FIRST_OFFSET: u64 = 2_458_719_153_079_158_768;

/// Initial feedback word, mixed with the seed
const FIRST_FEEDBACK: u64 = 4_631_534_797_403_582_785;

/// Initial table-feedback value
const FIRST_VALUE: u64 = 3_523_455_478_921_636_871;

/// Deterministic source of lookup tables
///
/// Implementations must return exactly `2^map_size_bits` bytes and must
/// return byte-identical tables for identical arguments. `LxrHash` only
/// calls `generate` with a validated config, so `map_size_bits` is below
/// `usize::BITS` there; direct callers get an empty table otherwise.
pub trait TableProvider {
    /// Short filename-safe name; providers with different names never
    /// share a cached table
    fn name(&self) -> &str;

    fn generate(&self, seed: u64, map_size_bits: u32, hash_size: usize, passes: u32) -> Vec<u8>;
}

/// Default provider: an identity table shuffled in place
///
/// Every byte value starts out `2^bits / 256` times. Each pass swaps
/// every position with one chosen by a pseudo-random walk that feeds
/// back on the table contents, so the histogram is preserved while the
/// layout depends on the whole shuffle history. The lane count does not
/// influence the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuffleTable;

impl ShuffleTable {
    pub const NAME: &'static str = "shuffle";
}

impl TableProvider for ShuffleTable {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(&self, seed: u64, map_size_bits: u32, _hash_size: usize, passes: u32) -> Vec<u8> {
        let Some(size) = 1usize.checked_shl(map_size_bits) else {
            return Vec::new();
        };
        let mask = (size - 1) as u64;

        debug!(
            "generating {} byte table (seed {:#018x}, {} passes)",
            size, seed, passes
        );

        // Truncation is the point: byte value i % 256
        let mut table: Vec<u8> = (0..size).map(|i| i as u8).collect();

        let mut offset = seed ^ FIRST_OFFSET;
        let mut feedback = seed ^ FIRST_FEEDBACK;
        let mut value = FIRST_VALUE;

        for pass in 0..passes {
            for i in 0..size {
                offset = (offset << 9) ^ (offset >> 1) ^ (offset >> 7) ^ feedback;
                value = u64::from(table[((offset ^ feedback) & mask) as usize])
                    ^ (value << 8)
                    ^ (value >> 1);
                feedback = (value << 7)
                    ^ (value << 13)
                    ^ (value << 33)
                    ^ (value << 52)
                    ^ (feedback << 9)
                    ^ (feedback >> 1);

                table.swap(i, (offset & mask) as usize);
            }
            debug!("table pass {}/{} done", pass + 1, passes);
        }

        table
    }
}
