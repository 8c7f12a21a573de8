//! LXRHash Algorithm Parameters
//!
//! Reference values used by miners that need to agree on hashes. Any of
//! them can be overridden through [`HashConfig`](crate::HashConfig), but
//! two parties only produce the same digests when every value matches.

/// Reference seed used for table generation and the initial accumulator
pub const DEFAULT_SEED: u64 = 0xFAFA_ECEC_FAFA_ECEC;

/// Reference table size exponent (2^30 bytes = 1 GiB)
pub const DEFAULT_MAP_SIZE_BITS: u32 = 30;

/// Smallest supported table exponent (one entry per byte value)
pub const MIN_MAP_SIZE_BITS: u32 = 8;

/// Largest supported table exponent (2^40 bytes = 1 TiB)
pub const MAX_MAP_SIZE_BITS: u32 = 40;

/// Number of 64-bit lanes, and output bytes for variant 1
pub const DEFAULT_HASH_SIZE: usize = 32;

/// Shuffle passes used when generating the table
pub const DEFAULT_TABLE_PASSES: u32 = 5;

/// Sweeps of the mixing step over the preprocessed source
pub const DEFAULT_MIXING_PASSES: u32 = 3;

/// Preprocessed source length (one 256-bit digest)
pub const SOURCE_SIZE: usize = 32;

/// Shift pairs `(left, right)` cycled through the table lookups of one step
pub const LOOKUP_SHIFTS: [(u32, u32); 4] = [(13, 1), (11, 3), (17, 5), (19, 7)];
