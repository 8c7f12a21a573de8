//! Configuration errors
//!
//! Hashing itself cannot fail. Everything that could make a digest wrong
//! is rejected here, when an [`LxrHash`](crate::LxrHash) is constructed.

use thiserror::Error;

/// Rejected hash configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The table mask `map_size - 1` is only valid for powers of two
    #[error("map size {0} is not a power of two")]
    MapSizeNotPowerOfTwo(u64),

    /// Table exponent outside `MIN_MAP_SIZE_BITS..=MAX_MAP_SIZE_BITS`
    #[error("map size exponent {bits} is outside the supported range {min}..={max}")]
    MapSizeOutOfRange { bits: u32, min: u32, max: u32 },

    /// The table cannot be addressed on this platform
    #[error("map size {0} does not fit in addressable memory")]
    TableTooLarge(u64),

    /// Supplied table length disagrees with the configured map size
    #[error("table holds {actual} bytes but map size is {expected}")]
    TableSizeMismatch { expected: u64, actual: u64 },

    /// At least one lane is required
    #[error("hash size must be greater than zero")]
    ZeroHashSize,

    /// At least one mixing pass is required
    #[error("mixing passes must be greater than zero")]
    ZeroMixingPasses,

    /// Lane count incompatible with the variant's lane policy
    #[error("variant {variant} cannot use {hash_size} lanes: {requirement}")]
    LaneCountMismatch {
        variant: u8,
        hash_size: usize,
        requirement: &'static str,
    },

    /// Variant id with no mixing schedule
    #[error("unknown hash variant {0}")]
    UnknownVariant(u8),
}
