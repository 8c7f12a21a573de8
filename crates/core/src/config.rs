//! Hash configuration and validation

use core::fmt;

use crate::error::ConfigError;
use crate::params::*;

/// Ten lookups, ending on the second shift pair
const V1_SHIFTS: [(u32, u32); 10] = cycle_shifts::<10>();

/// Nine lookups; the ninth reuses the first shift pair
const V2_SHIFTS: [(u32, u32); 9] = cycle_shifts::<9>();

const fn cycle_shifts<const N: usize>() -> [(u32, u32); N] {
    let mut shifts = [(0, 0); N];
    let mut i = 0;
    while i < N {
        shifts[i] = LOOKUP_SHIFTS[i % LOOKUP_SHIFTS.len()];
        i += 1;
    }
    shifts
}

/// Mixing and finalization schedule family
///
/// Both variants share one step function. They differ in how many
/// table lookups a step performs, how a lane absorbs the accumulator,
/// where the accumulator starts and how lanes are folded into the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Variant {
    /// Original schedule: ten lookups, lanes emitted as their low bytes
    V1 = 1,
    /// Nine lookups, lanes chained through the accumulator on output
    #[default]
    V2 = 2,
}

impl Variant {
    /// Numeric id used on the command line and in configuration files
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Shift pairs for each table lookup of one mixing step
    pub const fn lookup_shifts(self) -> &'static [(u32, u32)] {
        match self {
            Variant::V1 => &V1_SHIFTS,
            Variant::V2 => &V2_SHIFTS,
        }
    }

    /// Table lookups per mixing step
    pub const fn lookups(self) -> usize {
        self.lookup_shifts().len()
    }

    /// Left shift applied to a lane when it absorbs the accumulator
    pub const fn lane_shift(self) -> u32 {
        match self {
            Variant::V1 => 17,
            Variant::V2 => 8,
        }
    }

    /// Starting accumulator before the source prefix is folded in
    pub const fn initial_accumulator(self, seed: u64) -> u64 {
        match self {
            Variant::V1 => seed,
            Variant::V2 => 0,
        }
    }

    /// Digest length produced for `hash_size` lanes
    pub const fn digest_len(self, hash_size: usize) -> usize {
        match self {
            Variant::V1 => hash_size,
            Variant::V2 => SOURCE_SIZE,
        }
    }

    /// Lane policy check
    ///
    /// Variant 2 maps source position `j` to lane `j` and always emits
    /// 32 bytes, so it needs exactly `SOURCE_SIZE` lanes. Variant 1 wraps
    /// the lane index at `hash_size`; more lanes than source bytes would
    /// leave some lanes untouched.
    fn check_lanes(self, hash_size: usize) -> Result<(), ConfigError> {
        let ok = match self {
            Variant::V1 => hash_size <= SOURCE_SIZE,
            Variant::V2 => hash_size == SOURCE_SIZE,
        };
        if ok {
            return Ok(());
        }
        Err(ConfigError::LaneCountMismatch {
            variant: self.id(),
            hash_size,
            requirement: match self {
                Variant::V1 => "at most 32 lanes, wrapped over the source",
                Variant::V2 => "exactly 32 lanes, one per source byte",
            },
        })
    }
}

impl TryFrom<u8> for Variant {
    type Error = ConfigError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Variant::V1),
            2 => Ok(Variant::V2),
            other => Err(ConfigError::UnknownVariant(other)),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// 256-bit digest applied twice to reduce the input to the source bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceDigest {
    #[default]
    Sha256,
    Blake3,
}

/// Hash parameters, before the table is attached
///
/// `table_passes` only drives table generation; `mixing_passes` is the
/// number of sweeps over the source during hashing. They are independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashConfig {
    pub seed: u64,
    pub map_size: u64,
    pub hash_size: usize,
    pub table_passes: u32,
    pub mixing_passes: u32,
    pub variant: Variant,
    pub digest: SourceDigest,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            map_size: 1 << DEFAULT_MAP_SIZE_BITS,
            hash_size: DEFAULT_HASH_SIZE,
            table_passes: DEFAULT_TABLE_PASSES,
            mixing_passes: DEFAULT_MIXING_PASSES,
            variant: Variant::default(),
            digest: SourceDigest::default(),
        }
    }
}

impl HashConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_map_size(mut self, map_size: u64) -> Self {
        self.map_size = map_size;
        self
    }

    /// Set the map size as a power-of-two exponent
    ///
    /// Exponents of 64 or more saturate to a non power of two so that
    /// [`validate`](Self::validate) rejects them.
    pub fn with_map_size_bits(mut self, bits: u32) -> Self {
        self.map_size = 1u64.checked_shl(bits).unwrap_or(u64::MAX);
        self
    }

    pub fn with_hash_size(mut self, hash_size: usize) -> Self {
        self.hash_size = hash_size;
        self
    }

    pub fn with_table_passes(mut self, passes: u32) -> Self {
        self.table_passes = passes;
        self
    }

    pub fn with_mixing_passes(mut self, passes: u32) -> Self {
        self.mixing_passes = passes;
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_digest(mut self, digest: SourceDigest) -> Self {
        self.digest = digest;
        self
    }

    /// `log2(map_size)`; only meaningful once validated
    pub fn map_size_bits(&self) -> u32 {
        self.map_size.trailing_zeros()
    }

    /// Check every construction-time invariant
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.map_size.is_power_of_two() {
            return Err(ConfigError::MapSizeNotPowerOfTwo(self.map_size));
        }

        let bits = self.map_size_bits();
        if !(MIN_MAP_SIZE_BITS..=MAX_MAP_SIZE_BITS).contains(&bits) {
            return Err(ConfigError::MapSizeOutOfRange {
                bits,
                min: MIN_MAP_SIZE_BITS,
                max: MAX_MAP_SIZE_BITS,
            });
        }
        if usize::try_from(self.map_size).is_err() {
            return Err(ConfigError::TableTooLarge(self.map_size));
        }

        if self.hash_size == 0 {
            return Err(ConfigError::ZeroHashSize);
        }
        if self.mixing_passes == 0 {
            return Err(ConfigError::ZeroMixingPasses);
        }

        self.variant.check_lanes(self.hash_size)
    }
}
