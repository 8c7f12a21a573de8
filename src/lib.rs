//! LXRHash Miner Library
//!
//! Everything an embedding system needs around the LXRHash core: a disk
//! cache for the (large) lookup tables and a proof-of-work mining
//! simulator that reports hash rates.
//!
//! # Example
//!
//! ```rust
//! use lxr::algorithm::{difficulty, HashConfig, LxrHash, Variant};
//!
//! let config = HashConfig::default()
//!     .with_map_size_bits(10)
//!     .with_variant(Variant::V2);
//! let lxr = LxrHash::new(config).unwrap();
//!
//! let result = lxr.hash(b"nonce|one test");
//! println!("difficulty {:016x}", difficulty(&result));
//! ```

// Re-export the core algorithm
pub use lxrhash_core as algorithm;

pub mod cache;
pub mod miner;

// Convenience re-exports
pub use algorithm::{difficulty, meets_difficulty, HashConfig, LxrHash, Variant};
