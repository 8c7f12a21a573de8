//! # LXRHash Core Algorithm
//!
//! A keyed, table-driven proof-of-work hash whose cost is dominated by
//! random reads from a large lookup table. Throughput is bounded by
//! memory latency, not ALU speed, which removes most of the advantage of
//! specialised hashing hardware.
//!
//! ## Pipeline
//!
//! - **Preprocess**: `SHA-256(SHA-256(input))`, 32 source bytes
//! - **Mix**: 3 sweeps over the source; each byte runs 9-10 dependent
//!   table lookups and updates one of the 64-bit lanes
//! - **Finalize**: lanes folded into the digest in reverse order
//!
//! ## Variants
//!
//! - [`Variant::V1`]: ten lookups per step, digest is the low byte of
//!   each lane, `hash_size` bytes long
//! - [`Variant::V2`]: nine lookups per step, lanes chained through the
//!   accumulator so the leading byte depends on every lane, 32 bytes
//!
//! ## Example
//!
//! ```rust
//! use lxrhash_core::{HashConfig, LxrHash, Variant, difficulty};
//!
//! // Small table for the example; miners use 30 bits (1 GiB)
//! let config = HashConfig::default()
//!     .with_map_size_bits(12)
//!     .with_variant(Variant::V2);
//! let lxr = LxrHash::new(config).unwrap();
//!
//! let single = lxr.hash(b"one test");
//! assert_eq!(single.len(), 32);
//!
//! // Batching only changes throughput, never the result
//! let batch = lxr.batch(&[b"one test".as_slice(), b"one tesu".as_slice()]);
//! assert_eq!(batch[0], single);
//!
//! println!("score: {:016x}", difficulty(&single));
//! ```
//!
//! ## no_std Support
//!
//! This crate supports `no_std` environments with the `alloc` crate:
//!
//! ```toml
//! [dependencies]
//! lxrhash-core = { version = "0.3", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod config;
mod error;
mod lxrhash;
mod params;
mod table;

pub use config::{HashConfig, SourceDigest, Variant};
pub use error::ConfigError;
pub use lxrhash::{LxrHash, difficulty, meets_difficulty, preprocess};
pub use params::*;
pub use table::{ShuffleTable, TableProvider};
