//! Mining simulator configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::algorithm::{
    ConfigError, HashConfig, Variant, DEFAULT_MAP_SIZE_BITS, DEFAULT_SEED, DEFAULT_TABLE_PASSES,
};

/// Default status queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Default seconds between hash-rate lines
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 10;

/// Inputs per `batch` call for variant 2 when not configured
pub const DEFAULT_V2_BATCH: usize = 256;

/// Hash function being mined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Lxrhash,
    Sha256,
}

/// Miner settings, loadable from a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    pub algorithm: Algorithm,
    /// Table exponent for LXRHash
    pub map_size_bits: u32,
    /// LXRHash variant id (1 or 2)
    pub variant: u8,
    pub seed: u64,
    pub table_passes: u32,
    /// Worker threads (default: 1)
    pub threads: Option<usize>,
    /// Inputs hashed per call (default: 256 for variant 2, else 1)
    pub batch_size: Option<usize>,
    pub report_interval_secs: u64,
    /// Bounded status queue size; extra messages are dropped
    pub queue_capacity: usize,
    /// Stop after this many seconds (default: run until Ctrl-C)
    pub duration_secs: Option<u64>,
    /// Emit JSON status lines instead of columns
    pub json: bool,
    /// Table cache directory (default: `~/.lxrhash`)
    pub cache_dir: Option<PathBuf>,
    pub use_cache: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            map_size_bits: DEFAULT_MAP_SIZE_BITS,
            variant: Variant::V1.id(),
            seed: DEFAULT_SEED,
            table_passes: DEFAULT_TABLE_PASSES,
            threads: None,
            batch_size: None,
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            duration_secs: None,
            json: false,
            cache_dir: None,
            use_cache: true,
        }
    }
}

impl MinerConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading miner config {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing miner config {}", path.display()))
    }

    /// Validated hash parameters for the configured variant
    pub fn hash_config(&self) -> Result<HashConfig, ConfigError> {
        let config = HashConfig::default()
            .with_seed(self.seed)
            .with_map_size_bits(self.map_size_bits)
            .with_table_passes(self.table_passes)
            .with_variant(Variant::try_from(self.variant)?);
        config.validate()?;
        Ok(config)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or(1).max(1)
    }

    pub fn effective_batch_size(&self) -> usize {
        let default = match (self.algorithm, self.variant) {
            (Algorithm::Lxrhash, 2) => DEFAULT_V2_BATCH,
            _ => 1,
        };
        self.batch_size.unwrap_or(default).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MinerConfig =
            serde_json::from_str(r#"{"algorithm": "sha256", "threads": 4}"#).unwrap();

        assert_eq!(config.algorithm, Algorithm::Sha256);
        assert_eq!(config.thread_count(), 4);
        assert_eq!(config.map_size_bits, DEFAULT_MAP_SIZE_BITS);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.use_cache);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("miner.json");
        std::fs::write(&path, r#"{"map_size_bits": 12, "variant": 2}"#).unwrap();

        let config = MinerConfig::load(&path).unwrap();
        assert_eq!(config.map_size_bits, 12);
        assert_eq!(config.effective_batch_size(), DEFAULT_V2_BATCH);

        assert!(MinerConfig::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_batch_size_defaults() {
        let mut config = MinerConfig::default();
        assert_eq!(config.effective_batch_size(), 1);

        config.variant = 2;
        assert_eq!(config.effective_batch_size(), DEFAULT_V2_BATCH);

        config.algorithm = Algorithm::Sha256;
        assert_eq!(config.effective_batch_size(), 1);

        config.batch_size = Some(0);
        assert_eq!(config.effective_batch_size(), 1);
    }

    #[test]
    fn test_hash_config_validation() {
        let mut config = MinerConfig {
            map_size_bits: 12,
            variant: 2,
            ..MinerConfig::default()
        };
        let hash_config = config.hash_config().unwrap();
        assert_eq!(hash_config.map_size, 4096);
        assert_eq!(hash_config.variant, Variant::V2);

        config.variant = 7;
        assert_eq!(config.hash_config(), Err(ConfigError::UnknownVariant(7)));

        config.variant = 1;
        config.map_size_bits = 41;
        assert!(matches!(
            config.hash_config(),
            Err(ConfigError::MapSizeOutOfRange { bits: 41, .. })
        ));
    }
}
