//! On-disk cache for LXRHash lookup tables
//!
//! A reference table is 1 GiB and takes minutes to shuffle, so miners
//! build it once per `(provider, seed, passes, bits)` and read it back
//! afterwards.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

use crate::algorithm::{ConfigError, HashConfig, LxrHash, ShuffleTable, TableProvider};

/// Cache directory name under the home directory
pub const CACHE_DIR_NAME: &str = ".lxrhash";

/// Table cache failures
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no home directory to keep the table cache in")]
    NoHomeDir,

    #[error("cached table {path} holds {actual} bytes, expected {expected}")]
    Corrupt {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("table cache I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Default cache directory: `~/.lxrhash`
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CACHE_DIR_NAME))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Directory of cached tables
#[derive(Debug, Clone)]
pub struct TableCache {
    dir: PathBuf,
}

impl TableCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache rooted at [`default_cache_dir`]
    pub fn default_location() -> Result<Self, CacheError> {
        default_cache_dir().map(Self::new).ok_or(CacheError::NoHomeDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the table `provider` builds for `config`
    ///
    /// The lane count does not affect the table and is not part of the key.
    /// Tables from [`ShuffleTable`] keep the unprefixed name; any other
    /// provider's name is added so its tables never collide with them.
    pub fn path_for(&self, config: &HashConfig, provider: &str) -> PathBuf {
        let key = format!(
            "seed-{:x}-passes-{}-size-{}",
            config.seed,
            config.table_passes,
            config.map_size_bits()
        );
        if provider == ShuffleTable::NAME {
            self.dir.join(format!("lxrhash-{}.dat", key))
        } else {
            self.dir.join(format!("lxrhash-{}-{}.dat", provider, key))
        }
    }

    /// Read the cached table, `None` when nothing is cached yet
    pub fn load(
        &self,
        config: &HashConfig,
        provider: &str,
    ) -> Result<Option<Arc<[u8]>>, CacheError> {
        let path = self.path_for(config, provider);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };

        if metadata.len() != config.map_size {
            return Err(CacheError::Corrupt {
                path,
                expected: config.map_size,
                actual: metadata.len(),
            });
        }

        let table = fs::read(&path).map_err(io_error(&path))?;
        Ok(Some(Arc::from(table)))
    }

    /// Write a table, replacing any previous file atomically
    pub fn store(
        &self,
        config: &HashConfig,
        provider: &str,
        table: &[u8],
    ) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let path = self.path_for(config, provider);
        let partial = path.with_extension("dat.partial");
        {
            let mut file = fs::File::create(&partial).map_err(io_error(&partial))?;
            file.write_all(table).map_err(io_error(&partial))?;
            file.sync_all().map_err(io_error(&partial))?;
        }
        fs::rename(&partial, &path).map_err(io_error(&path))?;

        Ok(path)
    }

    /// Load the table for `config`, generating and caching it if needed
    ///
    /// A cached file of the wrong size is regenerated. Failing to write
    /// the cache is logged but does not fail the call.
    pub fn load_or_generate<P>(&self, config: HashConfig, provider: &P) -> Result<LxrHash, CacheError>
    where
        P: TableProvider + ?Sized,
    {
        config.validate()?;
        let name = provider.name();

        match self.load(&config, name) {
            Ok(Some(table)) => {
                info!("loaded table from {}", self.path_for(&config, name).display());
                return Ok(LxrHash::from_table(config, table)?);
            }
            Ok(None) => {}
            Err(e @ CacheError::Corrupt { .. }) => warn!("{}; regenerating", e),
            Err(e) => return Err(e),
        }

        info!(
            "generating {} bit {} table (seed {:#x}, {} passes)",
            config.map_size_bits(),
            name,
            config.seed,
            config.table_passes
        );
        let lxr = LxrHash::with_provider(config, provider)?;

        match self.store(lxr.config(), name, lxr.table()) {
            Ok(path) => info!("cached table at {}", path.display()),
            Err(e) => warn!("table not cached: {}", e),
        }

        Ok(lxr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Variant;

    const SHUFFLE: &str = ShuffleTable::NAME;

    /// Provider whose tables are all zero
    struct Zeros;

    impl TableProvider for Zeros {
        fn name(&self) -> &str {
            "zeros"
        }

        fn generate(&self, _: u64, bits: u32, _: usize, _: u32) -> Vec<u8> {
            vec![0u8; 1 << bits]
        }
    }

    fn small_config() -> HashConfig {
        HashConfig::default()
            .with_map_size_bits(10)
            .with_variant(Variant::V2)
    }

    #[test]
    fn test_path_is_keyed_by_table_parameters() {
        let cache = TableCache::new("/tmp/lxr");
        let config = small_config();

        let path = cache.path_for(&config, SHUFFLE);
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "lxrhash-seed-fafaececfafaecec-passes-5-size-10.dat"
        );

        let lanes = config.clone().with_variant(Variant::V1).with_hash_size(8);
        assert_eq!(cache.path_for(&lanes, SHUFFLE), path);

        let passes = config.clone().with_table_passes(6);
        assert_ne!(cache.path_for(&passes, SHUFFLE), path);

        assert_eq!(
            cache.path_for(&config, "zeros").file_name().unwrap().to_str().unwrap(),
            "lxrhash-zeros-seed-fafaececfafaecec-passes-5-size-10.dat"
        );
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        assert!(cache.load(&small_config(), SHUFFLE).unwrap().is_none());
    }

    #[test]
    fn test_generate_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path().join("nested"));
        let config = small_config();

        let generated = cache.load_or_generate(config.clone(), &ShuffleTable).unwrap();
        assert!(cache.path_for(&config, SHUFFLE).exists());

        let cached = cache.load(&config, SHUFFLE).unwrap().unwrap();
        assert_eq!(&cached[..], generated.table());

        let reloaded = cache.load_or_generate(config, &ShuffleTable).unwrap();
        assert_eq!(reloaded.hash(b"one test"), generated.hash(b"one test"));
    }

    #[test]
    fn test_corrupt_file_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        let config = small_config();

        fs::write(cache.path_for(&config, SHUFFLE), [0u8; 17]).unwrap();
        assert!(matches!(
            cache.load(&config, SHUFFLE),
            Err(CacheError::Corrupt {
                expected: 1024,
                actual: 17,
                ..
            })
        ));

        let lxr = cache.load_or_generate(config.clone(), &ShuffleTable).unwrap();
        assert_eq!(lxr.table().len(), 1024);
        assert_eq!(cache.load(&config, SHUFFLE).unwrap().unwrap().len(), 1024);
    }

    #[test]
    fn test_providers_do_not_share_tables() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        let config = small_config();

        let shuffled = cache.load_or_generate(config.clone(), &ShuffleTable).unwrap();
        let zeros = cache.load_or_generate(config.clone(), &Zeros).unwrap();
        let direct = LxrHash::with_provider(config.clone(), &Zeros).unwrap();

        assert_eq!(zeros.table(), direct.table());
        assert_eq!(zeros.hash(b"one test"), direct.hash(b"one test"));
        assert_ne!(zeros.table(), shuffled.table());

        // Both files now exist and each reload returns its own table
        let again = cache.load_or_generate(config.clone(), &Zeros).unwrap();
        assert_eq!(again.table(), direct.table());
        let again = cache.load_or_generate(config, &ShuffleTable).unwrap();
        assert_eq!(again.table(), shuffled.table());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path().join("never-created"));
        let config = small_config().with_map_size(1000);

        assert!(matches!(
            cache.load_or_generate(config, &ShuffleTable),
            Err(CacheError::Config(ConfigError::MapSizeNotPowerOfTwo(1000)))
        ));
        assert!(!cache.dir().exists());
    }
}
