//! LXRHash Miner CLI
//!
//! # Commands
//!
//! - `mine` - Simulate mining with LXRHash or SHA-256 and report hash rates
//! - `hash` - Hash a string and print the digest
//! - `benchmark` - Compare single and batched LXRHash throughput

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use log::info;

use lxr::algorithm::{
    difficulty, HashConfig, LxrHash, ShuffleTable, Variant, DEFAULT_MAP_SIZE_BITS,
    MAX_MAP_SIZE_BITS, MIN_MAP_SIZE_BITS,
};
use lxr::cache::TableCache;
use lxr::miner::{Algorithm, Miner, MinerConfig, MiningHash};

#[derive(Parser)]
#[command(name = "lxr")]
#[command(version)]
#[command(about = "LXRHash memory-hard proof-of-work hash and mining simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Table cache directory (default: ~/.lxrhash)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Always regenerate the table instead of using the cache
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate mining and report hash rates
    Mine {
        /// Hash to mine with
        #[arg(value_enum)]
        algorithm: Algorithm,

        /// Table size exponent, 8 to 40 (30 bits is 1 GiB)
        #[arg(short, long)]
        bits: Option<u32>,

        /// LXRHash variant: 1 (single) or 2 (batched)
        #[arg(short = 'v', long)]
        variant: Option<u8>,

        /// Number of threads to use (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Inputs hashed per batch
        #[arg(long)]
        batch: Option<usize>,

        /// Seconds between hash-rate lines
        #[arg(long)]
        report_secs: Option<u64>,

        /// Stop after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Print status lines as JSON
        #[arg(long)]
        json: bool,

        /// JSON miner config file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Hash a string with LXRHash
    Hash {
        /// Text to hash
        text: String,

        /// Table size exponent
        #[arg(short, long, default_value_t = DEFAULT_MAP_SIZE_BITS)]
        bits: u32,

        /// LXRHash variant: 1 or 2
        #[arg(short = 'v', long, default_value_t = 2)]
        variant: u8,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of hashes to compute
        #[arg(short, long, default_value = "1000")]
        count: u32,

        /// Table size exponent
        #[arg(short, long, default_value_t = DEFAULT_MAP_SIZE_BITS)]
        bits: u32,

        /// LXRHash variant: 1 or 2
        #[arg(short = 'v', long, default_value_t = 2)]
        variant: u8,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cache = CacheChoice {
        dir: cli.cache_dir,
        disabled: cli.no_cache,
    };

    let result = match cli.command {
        Commands::Mine {
            algorithm,
            bits,
            variant,
            threads,
            batch,
            report_secs,
            duration_secs,
            json,
            config,
        } => {
            let overrides = MineOverrides {
                algorithm,
                bits,
                variant,
                threads,
                batch,
                report_secs,
                duration_secs,
                json,
            };
            cmd_mine(config, overrides, cache)
        }
        Commands::Hash {
            text,
            bits,
            variant,
        } => cmd_hash(&text, bits, variant, &cache),
        Commands::Benchmark {
            count,
            bits,
            variant,
        } => cmd_benchmark(count, bits, variant, &cache),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Where tables come from
struct CacheChoice {
    dir: Option<PathBuf>,
    disabled: bool,
}

impl CacheChoice {
    fn build(&self, config: HashConfig) -> anyhow::Result<LxrHash> {
        let start = Instant::now();
        let lxr = if self.disabled {
            info!("generating {} bit table", config.map_size_bits());
            LxrHash::new(config)?
        } else {
            let cache = match &self.dir {
                Some(dir) => TableCache::new(dir),
                None => TableCache::default_location()?,
            };
            cache.load_or_generate(config, &ShuffleTable)?
        };
        info!("table ready in {:.1}s", start.elapsed().as_secs_f64());
        Ok(lxr)
    }
}

/// Mine flags that override the config file
struct MineOverrides {
    algorithm: Algorithm,
    bits: Option<u32>,
    variant: Option<u8>,
    threads: Option<usize>,
    batch: Option<usize>,
    report_secs: Option<u64>,
    duration_secs: Option<u64>,
    json: bool,
}

fn check_bits(bits: u32) -> anyhow::Result<()> {
    if !(MIN_MAP_SIZE_BITS..=MAX_MAP_SIZE_BITS).contains(&bits) {
        anyhow::bail!(
            "Bits specified must be at least {} and less than or equal to {}. 40 bits is 1 TB",
            MIN_MAP_SIZE_BITS,
            MAX_MAP_SIZE_BITS
        );
    }
    Ok(())
}

fn hash_config(bits: u32, variant: u8) -> anyhow::Result<HashConfig> {
    check_bits(bits)?;
    let config = HashConfig::default()
        .with_map_size_bits(bits)
        .with_variant(Variant::try_from(variant)?);
    config.validate()?;
    Ok(config)
}

fn cmd_mine(
    config_path: Option<PathBuf>,
    overrides: MineOverrides,
    cache: CacheChoice,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => MinerConfig::load(path)?,
        None => MinerConfig::default(),
    };

    config.algorithm = overrides.algorithm;
    if let Some(bits) = overrides.bits {
        config.map_size_bits = bits;
    }
    if let Some(variant) = overrides.variant {
        config.variant = variant;
    }
    if overrides.threads.is_some() {
        config.threads = overrides.threads;
    }
    if overrides.batch.is_some() {
        config.batch_size = overrides.batch;
    }
    if let Some(secs) = overrides.report_secs {
        config.report_interval_secs = secs;
    }
    if overrides.duration_secs.is_some() {
        config.duration_secs = overrides.duration_secs;
    }
    config.json |= overrides.json;
    config.threads.get_or_insert_with(num_cpus::get);

    let hasher = match config.algorithm {
        Algorithm::Lxrhash => {
            check_bits(config.map_size_bits)?;
            let hash_config = config.hash_config()?;
            let cache = CacheChoice {
                dir: cache.dir.or_else(|| config.cache_dir.clone()),
                disabled: cache.disabled || !config.use_cache,
            };
            MiningHash::Lxr(cache.build(hash_config)?)
        }
        Algorithm::Sha256 => MiningHash::Sha256,
    };

    println!("{}", hasher.describe());
    println!(
        "Threads: {} | Batch: {}",
        config.thread_count(),
        config.effective_batch_size()
    );

    let json = config.json;
    let miner = Miner::new(config, hasher);
    miner.run(|report| {
        if json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("Error: {}", e),
            }
        } else {
            println!("{}", report.to_line());
        }
    })?;

    Ok(())
}

fn cmd_hash(text: &str, bits: u32, variant: u8, cache: &CacheChoice) -> anyhow::Result<()> {
    let lxr = cache.build(hash_config(bits, variant)?)?;
    let result = lxr.hash(text.as_bytes());

    println!("{}", hex::encode(&result));
    println!("difficulty: {:016x}", difficulty(&result));

    Ok(())
}

fn cmd_benchmark(count: u32, bits: u32, variant: u8, cache: &CacheChoice) -> anyhow::Result<()> {
    let lxr = cache.build(hash_config(bits, variant)?)?;
    let inputs: Vec<Vec<u8>> = (0..count)
        .map(|i| {
            let mut data = b"benchmark input data for LXRHash".to_vec();
            data.extend_from_slice(&i.to_le_bytes());
            data
        })
        .collect();

    println!("Running benchmark with {} hashes...", count);

    let start = Instant::now();
    for input in &inputs {
        let _ = lxr.hash(input);
    }
    let single = start.elapsed();

    let start = Instant::now();
    let _ = lxr.batch(&inputs);
    let batched = start.elapsed();

    let start = Instant::now();
    let _ = lxr.batch_parallel(&inputs);
    let parallel = start.elapsed();

    let rate = |elapsed: std::time::Duration| count as f64 / elapsed.as_secs_f64();

    println!("\nResults:");
    println!("  Single:   {:.2}s ({:.0} H/s)", single.as_secs_f64(), rate(single));
    println!("  Batch:    {:.2}s ({:.0} H/s)", batched.as_secs_f64(), rate(batched));
    println!(
        "  Parallel: {:.2}s ({:.0} H/s)",
        parallel.as_secs_f64(),
        rate(parallel)
    );

    println!("\nAlgorithm parameters:");
    println!("  Variant: {}", lxr.variant());
    println!("  Table: {} MiB", lxr.map_size() / (1024 * 1024));
    println!("  Lookups per step: {}", lxr.variant().lookups());
    println!("  Mixing passes: {}", lxr.mixing_passes());

    Ok(())
}
