//! Proof-of-work mining simulator
//!
//! Hashes `nonce || SHA-256("one test")` for increasing nonces and
//! reports every new best difficulty along with the hash rate.
//!
//! Workers are OS threads doing the CPU-bound hashing. They publish
//! status reports on a bounded queue with `try_send`; when the queue is
//! full the report is dropped and counted rather than blocking a worker.
//! The reporter drains the queue on a tokio runtime and adds a periodic
//! hash-rate line.

mod config;
mod metrics;

pub use config::{
    Algorithm, MinerConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_REPORT_INTERVAL_SECS, DEFAULT_V2_BATCH,
};
pub use metrics::{MinerMetrics, ReportKind, StatusReport};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info};
use sha2::{Digest, Sha256};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::algorithm::{difficulty, LxrHash};

/// Text whose SHA-256 follows the nonce in every mining input
pub const MINING_SOURCE_TEXT: &[u8] = b"one test";

/// `SHA-256(MINING_SOURCE_TEXT)`
pub fn mining_source() -> [u8; 32] {
    let mut source = [0u8; 32];
    source.copy_from_slice(&Sha256::digest(MINING_SOURCE_TEXT));
    source
}

/// Little-endian nonce bytes without trailing zeros; empty for 0
pub fn nonce_bytes(nonce: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8);
    let mut rest = nonce;
    while rest > 0 {
        bytes.push(rest as u8);
        rest >>= 8;
    }
    bytes
}

/// Mining input for `nonce`: nonce bytes then the source
pub fn mining_input(nonce: u64, source: &[u8]) -> Vec<u8> {
    let mut input = nonce_bytes(nonce);
    input.extend_from_slice(source);
    input
}

/// Hash function driven by the miner
#[derive(Debug, Clone)]
pub enum MiningHash {
    Lxr(LxrHash),
    Sha256,
}

impl MiningHash {
    /// Hash a batch of inputs, results in input order
    pub fn hash_batch(&self, inputs: &[Vec<u8>]) -> Vec<Vec<u8>> {
        match self {
            MiningHash::Lxr(lxr) if inputs.len() == 1 => vec![lxr.hash(&inputs[0])],
            MiningHash::Lxr(lxr) => lxr.batch(inputs),
            MiningHash::Sha256 => inputs
                .iter()
                .map(|input| Sha256::digest(input).to_vec())
                .collect(),
        }
    }

    /// Banner describing the hash being mined
    pub fn describe(&self) -> String {
        match self {
            MiningHash::Lxr(lxr) => format!(
                "Using LXRHash with a {} bit addressable ByteMap, variant {}",
                lxr.map_size_bits(),
                lxr.variant()
            ),
            MiningHash::Sha256 => "Using Sha256".to_string(),
        }
    }
}

/// Send a report without blocking; a full queue drops it
fn publish(tx: &mpsc::Sender<StatusReport>, report: StatusReport, metrics: &MinerMetrics) {
    if let Err(TrySendError::Full(_)) = tx.try_send(report) {
        metrics.record_dropped();
    }
}

/// Everything one worker thread needs
struct Worker {
    first_nonce: u64,
    stride: u64,
    batch_size: usize,
    hasher: Arc<MiningHash>,
    metrics: Arc<MinerMetrics>,
    tx: mpsc::Sender<StatusReport>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    /// Mine interleaved nonces `first_nonce + k * stride` until stopped
    fn run(self) {
        let source = mining_source();
        let mut nonce = self.first_nonce;
        let mut nonces = Vec::with_capacity(self.batch_size);
        let mut inputs = Vec::with_capacity(self.batch_size);

        while !self.stop.load(Ordering::Relaxed) {
            nonces.clear();
            inputs.clear();
            for _ in 0..self.batch_size {
                nonces.push(nonce);
                inputs.push(mining_input(nonce, &source));
                nonce = nonce.wrapping_add(self.stride);
            }

            let results = self.hasher.hash_batch(&inputs);
            self.metrics.record_hashes(results.len() as u64);

            for (hash, &n) in results.iter().zip(&nonces) {
                let score = difficulty(hash);
                if self.metrics.offer_best(score) {
                    publish(&self.tx, self.metrics.found(n, score), &self.metrics);
                }
            }
        }
        debug!("worker starting at nonce {} stopped", self.first_nonce);
    }
}

/// Mining simulator
pub struct Miner {
    config: MinerConfig,
    hasher: Arc<MiningHash>,
    metrics: Arc<MinerMetrics>,
}

impl Miner {
    pub fn new(config: MinerConfig, hasher: MiningHash) -> Self {
        Self {
            config,
            hasher: Arc::new(hasher),
            metrics: Arc::new(MinerMetrics::new()),
        }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MinerMetrics> {
        &self.metrics
    }

    /// Mine until Ctrl-C or the configured duration
    ///
    /// `on_report` sees every report in order, ending with the final one,
    /// which is also returned.
    pub fn run<F>(&self, mut on_report: F) -> anyhow::Result<StatusReport>
    where
        F: FnMut(&StatusReport),
    {
        let threads = self.config.thread_count();
        let batch_size = self.config.effective_batch_size();
        info!(
            "{}; {} threads, {} inputs per batch",
            self.hasher.describe(),
            threads,
            batch_size
        );

        // Workers start only once the reporter runtime exists
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let stop = Arc::new(AtomicBool::new(false));

        let handles: Vec<JoinHandle<()>> = (0..threads)
            .map(|thread_id| {
                let worker = Worker {
                    first_nonce: thread_id as u64,
                    stride: threads as u64,
                    batch_size,
                    hasher: Arc::clone(&self.hasher),
                    metrics: Arc::clone(&self.metrics),
                    tx: tx.clone(),
                    stop: Arc::clone(&stop),
                };
                std::thread::spawn(move || worker.run())
            })
            .collect();
        drop(tx);

        let reported = runtime.block_on(self.report(rx, &mut on_report));

        stop.store(true, Ordering::SeqCst);
        for handle in handles {
            if handle.join().is_err() {
                anyhow::bail!("mining worker panicked");
            }
        }
        reported?;

        let summary = self.metrics.snapshot(ReportKind::Final);
        on_report(&summary);
        Ok(summary)
    }

    async fn report<F>(
        &self,
        mut rx: mpsc::Receiver<StatusReport>,
        on_report: &mut F,
    ) -> anyhow::Result<()>
    where
        F: FnMut(&StatusReport),
    {
        let period = Duration::from_secs(self.config.report_interval_secs.max(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        let duration = self.config.duration_secs.map(Duration::from_secs);
        let deadline = async move {
            match duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        loop {
            tokio::select! {
                Some(report) = rx.recv() => on_report(&report),
                _ = ticker.tick() => on_report(&self.metrics.snapshot(ReportKind::Rate)),
                _ = &mut deadline => {
                    info!("mining duration reached");
                    break;
                }
                result = &mut interrupted => {
                    result?;
                    info!("interrupted");
                    break;
                }
            }
        }

        // Reports already queued still reach the caller
        while let Ok(report) = rx.try_recv() {
            on_report(&report);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{HashConfig, Variant};

    #[test]
    fn test_nonce_bytes() {
        assert!(nonce_bytes(0).is_empty());
        assert_eq!(nonce_bytes(1), vec![1]);
        assert_eq!(nonce_bytes(0xFF), vec![0xFF]);
        assert_eq!(nonce_bytes(0x100), vec![0x00, 0x01]);
        assert_eq!(nonce_bytes(0x0102_0304), vec![4, 3, 2, 1]);
        assert_eq!(nonce_bytes(u64::MAX).len(), 8);
    }

    #[test]
    fn test_mining_input() {
        let source = mining_source();
        assert_eq!(source.as_slice(), Sha256::digest(b"one test").as_slice());

        let input = mining_input(0x0201, &source);
        assert_eq!(&input[..2], &[0x01, 0x02]);
        assert_eq!(&input[2..], &source);
        assert_eq!(mining_input(0, &source), source.to_vec());
    }

    #[test]
    fn test_hash_batch_matches_single() {
        let config = HashConfig::default()
            .with_map_size_bits(10)
            .with_variant(Variant::V2);
        let lxr = LxrHash::new(config).unwrap();
        let hasher = MiningHash::Lxr(lxr.clone());

        let source = mining_source();
        let inputs: Vec<Vec<u8>> = (0..10).map(|n| mining_input(n, &source)).collect();
        let results = hasher.hash_batch(&inputs);
        for (input, result) in inputs.iter().zip(&results) {
            assert_eq!(result, &lxr.hash(input));
        }

        let sha = MiningHash::Sha256.hash_batch(&inputs[..1]);
        assert_eq!(sha[0], Sha256::digest(&inputs[0]).to_vec());
    }

    #[test]
    fn test_full_queue_drops_reports() {
        let metrics = MinerMetrics::new();
        let (tx, mut rx) = mpsc::channel(2);

        for nonce in 0..5 {
            publish(&tx, metrics.found(nonce, nonce), &metrics);
        }

        assert_eq!(metrics.dropped(), 3);
        assert_eq!(rx.try_recv().unwrap().nonce, Some(0));
        assert_eq!(rx.try_recv().unwrap().nonce, Some(1));
        assert!(rx.try_recv().is_err());
    }

    fn short_run(hasher: MiningHash, variant: u8) -> (Vec<StatusReport>, StatusReport) {
        let config = MinerConfig {
            algorithm: match hasher {
                MiningHash::Lxr(_) => Algorithm::Lxrhash,
                MiningHash::Sha256 => Algorithm::Sha256,
            },
            variant,
            threads: Some(2),
            batch_size: Some(8),
            duration_secs: Some(1),
            ..MinerConfig::default()
        };
        let miner = Miner::new(config, hasher);

        let mut seen = Vec::new();
        let summary = miner.run(|report| seen.push(report.clone())).unwrap();
        (seen, summary)
    }

    #[test]
    fn test_sha256_mining_run() {
        let (seen, summary) = short_run(MiningHash::Sha256, 1);

        assert_eq!(summary.kind, ReportKind::Final);
        assert!(summary.total > 0);
        assert!(summary.best > 0);
        assert_eq!(seen.last(), Some(&summary));

        let found: Vec<u64> = seen
            .iter()
            .filter(|r| r.kind == ReportKind::Found)
            .map(|r| r.best)
            .collect();
        assert!(!found.is_empty());
        assert!(found.iter().all(|&best| best <= summary.best));
    }

    #[test]
    fn test_no_worker_outlives_run() {
        let config = MinerConfig {
            algorithm: Algorithm::Sha256,
            threads: Some(2),
            batch_size: Some(4),
            duration_secs: Some(1),
            ..MinerConfig::default()
        };
        let miner = Miner::new(config, MiningHash::Sha256);

        let summary = miner.run(|_| {}).unwrap();
        let after_run = miner.metrics().total();
        assert_eq!(after_run, summary.total);

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(miner.metrics().total(), after_run);
    }

    #[test]
    fn test_lxrhash_mining_run() {
        let config = HashConfig::default()
            .with_map_size_bits(10)
            .with_variant(Variant::V2);
        let lxr = LxrHash::new(config).unwrap();

        let (seen, summary) = short_run(MiningHash::Lxr(lxr), 2);
        assert!(summary.total >= 8);
        assert!(seen.iter().any(|r| r.kind == ReportKind::Found));
    }
}
