//! Mining counters and status reports

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Counters shared by the workers and the reporter
///
/// Owned by the miner and handed out by `Arc`; nothing here is global.
#[derive(Debug)]
pub struct MinerMetrics {
    total: AtomicU64,
    best: AtomicU64,
    dropped: AtomicU64,
    started: Instant,
}

impl Default for MinerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MinerMetrics {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            best: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Add finished hashes, returning the new total
    pub fn record_hashes(&self, count: u64) -> u64 {
        self.total.fetch_add(count, Ordering::Relaxed) + count
    }

    /// Raise the best difficulty; true if `candidate` is a new best
    pub fn offer_best(&self, candidate: u64) -> bool {
        self.best.fetch_max(candidate, Ordering::Relaxed) < candidate
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn best(&self) -> u64 {
        self.best.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn hash_rate(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Report for a newly found best hash
    pub fn found(&self, nonce: u64, difficulty: u64) -> StatusReport {
        StatusReport {
            nonce: Some(nonce),
            best: difficulty,
            ..self.snapshot(ReportKind::Found)
        }
    }

    /// Report of the current counters
    pub fn snapshot(&self, kind: ReportKind) -> StatusReport {
        StatusReport {
            kind,
            total: self.total(),
            best: self.best(),
            nonce: None,
            hashes_per_second: self.hash_rate(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            dropped: self.dropped(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// A hash beat the best difficulty so far
    Found,
    /// Periodic hash rate
    Rate,
    /// Summary when mining stops
    Final,
}

/// One status line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub kind: ReportKind,
    pub total: u64,
    pub best: u64,
    pub nonce: Option<u64>,
    pub hashes_per_second: f64,
    pub elapsed_secs: f64,
    pub dropped: u64,
}

impl StatusReport {
    /// Column format: total, best difficulty, nonce, hash rate
    pub fn to_line(&self) -> String {
        match (self.kind, self.nonce) {
            (ReportKind::Found, Some(nonce)) => format!(
                "{:>10} {:>16x} {:>8x} {:>10.0} hps",
                self.total, self.best, nonce, self.hashes_per_second
            ),
            (ReportKind::Final, _) => format!(
                "{:>10} {:>16x} {:>8} {:>10.0} hps (final, {} reports dropped)",
                self.total, self.best, "", self.hashes_per_second, self.dropped
            ),
            _ => format!(
                "{:>10} {:>16} {:>8} {:>10.0} hps",
                self.total, "", "", self.hashes_per_second
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = MinerMetrics::new();
        assert_eq!(metrics.record_hashes(256), 256);
        assert_eq!(metrics.record_hashes(1), 257);
        assert_eq!(metrics.total(), 257);

        metrics.record_dropped();
        metrics.record_dropped();
        assert_eq!(metrics.dropped(), 2);
    }

    #[test]
    fn test_offer_best_only_accepts_improvements() {
        let metrics = MinerMetrics::new();
        assert!(metrics.offer_best(10));
        assert!(!metrics.offer_best(10));
        assert!(!metrics.offer_best(3));
        assert!(metrics.offer_best(0xFFFF_0000_0000_0000));
        assert_eq!(metrics.best(), 0xFFFF_0000_0000_0000);
    }

    #[test]
    fn test_found_report() {
        let metrics = MinerMetrics::new();
        metrics.record_hashes(42);
        metrics.offer_best(0xABCD);

        let report = metrics.found(0x1F, 0xABCD);
        assert_eq!(report.kind, ReportKind::Found);
        assert_eq!(report.total, 42);
        assert_eq!(report.nonce, Some(0x1F));

        let line = report.to_line();
        assert!(line.starts_with("        42 "), "{line}");
        assert!(line.contains("abcd"));
        assert!(line.contains("      1f"));
        assert!(line.ends_with(" hps"));
    }

    #[test]
    fn test_report_json() {
        let metrics = MinerMetrics::new();
        let report = metrics.snapshot(ReportKind::Rate);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""kind":"rate""#));
        assert!(json.contains(r#""nonce":null"#));

        let back: StatusReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, ReportKind::Rate);
    }
}
