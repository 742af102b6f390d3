// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean cross-entropy over the epoch's training steps
//   - val_loss:   mean cross-entropy on the frozen validation set
//   - token_acc:  fraction of real positions sorted correctly
//   - seq_acc:    fraction of sequences sorted perfectly
//
// Output file: checkpoints/metrics.csv
//
//   epoch,train_loss,val_loss,token_acc,seq_acc
//   1,1.912300,1.655100,0.402000,0.031000
//   2,1.301800,1.120400,0.598000,0.112000
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const CSV_HEADER:   &str = "epoch,train_loss,val_loss,token_acc,seq_acc";
const METRICS_FILE: &str = "metrics.csv";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Random initialisation gives ~ln(10) ≈ 2.30
    pub train_loss: f64,

    pub val_loss: f64,

    /// Range: [0.0, 1.0]
    pub token_acc: f64,

    /// Range: [0.0, 1.0] — 1.0 means every validation sequence came out sorted
    pub seq_acc: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        val_loss:   f64,
        token_acc:  f64,
        seq_acc:    f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss, token_acc, seq_acc }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet,
    /// so repeated runs append to the same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join(METRICS_FILE);

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.token_acc,
            m.seq_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3, 0.2, 0.0);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_rows_are_appended_after_header() {
        let dir = std::env::temp_dir()
            .join(format!("attention-sort-metrics-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let logger = MetricsLogger::new(&dir).unwrap();
        logger.log(&EpochMetrics::new(1, 2.0, 1.5, 0.25, 0.0)).unwrap();
        logger.log(&EpochMetrics::new(2, 1.0, 0.5, 0.75, 0.5)).unwrap();

        let text  = fs::read_to_string(dir.join(METRICS_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,2.000000,1.500000,0.250000,0.000000");
        assert_eq!(lines.len(), 3);

        // A second logger on the same directory must not rewrite the header
        let again = MetricsLogger::new(&dir).unwrap();
        again.log(&EpochMetrics::new(3, 0.5, 0.4, 0.9, 0.8)).unwrap();
        let text = fs::read_to_string(dir.join(METRICS_FILE)).unwrap();
        assert_eq!(text.lines().filter(|l| *l == CSV_HEADER).count(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
