// ============================================================
// Layer 6 — Metrics
// ============================================================
// Correlation metrics between predicted and human scores, and a
// CSV logger that records one row per (configuration, fold, epoch).
//
// Metrics recorded per epoch:
//   - train_loss:  mean summed-squared-error per training batch
//   - val_loss:    mean summed-squared-error per validation batch
//   - pearson:     Pearson r of predictions vs. human scores
//   - covariance:  sample covariance of predictions vs. human scores
//
// Output file: <run dir>/metrics.csv
//
//   config,fold,epoch,train_loss,val_loss,pearson,covariance
//   batch_size=64,0,1,12.402100,11.870300,0.081200,0.004100
//   ...
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// Sample covariance (n − 1 denominator). Zero for fewer than two pairs.
pub fn covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mx = mean(&xs[..n]);
    let my = mean(&ys[..n]);
    xs.iter()
        .zip(ys)
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Pearson correlation. Zero when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let sx = covariance(xs, xs).sqrt();
    let sy = covariance(ys, ys).sqrt();
    if sx == 0.0 || sy == 0.0 {
        return 0.0;
    }
    covariance(xs, ys) / (sx * sy)
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// One row of metrics for one epoch of one fold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub fold:       usize,
    /// Starts at 1
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
    pub pearson:    f64,
    pub covariance: f64,
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "config,fold,epoch,train_loss,val_loss,pearson,covariance")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one row. `config` labels the grid point; commas in it are
    /// replaced so the row keeps seven columns.
    pub fn log(&self, config: &str, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{},{},{:.6},{:.6},{:.6},{:.6}",
            config.replace(',', ";"),
            m.fold,
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.pearson,
            m.covariance,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
