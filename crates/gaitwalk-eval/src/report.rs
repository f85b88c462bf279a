//! Per-fold result writers.
//!
//! Cross-validation runs persist three artifacts per fold under a shared
//! output directory:
//!   - `best_preds/fold{fold}_predictions.json` — the raw prediction and
//!     label vectors, for later re-scoring
//!   - `metrics.txt` — an appended block of summary metrics per fold
//!   - `CM/fold{fold}_confusion_matrix.txt` — the row-normalized confusion
//!     matrix as percentages, with disease axis labels
//!
//! Directories are created as needed.  Heatmap rendering is out of scope;
//! the confusion matrix is written as a plain text table.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::{accuracy, f1_score, precision, recall, Average, ConfusionMatrix};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize predictions: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, ReportError>;

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The prediction dump for one fold.
#[derive(Debug, Serialize, Deserialize)]
pub struct InferenceDump {
    pub fold: usize,
    pub predictions: Vec<usize>,
    pub labels: Vec<usize>,
}

/// Save the raw predictions and labels for one fold as JSON under
/// `<save_path>/best_preds/`.
pub fn save_inference(
    predictions: &[usize],
    labels: &[usize],
    fold: usize,
    save_path: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dir = save_path.as_ref().join("best_preds");
    fs::create_dir_all(&dir).map_err(io_err(&dir))?;

    let path = dir.join(format!("fold{fold}_predictions.json"));
    let dump = InferenceDump {
        fold,
        predictions: predictions.to_vec(),
        labels: labels.to_vec(),
    };
    let json = serde_json::to_string_pretty(&dump)?;
    fs::write(&path, json).map_err(io_err(&path))?;

    info!(path = %path.display(), fold, "saved inference dump");
    Ok(path)
}

/// Append one fold's summary metrics to `<save_path>/metrics.txt`.
pub fn save_metrics(
    predictions: &[usize],
    labels: &[usize],
    fold: usize,
    save_path: impl AsRef<Path>,
    n_classes: usize,
) -> Result<PathBuf> {
    let path = save_path.as_ref().join("metrics.txt");
    let cm = ConfusionMatrix::from_predictions(predictions, labels, n_classes);

    let mut block = String::new();
    let _ = writeln!(block, "Fold {fold}");
    let _ = writeln!(block, "accuracy: {:.4}", accuracy(predictions, labels));
    let _ = writeln!(
        block,
        "precision: {:.4}",
        precision(predictions, labels, n_classes, Average::Macro)
    );
    let _ = writeln!(
        block,
        "recall: {:.4}",
        recall(predictions, labels, n_classes, Average::Macro)
    );
    let _ = writeln!(
        block,
        "f1_score: {:.4}",
        f1_score(predictions, labels, n_classes, Average::Macro)
    );
    let _ = writeln!(block, "confusion_matrix:\n{}", cm.to_string_table());
    let _ = writeln!(block, "{}", "#".repeat(100));

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err(&path))?;
    file.write_all(block.as_bytes()).map_err(io_err(&path))?;

    info!(path = %path.display(), fold, "appended fold metrics");
    Ok(path)
}

/// Write one fold's row-normalized confusion matrix, in percent, to
/// `<save_path>/CM/fold{fold}_confusion_matrix.txt`.
///
/// `axis_labels` names the classes in index order, e.g.
/// `["ASD", "DHS", "LCS_HipOA"]`.
pub fn save_confusion_matrix(
    predictions: &[usize],
    labels: &[usize],
    fold: usize,
    save_path: impl AsRef<Path>,
    axis_labels: &[&str],
) -> Result<PathBuf> {
    let dir = save_path.as_ref().join("CM");
    fs::create_dir_all(&dir).map_err(io_err(&dir))?;
    let path = dir.join(format!("fold{fold}_confusion_matrix.txt"));

    let n_classes = axis_labels.len();
    let cm = ConfusionMatrix::from_predictions(predictions, labels, n_classes);
    let percent = cm.row_normalized();

    let width = axis_labels.iter().map(|l| l.len()).max().unwrap_or(0).max(8) + 2;
    let mut table = String::new();
    let _ = writeln!(table, "Fold {fold} (%)");
    let _ = write!(table, "{:>width$}", "");
    for label in axis_labels {
        let _ = write!(table, "{label:>width$}");
    }
    let _ = writeln!(table);
    for (r, label) in axis_labels.iter().enumerate() {
        let _ = write!(table, "{label:>width$}");
        for c in 0..n_classes {
            let _ = write!(table, "{:>width$.2}", percent[r][c] * 100.0);
        }
        let _ = writeln!(table);
    }

    fs::write(&path, table).map_err(io_err(&path))?;

    info!(path = %path.display(), fold, "saved confusion matrix");
    Ok(path)
}
