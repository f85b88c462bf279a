// Classification Metrics
//
// accuracy, precision, recall, f1_score, confusion_matrix
//
// All functions operate on class-index slices, following sklearn
// conventions:
//   - predictions = class indices (argmax of logits)
//   - targets = true class indices
//
// Multi-class averaging: macro (default), micro, weighted.

// Averaging strategy

/// How to average per-class metrics for multi-class problems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Average {
    /// Compute metric per class, then take unweighted mean.
    Macro,
    /// Compute globally: total TP / (total TP + total FP/FN).
    Micro,
    /// Per-class metric weighted by class support (number of true instances).
    Weighted,
}

// Confusion matrix

/// NxN confusion matrix. Entry [i][j] = count of samples with true class i
/// predicted as class j.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    pub matrix: Vec<Vec<u64>>,
    pub n_classes: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from predicted and true class indices.
    pub fn from_predictions(predictions: &[usize], targets: &[usize], n_classes: usize) -> Self {
        let mut matrix = vec![vec![0u64; n_classes]; n_classes];
        for (&pred, &target) in predictions.iter().zip(targets.iter()) {
            if target < n_classes && pred < n_classes {
                matrix[target][pred] += 1;
            }
        }
        ConfusionMatrix { matrix, n_classes }
    }

    /// True positives for class c.
    pub fn tp(&self, c: usize) -> u64 {
        self.matrix[c][c]
    }

    /// False positives for class c (predicted c but was not c).
    pub fn fp(&self, c: usize) -> u64 {
        (0..self.n_classes)
            .map(|r| if r != c { self.matrix[r][c] } else { 0 })
            .sum()
    }

    /// False negatives for class c (was c but predicted other).
    pub fn fn_(&self, c: usize) -> u64 {
        (0..self.n_classes)
            .map(|col| if col != c { self.matrix[c][col] } else { 0 })
            .sum()
    }

    /// Support (number of true instances) for class c.
    pub fn support(&self, c: usize) -> u64 {
        self.matrix[c].iter().sum()
    }

    /// Total number of samples.
    pub fn total(&self) -> u64 {
        self.matrix.iter().flat_map(|r| r.iter()).sum()
    }

    /// Precision for class c: TP / (TP + FP), 0 when undefined.
    pub fn precision_for(&self, c: usize) -> f64 {
        ratio(self.tp(c), self.tp(c) + self.fp(c))
    }

    /// Recall for class c: TP / (TP + FN), 0 when undefined.
    pub fn recall_for(&self, c: usize) -> f64 {
        ratio(self.tp(c), self.tp(c) + self.fn_(c))
    }

    /// Row-normalized matrix: entry [i][j] = fraction of true-class-i
    /// samples predicted as class j.  Rows with no support are all zero.
    pub fn row_normalized(&self) -> Vec<Vec<f64>> {
        self.matrix
            .iter()
            .map(|row| {
                let support: u64 = row.iter().sum();
                row.iter().map(|&v| ratio(v, support)).collect()
            })
            .collect()
    }

    /// Pretty-print the raw counts.
    pub fn to_string_table(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("{:>8}", ""));
        for c in 0..self.n_classes {
            s.push_str(&format!("{:>8}", format!("Pred {c}")));
        }
        s.push('\n');
        for r in 0..self.n_classes {
            s.push_str(&format!("{:>8}", format!("True {r}")));
            for c in 0..self.n_classes {
                s.push_str(&format!("{:>8}", self.matrix[r][c]));
            }
            s.push('\n');
        }
        s
    }
}

fn ratio(num: u64, denom: u64) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

// Classification metrics (from class indices)

/// Classification accuracy: fraction of correct predictions.
pub fn accuracy(predictions: &[usize], targets: &[usize]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(targets.iter())
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / predictions.len() as f64
}

fn average_per_class(cm: &ConfusionMatrix, avg: Average, per_class: impl Fn(usize) -> f64) -> f64 {
    let n = cm.n_classes;
    match avg {
        Average::Macro => (0..n).map(&per_class).sum::<f64>() / n as f64,
        Average::Weighted => {
            let total = cm.total();
            (0..n)
                .map(|c| per_class(c) * ratio(cm.support(c), total))
                .sum()
        }
        // Micro is handled by the callers: with a single label per sample,
        // total TP over total TP+FP (or TP+FN) collapses to accuracy.
        Average::Micro => {
            let total_tp: u64 = (0..n).map(|c| cm.tp(c)).sum();
            ratio(total_tp, cm.total())
        }
    }
}

/// Precision for multi-class classification.
///
/// Precision = TP / (TP + FP) — how many selected items are relevant.
pub fn precision(predictions: &[usize], targets: &[usize], n_classes: usize, avg: Average) -> f64 {
    let cm = ConfusionMatrix::from_predictions(predictions, targets, n_classes);
    average_per_class(&cm, avg, |c| cm.precision_for(c))
}

/// Recall for multi-class classification.
///
/// Recall = TP / (TP + FN) — how many relevant items are selected.
pub fn recall(predictions: &[usize], targets: &[usize], n_classes: usize, avg: Average) -> f64 {
    let cm = ConfusionMatrix::from_predictions(predictions, targets, n_classes);
    average_per_class(&cm, avg, |c| cm.recall_for(c))
}

/// F1 Score: harmonic mean of precision and recall.
pub fn f1_score(predictions: &[usize], targets: &[usize], n_classes: usize, avg: Average) -> f64 {
    let p = precision(predictions, targets, n_classes, avg);
    let r = recall(predictions, targets, n_classes, avg);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Per-class metric report entry.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    pub class: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Per-class precision, recall, F1, and support — like sklearn's
/// classification_report.
pub fn classification_report(
    predictions: &[usize],
    targets: &[usize],
    n_classes: usize,
) -> Vec<ClassMetrics> {
    let cm = ConfusionMatrix::from_predictions(predictions, targets, n_classes);
    (0..n_classes)
        .map(|c| {
            let prec = cm.precision_for(c);
            let rec = cm.recall_for(c);
            let f1 = if prec + rec == 0.0 {
                0.0
            } else {
                2.0 * prec * rec / (prec + rec)
            };
            ClassMetrics {
                class: c,
                precision: prec,
                recall: rec,
                f1,
                support: cm.support(c),
            }
        })
        .collect()
}

/// Argmax along the last axis of a flat `[n_samples, n_classes]` score
/// array, returning predicted class indices.
pub fn argmax_classes(scores: &[f32], n_classes: usize) -> Vec<usize> {
    scores
        .chunks(n_classes)
        .map(|row| {
            row.iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(idx, _)| idx)
                .unwrap_or(0)
        })
        .collect()
}

// Tests
