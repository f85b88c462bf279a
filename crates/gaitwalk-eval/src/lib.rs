//! # gaitwalk-eval
//!
//! Multiclass classification metrics and per-fold report writers for
//! gait-disorder evaluation runs.

pub mod metrics;
pub mod report;

pub use metrics::{
    accuracy, argmax_classes, classification_report, f1_score, precision, recall, Average,
    ClassMetrics, ConfusionMatrix,
};
pub use report::{
    save_confusion_matrix, save_inference, save_metrics, InferenceDump, ReportError,
};
