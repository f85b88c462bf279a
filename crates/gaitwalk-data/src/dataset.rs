// Dataset trait — unified interface for any video source

use std::path::PathBuf;

use gaitwalk_core::{Result, Tensor};

/// A single unit produced by a dataset source.
///
/// Gait-cycle sources yield a rank-5 video `[G, C, T, H, W]` where G is the
/// number of gait cycles extracted for that patient (variable, >= 1).
/// Whole-video sources yield a rank-4 clip `[C, T, H, W]`.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Video tensor, already transformed; see layout note above.
    pub video: Tensor,
    /// Disease name as it appears in the manifest / folder structure.
    pub disease: String,
    /// Patient identifier, carried for traceability and error messages.
    pub patient_id: String,
    /// Source video file.
    pub path: PathBuf,
}

impl Sample {
    /// Number of gait cycles in this sample (1 for a rank-4 clip).
    pub fn cycle_count(&self) -> usize {
        if self.video.rank() == 5 {
            self.video.dims()[0]
        } else {
            1
        }
    }
}

/// A dataset is an indexed collection of samples.
///
/// Implementations must be `Send + Sync` so the loader can fetch from
/// worker threads.  `get` returns `Result` because fetching involves video
/// decoding; a decode failure is fatal for that sample and propagates
/// (there is no skip-and-continue).
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve (decode + transform) the sample at position `index`.
    fn get(&self, index: usize) -> Result<Sample>;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}
