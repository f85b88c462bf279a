// Gait-cycle manifest — per-patient JSON records
//
// A manifest is a JSON array of patient records:
//
//   [
//     {
//       "patient_id": "p014",
//       "video": "videos/p014_walk.mp4",
//       "disease": "ASD",
//       "gait_cycle_index": [0, 31, 63, 92]
//     },
//     ...
//   ]
//
// `gait_cycle_index` lists frame boundaries: cycle g spans
// [index[g], index[g+1]), so a record with N boundaries carries N-1 cycles.
// Manifest order is load-bearing: a loader without shuffling yields samples
// in exactly this order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Error type for manifest loading.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("manifest is empty")]
    Empty,
    #[error("patient {patient_id}: gait_cycle_index needs at least 2 boundaries, got {got}")]
    TooFewBoundaries { patient_id: String, got: usize },
    #[error("patient {patient_id}: gait_cycle_index must be strictly increasing")]
    UnorderedBoundaries { patient_id: String },
}

/// One patient's entry in a gait-cycle manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub video: PathBuf,
    pub disease: String,
    pub gait_cycle_index: Vec<usize>,
}

impl PatientRecord {
    /// Number of gait cycles this record describes.
    pub fn cycle_count(&self) -> usize {
        self.gait_cycle_index.len().saturating_sub(1)
    }

    /// The (start, end) frame bounds of each cycle, in order.
    pub fn cycle_bounds(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.gait_cycle_index
            .windows(2)
            .map(|p| (p[0], p[1]))
    }
}

/// A validated, ordered gait-cycle manifest.
#[derive(Debug, Clone)]
pub struct GaitManifest {
    records: Vec<PatientRecord>,
}

impl GaitManifest {
    /// Load and validate a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_str(&content)?;
        info!(
            manifest = %path.display(),
            patients = manifest.len(),
            "loaded gait-cycle manifest"
        );
        Ok(manifest)
    }

    /// Parse and validate a manifest from an in-memory string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        let records: Vec<PatientRecord> = serde_json::from_str(content)?;
        if records.is_empty() {
            return Err(ManifestError::Empty);
        }
        for rec in &records {
            if rec.gait_cycle_index.len() < 2 {
                return Err(ManifestError::TooFewBoundaries {
                    patient_id: rec.patient_id.clone(),
                    got: rec.gait_cycle_index.len(),
                });
            }
            if rec.gait_cycle_index.windows(2).any(|p| p[0] >= p[1]) {
                return Err(ManifestError::UnorderedBoundaries {
                    patient_id: rec.patient_id.clone(),
                });
            }
        }
        Ok(GaitManifest { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The patient records in manifest order.
    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"[
      {"patient_id": "p1", "video": "a.mp4", "disease": "ASD",
       "gait_cycle_index": [0, 10, 25]},
      {"patient_id": "p2", "video": "b.mp4", "disease": "DHS",
       "gait_cycle_index": [5, 30]}
    ]"#;

    #[test]
    fn parse_and_cycle_bounds() {
        let m = GaitManifest::from_str(MANIFEST).unwrap();
        assert_eq!(m.len(), 2);
        let p1 = &m.records()[0];
        assert_eq!(p1.cycle_count(), 2);
        let bounds: Vec<_> = p1.cycle_bounds().collect();
        assert_eq!(bounds, vec![(0, 10), (10, 25)]);
        assert_eq!(m.records()[1].cycle_count(), 1);
    }

    #[test]
    fn empty_manifest_rejected() {
        assert!(matches!(
            GaitManifest::from_str("[]"),
            Err(ManifestError::Empty)
        ));
    }

    #[test]
    fn too_few_boundaries_rejected() {
        let bad = r#"[{"patient_id": "p1", "video": "a.mp4", "disease": "ASD",
                       "gait_cycle_index": [3]}]"#;
        assert!(matches!(
            GaitManifest::from_str(bad),
            Err(ManifestError::TooFewBoundaries { got: 1, .. })
        ));
    }

    #[test]
    fn unordered_boundaries_rejected() {
        let bad = r#"[{"patient_id": "p1", "video": "a.mp4", "disease": "ASD",
                       "gait_cycle_index": [0, 10, 10]}]"#;
        assert!(matches!(
            GaitManifest::from_str(bad),
            Err(ManifestError::UnorderedBoundaries { .. })
        ));
    }
}
