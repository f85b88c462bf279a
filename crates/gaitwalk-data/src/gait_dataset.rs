// Gait-cycle-indexed dataset
//
// One sample per patient: the source video is decoded once, each gait
// cycle is sliced out of the frame stack, pushed through the mapping
// pipeline, and the cycles are stacked into a [G, C, T, H, W] tensor.
// G varies per patient; the gait collator flattens it away later.

use std::path::Path;
use std::sync::Arc;

use gaitwalk_core::{bail, Error, Result, Tensor};
use tracing::debug;

use crate::dataset::{Dataset, Sample};
use crate::manifest::GaitManifest;
use crate::transform::{mapping_pipeline, uniform_indices, Compose, Transform};
use crate::video::VideoDecoder;

/// Dataset over a gait-cycle manifest.
pub struct GaitCycleDataset {
    manifest: GaitManifest,
    decoder: Arc<dyn VideoDecoder>,
    transform: Compose,
    /// Frames every cycle is aligned to before stacking.
    num_samples: usize,
    /// In temporal-mix mode the pipeline skips subsampling and the
    /// alignment below is the only temporal resampling step.
    temporal_mix: bool,
    dataset_name: String,
}

impl GaitCycleDataset {
    /// Build a dataset from an already-loaded manifest.
    pub fn new(
        manifest: GaitManifest,
        decoder: Arc<dyn VideoDecoder>,
        img_size: usize,
        num_samples: usize,
        temporal_mix: bool,
        name: impl Into<String>,
    ) -> Self {
        let transform = mapping_pipeline(img_size, num_samples, temporal_mix);
        Self {
            manifest,
            decoder,
            transform,
            num_samples,
            temporal_mix,
            dataset_name: name.into(),
        }
    }

    /// Load the manifest from disk and build the dataset.
    pub fn load(
        manifest_path: impl AsRef<Path>,
        decoder: Arc<dyn VideoDecoder>,
        img_size: usize,
        num_samples: usize,
        temporal_mix: bool,
        name: impl Into<String>,
    ) -> Result<Self> {
        let manifest = GaitManifest::load(manifest_path).map_err(|e| Error::msg(e.to_string()))?;
        Ok(Self::new(
            manifest,
            decoder,
            img_size,
            num_samples,
            temporal_mix,
            name,
        ))
    }

    /// Align a transformed cycle to `num_samples` frames.  Only needed in
    /// temporal-mix mode; the normal mapping pipeline already subsamples.
    fn align_cycle(&self, cycle: Tensor) -> Result<Tensor> {
        if !self.temporal_mix {
            return Ok(cycle);
        }
        let t = cycle.dims()[1];
        if t == self.num_samples {
            return Ok(cycle);
        }
        cycle.index_select(1, &uniform_indices(t, self.num_samples))
    }
}

impl Dataset for GaitCycleDataset {
    fn len(&self) -> usize {
        self.manifest.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let rec = &self.manifest.records()[index];
        let video = self.decoder.decode(&rec.video)?;
        let total = video.frame_count();

        let mut cycles: Vec<Tensor> = Vec::with_capacity(rec.cycle_count());
        for (start, end) in rec.cycle_bounds() {
            if end > total {
                bail!(
                    "patient {}: gait cycle [{start}, {end}) exceeds video length {total}",
                    rec.patient_id
                );
            }
            let frame_ix: Vec<usize> = (start..end).collect();
            let clip = video.frames.index_select(1, &frame_ix)?;
            let clip = self.transform.apply(clip)?;
            cycles.push(self.align_cycle(clip)?);
        }

        let refs: Vec<&Tensor> = cycles.iter().collect();
        let stacked = Tensor::stack(&refs)?;
        debug!(
            patient = %rec.patient_id,
            cycles = cycles.len(),
            "assembled gait-cycle sample"
        );

        Ok(Sample {
            video: stacked,
            disease: rec.disease.clone(),
            patient_id: rec.patient_id.clone(),
            path: rec.video.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.dataset_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::GaitManifest;
    use crate::video::SyntheticDecoder;

    fn manifest() -> GaitManifest {
        GaitManifest::from_str(
            r#"[
              {"patient_id": "p1", "video": "a.mp4", "disease": "ASD",
               "gait_cycle_index": [0, 12, 20, 40]},
              {"patient_id": "p2", "video": "b.mp4", "disease": "DHS",
               "gait_cycle_index": [0, 30]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn gait_sample_shape_and_metadata() {
        let ds = GaitCycleDataset::new(
            manifest(),
            Arc::new(SyntheticDecoder::new(60, 8, 8)),
            4,
            8,
            false,
            "train-gait",
        );
        assert_eq!(ds.len(), 2);

        let s = ds.get(0).unwrap();
        assert_eq!(s.video.dims(), &[3, 3, 8, 4, 4]); // 3 cycles
        assert_eq!(s.cycle_count(), 3);
        assert_eq!(s.disease, "ASD");
        assert_eq!(s.patient_id, "p1");

        let s2 = ds.get(1).unwrap();
        assert_eq!(s2.video.dims(), &[1, 3, 8, 4, 4]);
    }

    #[test]
    fn temporal_mix_aligns_variable_cycles() {
        // Cycles of 12, 8 and 20 frames must still stack to a fixed T.
        let ds = GaitCycleDataset::new(
            manifest(),
            Arc::new(SyntheticDecoder::new(60, 8, 8)),
            4,
            8,
            true,
            "train-gait",
        );
        let s = ds.get(0).unwrap();
        assert_eq!(s.video.dims(), &[3, 3, 8, 4, 4]);
    }

    #[test]
    fn out_of_range_cycle_names_patient() {
        // Video only has 20 frames but p1's last boundary is 40.
        let ds = GaitCycleDataset::new(
            manifest(),
            Arc::new(SyntheticDecoder::new(20, 8, 8)),
            4,
            8,
            false,
            "train-gait",
        );
        let err = ds.get(0).unwrap_err();
        assert!(err.to_string().contains("p1"));
    }
}
