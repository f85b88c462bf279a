// Frame transforms — fixed per-clip preprocessing pipeline
//
// All transforms take and return clips in [C, T, H, W] layout and are pure:
// no RNG, no shared state, freely duplicable across workers.
//
// Three pipeline variants are in use, and their internal ORDER matters for
// determinism (resize-before-subsample vs. subsample-before-resize changes
// which source frames are selected when frame counts differ):
//
//   mapping (gait cycles):       [subsample, div255, resize]
//   mapping (temporal mix):      [div255, resize]           — no subsample
//   video (whole-video sources): [div255, resize, subsample]

use gaitwalk_core::{Error, Result, Tensor};

/// A transform applied to a single clip before batching.
pub trait Transform: Send + Sync {
    /// Apply the transform, returning the modified clip.
    fn apply(&self, clip: Tensor) -> Result<Tensor>;
}

/// Equispaced index selection over `[0, t)`, `linspace(0, t-1, num)`
/// truncated to integers.
///
/// - `t == num`: identity indices `0..t`
/// - `t < num`: nearest-neighbor replication (a 1-frame input yields
///   `num` copies of frame 0)
/// - `t > num`: evenly spread selection across the full span
pub fn uniform_indices(t: usize, num: usize) -> Vec<usize> {
    if num == 0 || t == 0 {
        return Vec::new();
    }
    if num == 1 {
        return vec![0];
    }
    (0..num)
        .map(|i| ((i as f64) * ((t - 1) as f64) / ((num - 1) as f64)) as usize)
        .collect()
}

// Div255

/// Scale pixel values from [0, 255] to [0, 1].
#[derive(Debug, Clone)]
pub struct Div255;

impl Transform for Div255 {
    fn apply(&self, clip: Tensor) -> Result<Tensor> {
        Ok(clip.scale(1.0 / 255.0))
    }
}

// Resize

/// Bilinear spatial resize to a fixed square `(size, size)`.
#[derive(Debug, Clone)]
pub struct Resize {
    pub size: usize,
}

impl Resize {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Transform for Resize {
    fn apply(&self, clip: Tensor) -> Result<Tensor> {
        let dims = clip.dims();
        if dims.len() != 4 {
            return Err(Error::RankMismatch {
                expected: 4,
                got: dims.len(),
            });
        }
        let (c, t, h, w) = (dims[0], dims[1], dims[2], dims[3]);
        if h == self.size && w == self.size {
            return Ok(clip);
        }

        let out_hw = self.size * self.size;
        let src = clip.data();
        let mut out = vec![0.0f32; c * t * out_hw];

        let scale_y = h as f32 / self.size as f32;
        let scale_x = w as f32 / self.size as f32;

        for plane in 0..c * t {
            let src_plane = &src[plane * h * w..(plane + 1) * h * w];
            let dst_plane = &mut out[plane * out_hw..(plane + 1) * out_hw];
            for oy in 0..self.size {
                // Half-pixel centers, clamped to the source extent.
                let sy = ((oy as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (h - 1) as f32);
                let y0 = sy.floor() as usize;
                let y1 = (y0 + 1).min(h - 1);
                let fy = sy - y0 as f32;
                for ox in 0..self.size {
                    let sx = ((ox as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (w - 1) as f32);
                    let x0 = sx.floor() as usize;
                    let x1 = (x0 + 1).min(w - 1);
                    let fx = sx - x0 as f32;

                    let top = src_plane[y0 * w + x0] * (1.0 - fx) + src_plane[y0 * w + x1] * fx;
                    let bottom = src_plane[y1 * w + x0] * (1.0 - fx) + src_plane[y1 * w + x1] * fx;
                    dst_plane[oy * self.size + ox] = top * (1.0 - fy) + bottom * fy;
                }
            }
        }

        Tensor::from_vec(out, (c, t, self.size, self.size))
    }
}

// UniformTemporalSubsample

/// Resample the temporal dimension to exactly `num_samples` frames.
///
/// Selection is deterministic equispaced sampling (see [`uniform_indices`]);
/// shorter inputs are upsampled by nearest-neighbor index replication, and
/// an input that already has `num_samples` frames passes through unchanged.
#[derive(Debug, Clone)]
pub struct UniformTemporalSubsample {
    pub num_samples: usize,
}

impl UniformTemporalSubsample {
    pub fn new(num_samples: usize) -> Self {
        Self { num_samples }
    }
}

impl Transform for UniformTemporalSubsample {
    fn apply(&self, clip: Tensor) -> Result<Tensor> {
        let dims = clip.dims();
        if dims.len() != 4 {
            return Err(Error::RankMismatch {
                expected: 4,
                got: dims.len(),
            });
        }
        let t = dims[1];
        if t == self.num_samples {
            return Ok(clip);
        }
        let indices = uniform_indices(t, self.num_samples);
        clip.index_select(1, &indices)
    }
}

// Compose

/// Chain multiple transforms, applied in order.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }
}

impl Transform for Compose {
    fn apply(&self, mut clip: Tensor) -> Result<Tensor> {
        for t in &self.transforms {
            clip = t.apply(clip)?;
        }
        Ok(clip)
    }
}

// Pipeline constructors — the only three orderings the pipeline uses.

/// Mapping pipeline for gait-cycle sources.
///
/// Temporal-mix mode skips the subsample here; the gait dataset aligns
/// cycle lengths itself after the transform.
pub fn mapping_pipeline(img_size: usize, num_samples: usize, temporal_mix: bool) -> Compose {
    if temporal_mix {
        Compose::new(vec![Box::new(Div255), Box::new(Resize::new(img_size))])
    } else {
        Compose::new(vec![
            Box::new(UniformTemporalSubsample::new(num_samples)),
            Box::new(Div255),
            Box::new(Resize::new(img_size)),
        ])
    }
}

/// Video pipeline for whole-video sources, applied to the sample's video
/// field: scale, resize, then subsample.
pub fn video_pipeline(img_size: usize, num_samples: usize) -> Compose {
    Compose::new(vec![
        Box::new(Div255),
        Box::new(Resize::new(img_size)),
        Box::new(UniformTemporalSubsample::new(num_samples)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(c: usize, t: usize, h: usize, w: usize) -> Tensor {
        let n = c * t * h * w;
        Tensor::from_vec((0..n).map(|v| v as f32).collect(), (c, t, h, w)).unwrap()
    }

    #[test]
    fn uniform_indices_exact_length_is_identity() {
        assert_eq!(uniform_indices(8, 8), vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn uniform_indices_single_frame_replicates() {
        assert_eq!(uniform_indices(1, 8), vec![0; 8]);
    }

    #[test]
    fn uniform_indices_downsample_spans_input() {
        let ix = uniform_indices(30, 4);
        assert_eq!(ix.len(), 4);
        assert_eq!(ix[0], 0);
        assert_eq!(*ix.last().unwrap(), 29);
        assert!(ix.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn subsample_identity_when_already_exact() {
        let c = clip(3, 8, 4, 4);
        let out = UniformTemporalSubsample::new(8).apply(c.clone()).unwrap();
        assert_eq!(out, c);
    }

    #[test]
    fn subsample_one_frame_to_eight() {
        let c = clip(1, 1, 2, 2);
        let out = UniformTemporalSubsample::new(8).apply(c.clone()).unwrap();
        assert_eq!(out.dims(), &[1, 8, 2, 2]);
        for f in 0..8 {
            assert_eq!(&out.data()[f * 4..(f + 1) * 4], c.data());
        }
    }

    #[test]
    fn div255_scales_to_unit_range() {
        let c = Tensor::from_vec(vec![0.0, 127.5, 255.0, 255.0], (1, 1, 2, 2)).unwrap();
        let out = Div255.apply(c).unwrap();
        assert!(out.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!((out.data()[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn resize_produces_square_output() {
        let c = clip(3, 2, 6, 8);
        let out = Resize::new(4).apply(c).unwrap();
        assert_eq!(out.dims(), &[3, 2, 4, 4]);
    }

    #[test]
    fn resize_constant_image_stays_constant() {
        let c = Tensor::full((1, 1, 5, 7), 3.5);
        let out = Resize::new(3).apply(c).unwrap();
        assert!(out.data().iter().all(|&v| (v - 3.5).abs() < 1e-5));
    }

    #[test]
    fn resize_noop_at_target_size() {
        let c = clip(1, 1, 4, 4);
        let out = Resize::new(4).apply(c.clone()).unwrap();
        assert_eq!(out, c);
    }

    #[test]
    fn mapping_pipeline_fixes_frame_count() {
        let c = clip(3, 20, 6, 6);
        let out = mapping_pipeline(4, 8, false).apply(c).unwrap();
        assert_eq!(out.dims(), &[3, 8, 4, 4]);
    }

    #[test]
    fn temporal_mix_pipeline_keeps_frame_count() {
        let c = clip(3, 20, 6, 6);
        let out = mapping_pipeline(4, 8, true).apply(c).unwrap();
        assert_eq!(out.dims(), &[3, 20, 4, 4]);
    }

    #[test]
    fn video_pipeline_resizes_then_subsamples() {
        let c = clip(3, 30, 6, 6);
        let out = video_pipeline(4, 8).apply(c).unwrap();
        assert_eq!(out.dims(), &[3, 8, 4, 4]);
    }
}
