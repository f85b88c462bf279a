// Video decoding seam + clip sampling
//
// Physical frame decoding is an external collaborator: datasets only see
// the `VideoDecoder` trait, which hands back a full [C, T, H, W] frame
// stack plus its frame rate.  `SyntheticDecoder` is the deterministic
// stand-in used by tests and demos.

use std::path::Path;

use gaitwalk_core::{Result, Tensor};

use crate::transform::uniform_indices;

/// A fully decoded video: raw frames in [C, T, H, W] with values in
/// [0, 255], plus the source frame rate.
#[derive(Debug, Clone)]
pub struct DecodedVideo {
    pub frames: Tensor,
    pub fps: f64,
}

impl DecodedVideo {
    /// Number of frames (temporal dimension).
    pub fn frame_count(&self) -> usize {
        self.frames.dims()[1]
    }
}

/// Decodes a video file into a frame tensor.
///
/// Decode failures are fatal for the sample that requested them; the
/// pipeline does not retry or skip.
pub trait VideoDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedVideo>;
}

/// Uniform clip sampling: pick `round(duration * fps)` equispaced frames
/// across the whole video, deterministically.
///
/// This is how whole-video sources reduce a full recording to one clip per
/// epoch; the clip duration (seconds) is policy-controlled (forced to 1.0
/// for the frame backbones).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformClipSampler {
    pub duration: f64,
}

impl UniformClipSampler {
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }

    /// Frame indices for the sampled clip.
    pub fn sample(&self, total_frames: usize, fps: f64) -> Vec<usize> {
        let clip_len = ((self.duration * fps).round() as usize).max(1);
        uniform_indices(total_frames, clip_len.min(total_frames.max(1)))
    }
}

/// Deterministic decoder producing patterned frames.
///
/// Pixel value for frame f, channel c is `(f * 3 + c) % 256`, so tests can
/// tell frames (and temporal selections) apart without touching real video
/// files.  The path argument is only recorded, never read.
#[derive(Debug, Clone)]
pub struct SyntheticDecoder {
    pub frames: usize,
    pub height: usize,
    pub width: usize,
    pub fps: f64,
}

impl SyntheticDecoder {
    pub fn new(frames: usize, height: usize, width: usize) -> Self {
        Self {
            frames,
            height,
            width,
            fps: 30.0,
        }
    }
}

impl VideoDecoder for SyntheticDecoder {
    fn decode(&self, _path: &Path) -> Result<DecodedVideo> {
        let (c, t, h, w) = (3usize, self.frames, self.height, self.width);
        let mut data = Vec::with_capacity(c * t * h * w);
        for ch in 0..c {
            for f in 0..t {
                let v = ((f * 3 + ch) % 256) as f32;
                data.extend(std::iter::repeat(v).take(h * w));
            }
        }
        Ok(DecodedVideo {
            frames: Tensor::from_vec(data, (c, t, h, w))?,
            fps: self.fps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn synthetic_decoder_shape_and_pattern() {
        let d = SyntheticDecoder::new(5, 4, 4);
        let v = d.decode(&PathBuf::from("unused.mp4")).unwrap();
        assert_eq!(v.frames.dims(), &[3, 5, 4, 4]);
        assert_eq!(v.frame_count(), 5);
        // channel 0, frame 2 → value 6
        let plane = &v.frames.data()[2 * 16..3 * 16];
        assert!(plane.iter().all(|&p| p == 6.0));
    }

    #[test]
    fn uniform_sampler_clip_length() {
        let s = UniformClipSampler::new(1.0);
        let ix = s.sample(90, 30.0);
        assert_eq!(ix.len(), 30);
        assert_eq!(ix[0], 0);
        assert_eq!(*ix.last().unwrap(), 89);
    }

    #[test]
    fn uniform_sampler_short_video() {
        // Fewer frames than the requested clip: take every frame once.
        let s = UniformClipSampler::new(2.0);
        let ix = s.sample(10, 30.0);
        assert_eq!(ix, (0..10).collect::<Vec<_>>());
    }
}
