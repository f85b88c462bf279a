// VideoFolder — directory-based whole-video dataset
//
// Loads videos from a directory tree where each subdirectory is a disease:
//
//   root/
//     ASD/
//       p001.mp4
//       p002.mp4
//     DHS/
//       p003.mp4
//       ...
//
// Classes are the sorted subdirectory names and paths are sorted within a
// class, so manifest order is deterministic.  Each `get` decodes a video,
// takes one uniform clip across its full span, and runs the video pipeline
// on it, yielding a rank-4 [C, T, H, W] sample.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gaitwalk_core::{Result, Tensor};
use tracing::info;

use crate::dataset::{Dataset, Sample};
use crate::transform::{video_pipeline, Compose, Transform};
use crate::video::{UniformClipSampler, VideoDecoder};

/// Supported video extensions (case-insensitive).
const EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Errors from scanning a video folder tree.
#[derive(Debug, thiserror::Error)]
pub enum VideoFolderError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("no disease subdirectories in {0}")]
    NoClasses(PathBuf),
    #[error("no video files found in {0}")]
    NoVideos(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A whole-video dataset rooted at a disease-per-subdirectory tree.
pub struct VideoFolderDataset {
    /// Sorted disease names (subdirectory names).
    class_names: Vec<String>,
    /// Per-sample metadata: (path, class index), deterministic order.
    entries: Vec<(PathBuf, usize)>,
    decoder: Arc<dyn VideoDecoder>,
    sampler: UniformClipSampler,
    transform: Compose,
    dataset_name: String,
}

impl VideoFolderDataset {
    /// Scan the directory tree and build the dataset.
    pub fn scan(
        root: impl AsRef<Path>,
        decoder: Arc<dyn VideoDecoder>,
        sampler: UniformClipSampler,
        img_size: usize,
        num_samples: usize,
        name: impl Into<String>,
    ) -> std::result::Result<Self, VideoFolderError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(VideoFolderError::NotADirectory(root.to_path_buf()));
        }

        let mut class_dirs: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                if let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) {
                    class_dirs.push((dir_name.to_string(), path));
                }
            }
        }
        class_dirs.sort_by(|a, b| a.0.cmp(&b.0));
        if class_dirs.is_empty() {
            return Err(VideoFolderError::NoClasses(root.to_path_buf()));
        }

        let class_names: Vec<String> = class_dirs.iter().map(|(n, _)| n.clone()).collect();
        let mut entries: Vec<(PathBuf, usize)> = Vec::new();
        for (class_idx, (_, dir)) in class_dirs.iter().enumerate() {
            let mut paths: Vec<PathBuf> = Vec::new();
            Self::collect_videos(dir, &mut paths)?;
            paths.sort();
            for p in paths {
                entries.push((p, class_idx));
            }
        }
        if entries.is_empty() {
            return Err(VideoFolderError::NoVideos(root.to_path_buf()));
        }

        let dataset_name = name.into();
        info!(
            root = %root.display(),
            dataset = %dataset_name,
            videos = entries.len(),
            classes = class_names.len(),
            "scanned video folder"
        );

        Ok(Self {
            class_names,
            entries,
            decoder,
            sampler,
            transform: video_pipeline(img_size, num_samples),
            dataset_name,
        })
    }

    /// Recursively collect video files.
    fn collect_videos(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::collect_videos(&path, out)?;
            } else if is_video(&path) {
                out.push(path);
            }
        }
        Ok(())
    }

    /// The disease names (sorted).
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }
}

impl Dataset for VideoFolderDataset {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let (path, class_idx) = &self.entries[index];
        let video = self.decoder.decode(path)?;

        let frame_ix = self.sampler.sample(video.frame_count(), video.fps);
        let clip = video.frames.index_select(1, &frame_ix)?;
        let clip: Tensor = self.transform.apply(clip)?;

        let patient_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Sample {
            video: clip,
            disease: self.class_names[*class_idx].clone(),
            patient_id,
            path: path.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.dataset_name
    }
}
