//! The data module: wires config, label map, plan, datasets, and loaders.
//!
//! `WalkDataModule` is the single entry point for a training run.  It
//! validates the configuration up front (class count, backbone/experiment
//! combination), builds the train and eval datasets the resolved plan
//! calls for, and hands out configured loaders per split.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gaitwalk_core::{Error, Result};
use tracing::info;

use crate::collate::CollateKind;
use crate::dataset::Dataset;
use crate::gait_dataset::GaitCycleDataset;
use crate::labels::LabelMap;
use crate::loader::{DataLoader, DataLoaderConfig};
use crate::policy::{self, DataPlan, SourceKind, SplitPlan, TransformVariant};
use crate::video::{UniformClipSampler, VideoDecoder};
use crate::video_folder::VideoFolderDataset;

/// When epoch shuffling applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShufflePolicy {
    /// Shuffle training epochs only (the default).  Evaluation splits are
    /// never shuffled so per-sample results stay attributable.
    TrainOnly,
    /// Never shuffle.
    Never,
}

/// The four data locations a run needs, in fixed positional order:
/// train gait manifest, eval gait manifest, train video root, eval video
/// root.  All four must be supplied even when the resolved plan only uses
/// two of them.
#[derive(Debug, Clone)]
pub struct DatasetIndex {
    paths: [PathBuf; 4],
}

impl DatasetIndex {
    pub fn new(
        train_gait_manifest: impl Into<PathBuf>,
        eval_gait_manifest: impl Into<PathBuf>,
        train_video_root: impl Into<PathBuf>,
        eval_video_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            paths: [
                train_gait_manifest.into(),
                eval_gait_manifest.into(),
                train_video_root.into(),
                eval_video_root.into(),
            ],
        }
    }

    pub fn train_gait_manifest(&self) -> &Path {
        &self.paths[0]
    }

    pub fn eval_gait_manifest(&self) -> &Path {
        &self.paths[1]
    }

    pub fn train_video_root(&self) -> &Path {
        &self.paths[2]
    }

    pub fn eval_video_root(&self) -> &Path {
        &self.paths[3]
    }
}

/// Run configuration.  Immutable once the module is built.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Batch size (in samples) for gait-cycle training.
    pub gait_cycle_batch_size: usize,
    /// Batch size for whole-video loaders.
    pub default_batch_size: usize,
    /// Batch size for gait-cycle evaluation loaders.
    pub eval_batch_size: usize,
    pub num_workers: usize,
    pub prefetch_factor: usize,
    /// Square frame size after resizing.
    pub img_size: usize,
    /// Clip duration in seconds for whole-video sources.
    pub clip_duration: f64,
    /// Frames per clip after temporal subsampling.
    pub temporal_subsample_num: usize,
    /// Number of disease classes, one of 2, 3, or 4.
    pub class_count: usize,
    pub experiment: String,
    pub backbone: String,
    pub temporal_mix: bool,
    pub shuffle: ShufflePolicy,
    pub seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            gait_cycle_batch_size: 8,
            default_batch_size: 32,
            eval_batch_size: 16,
            num_workers: 2,
            prefetch_factor: 0,
            img_size: 224,
            clip_duration: 1.0,
            temporal_subsample_num: 8,
            class_count: 3,
            experiment: String::new(),
            backbone: "3dcnn".to_string(),
            temporal_mix: false,
            shuffle: ShufflePolicy::TrainOnly,
            seed: None,
        }
    }
}

/// One built split: the dataset plus how to batch and collate it.
struct Split {
    dataset: Arc<dyn Dataset>,
    collate_kind: CollateKind,
    batch_size: usize,
    shuffle: bool,
}

/// Builds datasets per the resolved plan and hands out loaders per split.
pub struct WalkDataModule {
    config: DataConfig,
    labels: LabelMap,
    plan: DataPlan,
    train: Split,
    eval: Split,
}

impl WalkDataModule {
    /// Validate the configuration and build the split datasets.
    ///
    /// Fails here, not at the first batch, when the class count is
    /// unsupported, the backbone/experiment combination has no plan, or a
    /// dataset location cannot be read.
    pub fn new(
        config: DataConfig,
        index: DatasetIndex,
        decoder: Arc<dyn VideoDecoder>,
    ) -> Result<Self> {
        let labels = LabelMap::new(config.class_count)?;
        let plan = policy::resolve(
            config.temporal_mix,
            &config.backbone,
            &config.experiment,
            config.clip_duration,
        )?;

        let train = Self::build_split(
            &config,
            &plan.train,
            index.train_gait_manifest(),
            index.train_video_root(),
            decoder.clone(),
            "train",
        )?;
        let eval = Self::build_split(
            &config,
            &plan.eval,
            index.eval_gait_manifest(),
            index.eval_video_root(),
            decoder,
            "eval",
        )?;

        info!(
            classes = config.class_count,
            train_samples = train.dataset.len(),
            eval_samples = eval.dataset.len(),
            "data module ready"
        );

        Ok(Self {
            config,
            labels,
            plan,
            train,
            eval,
        })
    }

    fn build_split(
        config: &DataConfig,
        plan: &SplitPlan,
        gait_manifest: &Path,
        video_root: &Path,
        decoder: Arc<dyn VideoDecoder>,
        split: &str,
    ) -> Result<Split> {
        let is_train = split == "train";
        match plan.source {
            SourceKind::GaitCycle => {
                let temporal_mix = plan.transform == TransformVariant::MappingScaleOnly;
                let dataset = GaitCycleDataset::load(
                    gait_manifest,
                    decoder,
                    config.img_size,
                    config.temporal_subsample_num,
                    temporal_mix,
                    format!("{split}-gait"),
                )?;
                Ok(Split {
                    dataset: Arc::new(dataset),
                    collate_kind: CollateKind::GaitCycle,
                    batch_size: if is_train {
                        config.gait_cycle_batch_size
                    } else {
                        config.eval_batch_size
                    },
                    shuffle: is_train && config.shuffle == ShufflePolicy::TrainOnly,
                })
            }
            SourceKind::WholeVideo => {
                let duration = plan.clip_duration.unwrap_or(config.clip_duration);
                let dataset = VideoFolderDataset::scan(
                    video_root,
                    decoder,
                    UniformClipSampler::new(duration),
                    config.img_size,
                    config.temporal_subsample_num,
                    format!("{split}-video"),
                )
                .map_err(|e| Error::msg(e.to_string()))?;
                Ok(Split {
                    dataset: Arc::new(dataset),
                    collate_kind: CollateKind::Stacked,
                    batch_size: config.default_batch_size,
                    shuffle: false,
                })
            }
        }
    }

    fn loader(&self, split: &Split, shuffle: bool) -> DataLoader {
        let mut config = DataLoaderConfig::default()
            .batch_size(split.batch_size)
            .shuffle(shuffle)
            .drop_last(true)
            .num_workers(self.config.num_workers)
            .prefetch_factor(self.config.prefetch_factor);
        if let Some(seed) = self.config.seed {
            config = config.seed(seed);
        }
        DataLoader::new(
            split.dataset.clone(),
            self.labels.clone(),
            split.collate_kind,
            config,
        )
    }

    pub fn train_loader(&self) -> DataLoader {
        self.loader(&self.train, self.train.shuffle)
    }

    pub fn val_loader(&self) -> DataLoader {
        self.loader(&self.eval, false)
    }

    pub fn test_loader(&self) -> DataLoader {
        self.loader(&self.eval, false)
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn plan(&self) -> &DataPlan {
        &self.plan
    }

    pub fn train_dataset(&self) -> &Arc<dyn Dataset> {
        &self.train.dataset
    }

    pub fn eval_dataset(&self) -> &Arc<dyn Dataset> {
        &self.eval.dataset
    }
}
