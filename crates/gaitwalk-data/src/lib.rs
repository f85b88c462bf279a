//! # gaitwalk-data
//!
//! Data loading, batching, and dataset selection for gait-disorder video
//! classification.
//!
//! This crate provides:
//! - [`Dataset`] trait — unified interface over the two video sources
//! - [`GaitCycleDataset`] — manifest-driven per-cycle samples `[G,C,T,H,W]`
//! - [`VideoFolderDataset`] — whole-video clips from a disease-per-directory tree
//! - [`LabelMap`] — disease-to-class tables keyed by class count
//! - [`policy::resolve`] — the backbone/experiment dataset-selection table
//! - [`collate`](collate::collate) — gait-cycle flattening with label expansion,
//!   or plain stacking
//! - [`DataLoader`] — batching, shuffling, optional background prefetching
//! - [`WalkDataModule`] — the orchestrator wiring all of the above per split

pub mod collate;
pub mod datamodule;
pub mod dataset;
pub mod gait_dataset;
pub mod labels;
pub mod loader;
pub mod manifest;
pub mod policy;
pub mod transform;
pub mod video;
pub mod video_folder;

pub use collate::{Batch, CollateKind, SampleSpan};
pub use datamodule::{DataConfig, DatasetIndex, ShufflePolicy, WalkDataModule};
pub use dataset::{Dataset, Sample};
pub use gait_dataset::GaitCycleDataset;
pub use labels::LabelMap;
pub use loader::{DataLoader, DataLoaderConfig, EpochIterator};
pub use manifest::{GaitManifest, ManifestError, PatientRecord};
pub use policy::{DataPlan, SourceKind, SplitPlan, TransformVariant};
pub use transform::{Compose, Div255, Resize, Transform, UniformTemporalSubsample};
pub use video::{DecodedVideo, SyntheticDecoder, UniformClipSampler, VideoDecoder};
pub use video_folder::{VideoFolderDataset, VideoFolderError};
