//! End-to-end tests for the data module: fixture manifests and video
//! folders on disk, a deterministic decoder, real loaders.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gaitwalk_data::{
    DataConfig, DatasetIndex, SourceKind, SyntheticDecoder, WalkDataModule,
};

struct Fixture {
    _tmp: tempfile::TempDir,
    index: DatasetIndex,
}

fn write_manifest(path: &Path, patients: &[(&str, &str, &[usize])]) {
    let records: Vec<String> = patients
        .iter()
        .map(|(id, disease, bounds)| {
            let bounds: Vec<String> = bounds.iter().map(|b| b.to_string()).collect();
            format!(
                r#"{{"patient_id":"{id}","video":"{id}.mp4","disease":"{disease}","gait_cycle_index":[{}]}}"#,
                bounds.join(",")
            )
        })
        .collect();
    fs::write(path, format!("[{}]", records.join(","))).unwrap();
}

fn write_video_tree(root: &Path, classes: &[(&str, usize)]) {
    for (disease, count) in classes {
        let dir = root.join(disease);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..*count {
            fs::write(dir.join(format!("v{i}.mp4")), b"").unwrap();
        }
    }
}

/// Builds a fixture with 4 gait patients and 6 videos per split.
fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let train_manifest = root.join("train_gait.json");
    let eval_manifest = root.join("eval_gait.json");
    write_manifest(
        &train_manifest,
        &[
            ("p1", "ASD", &[0, 12, 24, 40]),
            ("p2", "DHS", &[0, 20]),
            ("p3", "LCS_HipOA", &[0, 10, 30]),
            ("p4", "ASD", &[5, 25]),
        ],
    );
    write_manifest(
        &eval_manifest,
        &[
            ("q1", "ASD", &[0, 15, 30]),
            ("q2", "DHS", &[0, 18]),
        ],
    );

    let train_videos = root.join("train_videos");
    let eval_videos = root.join("eval_videos");
    write_video_tree(&train_videos, &[("ASD", 3), ("DHS", 2), ("LCS_HipOA", 1)]);
    write_video_tree(&eval_videos, &[("ASD", 2), ("DHS", 2), ("LCS_HipOA", 2)]);

    let index = DatasetIndex::new(train_manifest, eval_manifest, train_videos, eval_videos);
    Fixture { _tmp: tmp, index }
}

fn decoder() -> Arc<SyntheticDecoder> {
    // 60 frames at 30 fps, 8x8 pixels.
    Arc::new(SyntheticDecoder::new(60, 8, 8))
}

fn config() -> DataConfig {
    DataConfig {
        gait_cycle_batch_size: 2,
        default_batch_size: 2,
        eval_batch_size: 16,
        num_workers: 0,
        prefetch_factor: 0,
        img_size: 4,
        clip_duration: 1.0,
        temporal_subsample_num: 8,
        class_count: 3,
        experiment: String::new(),
        backbone: "3dcnn".to_string(),
        temporal_mix: false,
        seed: Some(11),
        ..DataConfig::default()
    }
}

#[test]
fn single_backbone_random_experiment_trains_on_whole_videos() {
    let f = fixture();
    let module = WalkDataModule::new(
        DataConfig {
            backbone: "single_3dcnn".to_string(),
            experiment: "random_split".to_string(),
            clip_duration: 2.0,
            ..config()
        },
        f.index.clone(),
        decoder(),
    )
    .unwrap();

    assert_eq!(module.plan().train.source, SourceKind::WholeVideo);
    assert_eq!(module.plan().eval.source, SourceKind::WholeVideo);
    assert_eq!(module.plan().train.clip_duration, Some(2.0));
    assert_eq!(module.train_dataset().len(), 6);
    assert_eq!(module.eval_dataset().len(), 6);

    // Stacked batches of whole videos at the configured frame count.
    let mut loader = module.train_loader();
    let batch = loader.iter_epoch().next().unwrap().unwrap();
    assert_eq!(batch.video.dims(), &[2, 3, 8, 4, 4]);
    assert_eq!(batch.label.len(), 2);
    assert!(batch.spans.iter().all(|s| s.count == 1));
}

#[test]
fn single_backbone_other_experiment_trains_on_gait_cycles() {
    let f = fixture();
    let module = WalkDataModule::new(
        DataConfig {
            backbone: "single_3dcnn".to_string(),
            experiment: "cross_val".to_string(),
            ..config()
        },
        f.index.clone(),
        decoder(),
    )
    .unwrap();

    assert_eq!(module.plan().train.source, SourceKind::GaitCycle);
    assert_eq!(module.plan().eval.source, SourceKind::WholeVideo);
    assert_eq!(module.train_dataset().len(), 4);
}

#[test]
fn two_stream_backbone_forces_one_second_clips() {
    let f = fixture();
    let module = WalkDataModule::new(
        DataConfig {
            backbone: "two_stream".to_string(),
            experiment: "baseline".to_string(),
            clip_duration: 4.0,
            ..config()
        },
        f.index.clone(),
        decoder(),
    )
    .unwrap();

    assert_eq!(module.plan().train.source, SourceKind::WholeVideo);
    assert_eq!(module.plan().train.clip_duration, Some(1.0));
    assert_eq!(module.plan().eval.clip_duration, Some(1.0));

    // 1 second at 30 fps = 30 sampled frames, subsampled down to 8.
    let mut loader = module.val_loader();
    let batch = loader.iter_epoch().next().unwrap().unwrap();
    assert_eq!(batch.video.dims(), &[2, 3, 8, 4, 4]);
}

#[test]
fn temporal_mix_uses_gait_cycles_and_eval_batch_size() {
    let f = fixture();
    let module = WalkDataModule::new(
        DataConfig {
            temporal_mix: true,
            backbone: "unknown_backbone".to_string(),
            gait_cycle_batch_size: 1,
            eval_batch_size: 16,
            ..config()
        },
        f.index.clone(),
        decoder(),
    )
    .unwrap();

    // Temporal mix wins regardless of backbone.
    assert_eq!(module.plan().train.source, SourceKind::GaitCycle);
    assert_eq!(module.plan().eval.source, SourceKind::GaitCycle);

    // Eval batch size is its own knob, independent of the train sizes.
    // 2 eval patients with drop_last and batch size 16 means no full batch.
    let mut loader = module.val_loader();
    assert_eq!(loader.num_batches(), 0);
    assert!(loader.iter_epoch().next().is_none());

    // Train side still batches at its own size, cycles flattened.
    let mut loader = module.train_loader();
    let batch = loader.iter_epoch().next().unwrap().unwrap();
    assert_eq!(batch.sample_count(), 1);
    assert_eq!(batch.clip_count(), batch.video.dims()[0]);
    assert_eq!(batch.video.dims()[2..], [8, 4, 4]);
}

#[test]
fn late_fusion_expands_labels_per_cycle() {
    let f = fixture();
    let module = WalkDataModule::new(
        DataConfig {
            backbone: "3dcnn".to_string(),
            experiment: "late_fusion_avg".to_string(),
            eval_batch_size: 2,
            ..config()
        },
        f.index.clone(),
        decoder(),
    )
    .unwrap();
    assert_eq!(module.plan().eval.source, SourceKind::GaitCycle);

    // Val never shuffles, so manifest order is observable.
    let mut loader = module.val_loader();
    let batch = loader.iter_epoch().next().unwrap().unwrap();

    // q1 has 2 cycles (ASD=0), q2 has 1 (DHS=1), manifest order preserved.
    assert_eq!(batch.label, vec![0, 0, 1]);
    assert_eq!(batch.labels_for(0), &[0, 0]);
    assert_eq!(batch.labels_for(1), &[1]);
    assert_eq!(batch.info[0].patient_id, "q1");
    assert_eq!(batch.info[1].patient_id, "q2");
}

#[test]
fn unsupported_combination_fails_at_setup() {
    let f = fixture();
    let err = WalkDataModule::new(
        DataConfig {
            backbone: "transformer".to_string(),
            experiment: "baseline".to_string(),
            ..config()
        },
        f.index.clone(),
        decoder(),
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("transformer"));
}

#[test]
fn unsupported_class_count_fails_at_setup() {
    let f = fixture();
    assert!(WalkDataModule::new(
        DataConfig {
            class_count: 5,
            ..config()
        },
        f.index.clone(),
        decoder(),
    )
    .is_err());
}

#[test]
fn missing_video_root_fails_at_setup() {
    let f = fixture();
    let index = DatasetIndex::new(
        f.index.train_gait_manifest().to_path_buf(),
        f.index.eval_gait_manifest().to_path_buf(),
        PathBuf::from("/nonexistent/videos"),
        f.index.eval_video_root().to_path_buf(),
    );
    assert!(WalkDataModule::new(
        DataConfig {
            backbone: "two_stream".to_string(),
            experiment: "baseline".to_string(),
            ..config()
        },
        index,
        decoder(),
    )
    .is_err());
}

#[test]
fn prefetching_loader_covers_the_whole_epoch() {
    let f = fixture();
    let module = WalkDataModule::new(
        DataConfig {
            backbone: "two_stream".to_string(),
            experiment: "baseline".to_string(),
            default_batch_size: 2,
            num_workers: 2,
            prefetch_factor: 2,
            ..config()
        },
        f.index.clone(),
        decoder(),
    )
    .unwrap();

    let mut loader = module.test_loader();
    let mut clips = 0;
    for batch in loader.iter_epoch() {
        clips += batch.unwrap().clip_count();
    }
    assert_eq!(clips, 6);
}
