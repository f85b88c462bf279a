//! Dataset selection policy.
//!
//! Which video source and transform pipeline a run uses depends on the
//! configured backbone, experiment tag, and temporal-mix flag.  The
//! combinations form a fixed precedence table, resolved once up front so an
//! unsupported configuration fails at setup rather than at the first batch.

use gaitwalk_core::{Error, Result};
use tracing::info;

/// Which kind of video source feeds a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Gait-cycle manifest source, rank-5 samples.
    GaitCycle,
    /// Whole-video folder source, rank-4 samples.
    WholeVideo,
}

/// Which transform pipeline the source applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformVariant {
    /// Mapping pipeline with temporal subsampling per cycle.
    MappingSubsample,
    /// Mapping pipeline without subsampling; cycles are length-aligned by
    /// the dataset afterwards.
    MappingScaleOnly,
    /// Whole-video pipeline applied to a uniform clip.
    Keyed,
}

/// Resolved plan for one split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlan {
    pub source: SourceKind,
    pub transform: TransformVariant,
    /// Clip duration in seconds, whole-video sources only.
    pub clip_duration: Option<f64>,
}

/// Resolved plan for a full run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPlan {
    pub train: SplitPlan,
    pub eval: SplitPlan,
}

const GAIT_SUBSAMPLE: SplitPlan = SplitPlan {
    source: SourceKind::GaitCycle,
    transform: TransformVariant::MappingSubsample,
    clip_duration: None,
};

const GAIT_SCALE_ONLY: SplitPlan = SplitPlan {
    source: SourceKind::GaitCycle,
    transform: TransformVariant::MappingScaleOnly,
    clip_duration: None,
};

fn whole_video(duration: f64) -> SplitPlan {
    SplitPlan {
        source: SourceKind::WholeVideo,
        transform: TransformVariant::Keyed,
        clip_duration: Some(duration),
    }
}

/// Resolve the dataset plan for the given configuration.
///
/// The rules are checked in order; the first match wins:
/// 1. temporal mix: gait-cycle everywhere, no per-cycle subsampling.
/// 2. a `"single"` backbone: whole videos for eval, and for training too
///    when the experiment is a `"random"` one; otherwise trains on gait
///    cycles.
/// 3. a `"late_fusion"` experiment: gait cycles everywhere.
/// 4. frame-based backbones (`"two_stream"`, `"cnn_lstm"`, `"2dcnn"`):
///    whole videos everywhere with the clip duration forced to 1 second.
/// 5. anything else is an unsupported combination.
pub fn resolve(
    temporal_mix: bool,
    backbone: &str,
    experiment: &str,
    clip_duration: f64,
) -> Result<DataPlan> {
    let plan = if temporal_mix {
        DataPlan {
            train: GAIT_SCALE_ONLY,
            eval: GAIT_SCALE_ONLY,
        }
    } else if backbone.contains("single") {
        let train = if experiment.contains("random") {
            whole_video(clip_duration)
        } else {
            GAIT_SUBSAMPLE
        };
        DataPlan {
            train,
            eval: whole_video(clip_duration),
        }
    } else if experiment.contains("late_fusion") {
        DataPlan {
            train: GAIT_SUBSAMPLE,
            eval: GAIT_SUBSAMPLE,
        }
    } else if ["two_stream", "cnn_lstm", "2dcnn"]
        .iter()
        .any(|b| backbone.contains(b))
    {
        DataPlan {
            train: whole_video(1.0),
            eval: whole_video(1.0),
        }
    } else {
        return Err(Error::UnsupportedCombination {
            backbone: backbone.to_string(),
            experiment: experiment.to_string(),
        });
    };

    info!(
        backbone,
        experiment,
        temporal_mix,
        train = ?plan.train.source,
        eval = ?plan.eval.source,
        "resolved dataset plan"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporal_mix_wins_over_everything() {
        let plan = resolve(true, "single_3dcnn", "random_split", 2.0).unwrap();
        assert_eq!(plan.train, GAIT_SCALE_ONLY);
        assert_eq!(plan.eval, GAIT_SCALE_ONLY);
    }

    #[test]
    fn single_backbone_random_experiment_uses_whole_video() {
        let plan = resolve(false, "single_3dcnn", "random_split", 2.0).unwrap();
        assert_eq!(plan.train.source, SourceKind::WholeVideo);
        assert_eq!(plan.train.clip_duration, Some(2.0));
        assert_eq!(plan.eval.source, SourceKind::WholeVideo);
        assert_eq!(plan.eval.clip_duration, Some(2.0));
    }

    #[test]
    fn single_backbone_other_experiment_trains_on_gait_cycles() {
        let plan = resolve(false, "single_3dcnn", "cross_val", 2.0).unwrap();
        assert_eq!(plan.train, GAIT_SUBSAMPLE);
        assert_eq!(plan.eval.source, SourceKind::WholeVideo);
    }

    #[test]
    fn late_fusion_uses_gait_cycles_everywhere() {
        let plan = resolve(false, "3dcnn", "late_fusion_avg", 2.0).unwrap();
        assert_eq!(plan.train, GAIT_SUBSAMPLE);
        assert_eq!(plan.eval, GAIT_SUBSAMPLE);
    }

    #[test]
    fn frame_backbones_force_one_second_clips() {
        for backbone in ["two_stream", "cnn_lstm", "2dcnn"] {
            let plan = resolve(false, backbone, "baseline", 4.0).unwrap();
            assert_eq!(plan.train.clip_duration, Some(1.0));
            assert_eq!(plan.eval.clip_duration, Some(1.0));
        }
    }

    #[test]
    fn unknown_combination_is_rejected() {
        let err = resolve(false, "transformer", "baseline", 2.0).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCombination { .. }));
    }
}
