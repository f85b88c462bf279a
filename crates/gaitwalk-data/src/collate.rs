//! Batch collation.
//!
//! Gait-cycle samples carry a variable number of cycles per patient, so a
//! batch cannot be a plain stack.  The gait collator concatenates every
//! cycle along the leading dim and keeps a span table recording which
//! contiguous slice of the batch belongs to which sample; labels are
//! expanded from that table, one per cycle.  Whole-video samples use the
//! plain stacked collator instead.

use gaitwalk_core::{bail, Result, Tensor};

use crate::dataset::Sample;
use crate::labels::LabelMap;

/// A contiguous slice of the batch belonging to one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpan {
    /// First clip index of the sample within the batch.
    pub offset: usize,
    /// Number of clips (gait cycles, or 1 for whole videos).
    pub count: usize,
}

/// A collated batch: `[N, C, T, H, W]` clips with one label per clip.
#[derive(Debug)]
pub struct Batch {
    pub video: Tensor,
    pub label: Vec<i64>,
    pub spans: Vec<SampleSpan>,
    pub info: Vec<Sample>,
}

impl Batch {
    /// Number of clips in the batch, `Σ spans[i].count`.
    pub fn clip_count(&self) -> usize {
        self.label.len()
    }

    /// Number of samples the batch was built from.
    pub fn sample_count(&self) -> usize {
        self.spans.len()
    }

    /// The label slice belonging to sample `i`.
    pub fn labels_for(&self, i: usize) -> &[i64] {
        let span = &self.spans[i];
        &self.label[span.offset..span.offset + span.count]
    }
}

/// Which collation strategy a loader applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollateKind {
    /// Rank-5 samples, flattened along the cycle dim with label expansion.
    GaitCycle,
    /// Rank-4 samples, stacked into a new batch dim.
    Stacked,
}

/// Collate `samples` into one batch according to `kind`.
pub fn collate(samples: Vec<Sample>, labels: &LabelMap, kind: CollateKind) -> Result<Batch> {
    match kind {
        CollateKind::GaitCycle => collate_gait(samples, labels),
        CollateKind::Stacked => collate_stacked(samples, labels),
    }
}

fn collate_gait(samples: Vec<Sample>, labels: &LabelMap) -> Result<Batch> {
    if samples.is_empty() {
        bail!("cannot collate an empty batch");
    }
    let trailing = samples[0].video.dims()[1..].to_vec();
    let mut spans = Vec::with_capacity(samples.len());
    let mut label = Vec::new();
    let mut offset = 0;
    for sample in &samples {
        let dims = sample.video.dims();
        if dims.len() != 5 {
            bail!(
                "patient {}: expected a rank-5 gait sample, got rank {}",
                sample.patient_id,
                dims.len()
            );
        }
        if dims[1..] != trailing[..] {
            bail!(
                "patient {}: cycle shape {:?} does not match batch shape {:?}",
                sample.patient_id,
                &dims[1..],
                trailing
            );
        }
        let count = dims[0];
        let class = labels.map(&sample.disease)?;
        label.extend(std::iter::repeat(class).take(count));
        spans.push(SampleSpan { offset, count });
        offset += count;
    }

    let parts: Vec<&Tensor> = samples.iter().map(|s| &s.video).collect();
    let video = Tensor::cat(&parts)?;
    Ok(Batch {
        video,
        label,
        spans,
        info: samples,
    })
}

fn collate_stacked(samples: Vec<Sample>, labels: &LabelMap) -> Result<Batch> {
    if samples.is_empty() {
        bail!("cannot collate an empty batch");
    }
    let mut label = Vec::with_capacity(samples.len());
    let mut spans = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        if sample.video.rank() != 4 {
            bail!(
                "patient {}: expected a rank-4 clip, got rank {}",
                sample.patient_id,
                sample.video.rank()
            );
        }
        label.push(labels.map(&sample.disease)?);
        spans.push(SampleSpan { offset: i, count: 1 });
    }

    let parts: Vec<&Tensor> = samples.iter().map(|s| &s.video).collect();
    let video = Tensor::stack(&parts)?;
    Ok(Batch {
        video,
        label,
        spans,
        info: samples,
    })
}
