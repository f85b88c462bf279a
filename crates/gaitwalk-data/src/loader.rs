// DataLoader — batching over a dataset, with optional prefetching
//
// One loader covers both execution modes.  With `prefetch_factor == 0`,
// batches are assembled on demand in the consumer's thread (sample fetch
// within a batch runs on rayon when `num_workers > 0`), so batch order
// matches index order.  With `prefetch_factor > 0`, a pool of background
// threads pre-loads and collates batches ahead of the consumer into a
// bounded channel, overlapping video decode with training.
//
// Usage:
//
//   let loader = DataLoader::new(
//       dataset,
//       label_map,
//       CollateKind::GaitCycle,
//       DataLoaderConfig::default().batch_size(8).drop_last(true),
//   );
//
//   for epoch in 0..num_epochs {
//       for batch in loader.iter_epoch() {
//           let batch = batch?;
//           // train on batch ...
//       }
//   }

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use gaitwalk_core::Result;

use crate::collate::{collate, Batch, CollateKind};
use crate::dataset::{Dataset, Sample};
use crate::labels::LabelMap;

// Configuration

/// Configuration for [`DataLoader`].
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to shuffle indices each epoch.
    pub shuffle: bool,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Number of worker threads.  With prefetching this is the pool size;
    /// without it, rayon parallelism for the in-batch sample fetch
    /// (0 = fetch samples sequentially).
    pub num_workers: usize,
    /// How many batches to buffer ahead of the consumer, per worker.
    /// 0 disables prefetching entirely.
    pub prefetch_factor: usize,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: true,
            drop_last: false,
            num_workers: 2,
            prefetch_factor: 0,
            seed: None,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }
    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }
    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }
    pub fn prefetch_factor(mut self, pf: usize) -> Self {
        self.prefetch_factor = pf;
        self
    }
    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }
}

// DataLoader

/// Batches a dataset through a label map and collator.
///
/// On each call to [`iter_epoch`](DataLoader::iter_epoch), the loader:
/// 1. Optionally reshuffles indices.
/// 2. Splits them into batch ranges, honouring `drop_last`.
/// 3. Returns an iterator of `Result<Batch>`, sequential or prefetched
///    depending on `prefetch_factor`.
///
/// The dataset is held via `Arc<dyn Dataset>` so it can be shared with
/// background worker threads.
pub struct DataLoader {
    dataset: Arc<dyn Dataset>,
    labels: Arc<LabelMap>,
    collate_kind: CollateKind,
    config: DataLoaderConfig,
    indices: Vec<usize>,
}

impl DataLoader {
    pub fn new(
        dataset: Arc<dyn Dataset>,
        labels: LabelMap,
        collate_kind: CollateKind,
        config: DataLoaderConfig,
    ) -> Self {
        let indices: Vec<usize> = (0..dataset.len()).collect();
        Self {
            dataset,
            labels: Arc::new(labels),
            collate_kind,
            config,
            indices,
        }
    }

    /// Number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        if self.config.drop_last {
            self.dataset.len() / self.config.batch_size
        } else {
            self.dataset.len().div_ceil(self.config.batch_size)
        }
    }

    /// Reshuffle indices.
    pub fn reshuffle(&mut self) {
        if self.config.shuffle {
            match self.config.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    self.indices.shuffle(&mut rng);
                }
                None => {
                    let mut rng = thread_rng();
                    self.indices.shuffle(&mut rng);
                }
            }
        }
    }

    fn batch_ranges(&self) -> Vec<Vec<usize>> {
        let bs = self.config.batch_size;
        let n = self.dataset.len();
        let num_batches = self.num_batches();
        let mut ranges = Vec::with_capacity(num_batches);
        for b in 0..num_batches {
            let start = b * bs;
            let end = (start + bs).min(n);
            ranges.push(self.indices[start..end].to_vec());
        }
        ranges
    }

    /// Iterate over one epoch of batches.
    pub fn iter_epoch(&mut self) -> EpochIterator {
        self.reshuffle();
        let ranges = self.batch_ranges();
        debug!(
            dataset = self.dataset.name(),
            batches = ranges.len(),
            batch_size = self.config.batch_size,
            prefetch = self.config.prefetch_factor,
            "starting epoch"
        );

        if self.config.prefetch_factor == 0 {
            EpochIterator::Sequential {
                dataset: self.dataset.clone(),
                labels: self.labels.clone(),
                collate_kind: self.collate_kind,
                parallel_fetch: self.config.num_workers > 0,
                ranges: ranges.into_iter(),
            }
        } else {
            self.spawn_prefetch(ranges)
        }
    }

    fn spawn_prefetch(&self, ranges: Vec<Vec<usize>>) -> EpochIterator {
        let workers = self.config.num_workers.max(1);
        let capacity = self.config.prefetch_factor * workers;
        let num_batches = ranges.len();

        let (tx, rx) = mpsc::sync_channel::<Result<Batch>>(capacity);

        // Shared work queue: each worker pops the next batch range.
        let work_queue: Arc<Mutex<std::vec::IntoIter<Vec<usize>>>> =
            Arc::new(Mutex::new(ranges.into_iter()));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let wq = work_queue.clone();
            let tx = tx.clone();
            let dataset = self.dataset.clone();
            let labels = self.labels.clone();
            let collate_kind = self.collate_kind;

            let handle = thread::spawn(move || loop {
                let range = {
                    let mut q = match wq.lock() {
                        Ok(q) => q,
                        Err(_) => break,
                    };
                    q.next()
                };
                let range = match range {
                    Some(r) => r,
                    None => break,
                };

                let result = fetch_and_collate(&*dataset, &labels, collate_kind, &range);

                // If the receiver is gone, stop early.
                if tx.send(result).is_err() {
                    break;
                }
            });
            handles.push(handle);
        }

        // Close the channel once the workers finish.
        drop(tx);

        EpochIterator::Prefetch {
            rx: Some(rx),
            handles: Some(handles),
            remaining: num_batches,
        }
    }
}

fn fetch_and_collate(
    dataset: &dyn Dataset,
    labels: &LabelMap,
    kind: CollateKind,
    indices: &[usize],
) -> Result<Batch> {
    let samples: Vec<Sample> = indices
        .iter()
        .map(|&i| dataset.get(i))
        .collect::<Result<_>>()?;
    collate(samples, labels, kind)
}

fn fetch_and_collate_parallel(
    dataset: &dyn Dataset,
    labels: &LabelMap,
    kind: CollateKind,
    indices: &[usize],
) -> Result<Batch> {
    let samples: Vec<Sample> = indices
        .par_iter()
        .map(|&i| dataset.get(i))
        .collect::<Result<_>>()?;
    collate(samples, labels, kind)
}

// EpochIterator

/// Yields the batches of one epoch.
///
/// The prefetching variant joins its workers when fully consumed or
/// dropped, so breaking out of a training loop early cannot hang.
pub enum EpochIterator {
    Sequential {
        dataset: Arc<dyn Dataset>,
        labels: Arc<LabelMap>,
        collate_kind: CollateKind,
        parallel_fetch: bool,
        ranges: std::vec::IntoIter<Vec<usize>>,
    },
    Prefetch {
        /// `None` once the channel has been closed for shutdown.
        rx: Option<mpsc::Receiver<Result<Batch>>>,
        handles: Option<Vec<thread::JoinHandle<()>>>,
        remaining: usize,
    },
}

impl Iterator for EpochIterator {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            EpochIterator::Sequential {
                dataset,
                labels,
                collate_kind,
                parallel_fetch,
                ranges,
            } => {
                let range = ranges.next()?;
                let result = if *parallel_fetch {
                    fetch_and_collate_parallel(&**dataset, labels, *collate_kind, &range)
                } else {
                    fetch_and_collate(&**dataset, labels, *collate_kind, &range)
                };
                Some(result)
            }
            EpochIterator::Prefetch { rx, remaining, .. } => {
                if *remaining == 0 {
                    return None;
                }
                let rx = rx.as_ref()?;
                match rx.recv() {
                    Ok(batch) => {
                        *remaining -= 1;
                        Some(batch)
                    }
                    Err(_) => {
                        // Channel closed, workers done (possibly early).
                        *remaining = 0;
                        None
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            EpochIterator::Sequential { ranges, .. } => ranges.size_hint(),
            EpochIterator::Prefetch { remaining, .. } => (*remaining, Some(*remaining)),
        }
    }
}

impl ExactSizeIterator for EpochIterator {}

impl Drop for EpochIterator {
    fn drop(&mut self) {
        if let EpochIterator::Prefetch { rx, handles, .. } = self {
            // Close the channel first: any worker blocked in `send` on the
            // full buffer gets a send error and exits.  Draining instead
            // would race against workers still refilling the buffer.
            drop(rx.take());
            if let Some(handles) = handles.take() {
                for h in handles {
                    let _ = h.join();
                }
            }
        }
    }
}
