//! Batch iteration for training and validation.

use crate::batch::{collate, SequenceBatch};
use crate::index::SequenceIndex;
use crate::types::{DatasetError, DatasetResult, SequenceFrames};
use burn::tensor::backend::Backend;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of sequences per batch.
    pub batch_size: usize,
    /// Shuffle sequence order at the start of every epoch.
    pub shuffle: bool,
    /// Seed for reproducible shuffling.
    pub seed: Option<u64>,
    /// Drop the last partial batch.
    pub drop_last: bool,
    /// Decode the sequences of a batch on the rayon pool.
    pub parallel: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 128,
            shuffle: true,
            seed: None,
            drop_last: false,
            parallel: true,
        }
    }
}

impl LoaderConfig {
    pub fn train(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Default::default()
        }
    }

    pub fn valid(batch_size: usize) -> Self {
        Self {
            batch_size,
            shuffle: false,
            ..Default::default()
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn drop_last(mut self, yes: bool) -> Self {
        self.drop_last = yes;
        self
    }

    pub fn parallel(mut self, yes: bool) -> Self {
        self.parallel = yes;
        self
    }
}

/// Groups indices of a [`SequenceIndex`] into collated batches.
pub struct SequenceLoader<'a> {
    index: &'a SequenceIndex,
    cfg: LoaderConfig,
    order: Vec<usize>,
    cursor: usize,
    rng: StdRng,
    processed_batches: usize,
    processed_samples: usize,
    total_load_time: Duration,
}

impl<'a> SequenceLoader<'a> {
    pub fn new(index: &'a SequenceIndex, cfg: LoaderConfig) -> DatasetResult<Self> {
        if cfg.batch_size == 0 {
            return Err(DatasetError::InvalidConfig(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut loader = Self {
            index,
            order: (0..index.len()).collect(),
            cfg,
            cursor: 0,
            rng,
            processed_batches: 0,
            processed_samples: 0,
            total_load_time: Duration::ZERO,
        };
        loader.reshuffle();
        Ok(loader)
    }

    /// Number of sequences in the underlying index.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Batches produced per epoch.
    pub fn num_batches(&self) -> usize {
        if self.cfg.drop_last {
            self.order.len() / self.cfg.batch_size
        } else {
            self.order.len().div_ceil(self.cfg.batch_size)
        }
    }

    /// Sequence indices in the order the current epoch visits them.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn processed_batches(&self) -> usize {
        self.processed_batches
    }

    /// Reorder the epoch if shuffling is enabled.
    pub fn reshuffle(&mut self) {
        if self.cfg.shuffle {
            self.order.shuffle(&mut self.rng);
        }
    }

    /// Start a new epoch.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.reshuffle();
    }

    pub fn next_batch<B: Backend>(
        &mut self,
        device: &B::Device,
    ) -> DatasetResult<Option<SequenceBatch<B>>> {
        if self.cursor >= self.order.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.cfg.batch_size).min(self.order.len());
        if self.cfg.drop_last && end - self.cursor < self.cfg.batch_size {
            self.cursor = self.order.len();
            return Ok(None);
        }
        let slice = &self.order[self.cursor..end];
        self.cursor = end;

        let t_load = Instant::now();
        let index = self.index;
        let loaded: Vec<DatasetResult<SequenceFrames>> = if self.cfg.parallel {
            slice.par_iter().map(|&i| index.load_frames(i)).collect()
        } else {
            slice.iter().map(|&i| index.load_frames(i)).collect()
        };
        let samples = loaded
            .into_iter()
            .map(|res| res.map(|frames| frames.into_sample::<B>(device)))
            .collect::<DatasetResult<Vec<_>>>()?;
        let load_elapsed = t_load.elapsed();

        let batch_len = samples.len();
        let batch = collate(samples)?;

        self.processed_batches += 1;
        self.processed_samples += batch_len;
        self.total_load_time += load_elapsed;
        tracing::debug!(
            batch = self.processed_batches,
            samples = batch_len,
            load_ms = load_elapsed.as_secs_f64() * 1000.0,
            total_samples = self.processed_samples,
            "loaded batch"
        );

        Ok(Some(batch))
    }

    /// Mean wall time spent decoding one batch so far.
    pub fn avg_load_time(&self) -> Duration {
        if self.processed_batches == 0 {
            Duration::ZERO
        } else {
            self.total_load_time / self.processed_batches as u32
        }
    }
}
