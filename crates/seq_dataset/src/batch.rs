//! Time-major collation of loaded sequences.

use crate::types::{DatasetError, DatasetResult, LoadedSample};
use burn::tensor::{backend::Backend, Tensor};

/// A collated batch.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Shape `(T, B, C, H, W)`.
    pub images: Tensor<B, 5>,
    /// Shape `(T, B)`.
    pub counts: Tensor<B, 2>,
}

impl<B: Backend> SequenceBatch<B> {
    pub fn seq_len(&self) -> usize {
        self.images.dims()[0]
    }

    pub fn batch_size(&self) -> usize {
        self.images.dims()[1]
    }
}

/// Concatenate samples along axis 1; sample `i` lands in batch slot `i`.
///
/// All samples must share T, C, H and W. Shapes are checked up front, so a
/// mismatch returns an error without building any tensor.
pub fn collate<B: Backend>(samples: Vec<LoadedSample<B>>) -> DatasetResult<SequenceBatch<B>> {
    let Some(first) = samples.first() else {
        return Err(DatasetError::EmptyBatch);
    };
    let [t, _, c, h, w] = first.images.dims();

    for (i, sample) in samples.iter().enumerate() {
        let dims = sample.images.dims();
        if dims[1] != 1 {
            return Err(DatasetError::shape(format!(
                "sample {i} has batch axis of size {}, expected 1",
                dims[1]
            )));
        }
        if [dims[0], dims[2], dims[3], dims[4]] != [t, c, h, w] {
            return Err(DatasetError::shape(format!(
                "sample {i} images are (T={}, C={}, H={}, W={}), expected (T={t}, C={c}, H={h}, W={w})",
                dims[0], dims[2], dims[3], dims[4]
            )));
        }
        let count_dims = sample.counts.dims();
        if count_dims != [t, 1] {
            return Err(DatasetError::shape(format!(
                "sample {i} counts are {count_dims:?}, expected [{t}, 1]"
            )));
        }
    }

    let (images, counts): (Vec<_>, Vec<_>) = samples
        .into_iter()
        .map(|s| (s.images, s.counts))
        .unzip();

    Ok(SequenceBatch {
        images: Tensor::cat(images, 1),
        counts: Tensor::cat(counts, 1),
    })
}
