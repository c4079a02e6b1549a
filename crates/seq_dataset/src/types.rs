//! Core types, error definitions, and data structures for seq_dataset.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use data_contracts::SequenceAnnotation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid dataset mode {mode:?}; expected one of \"train\", \"valid\"")]
    InvalidMode { mode: String },
    #[error("annotation file missing in sample directory {dir}")]
    MissingAnnotation { dir: PathBuf },
    #[error("index {index} out of range for dataset of {len} sequences")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("image decode error at {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("shape mismatch: {msg}")]
    ShapeMismatch { msg: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot collate an empty batch")]
    EmptyBatch,
    #[error("invalid loader config: {0}")]
    InvalidConfig(String),
}

impl DatasetError {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        DatasetError::ShapeMismatch { msg: msg.into() }
    }
}

/// Dataset split selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetMode {
    Train,
    Valid,
}

impl DatasetMode {
    /// Subdirectory of the dataset root holding this split.
    pub fn dir_name(&self) -> &'static str {
        match self {
            DatasetMode::Train => "train",
            DatasetMode::Valid => "test",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetMode::Train => "train",
            DatasetMode::Valid => "valid",
        }
    }
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetMode {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(DatasetMode::Train),
            "valid" => Ok(DatasetMode::Valid),
            other => Err(DatasetError::InvalidMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// One indexed sample directory with its parsed annotation record.
#[derive(Debug, Clone)]
pub struct SequenceEntry {
    pub dir: PathBuf,
    pub annotation: SequenceAnnotation,
}

/// Decoded frames of one sequence, still on the host.
///
/// `pixels` holds `frames * height * width` values in frame-major, row-major
/// order, already scaled to [0, 1].
#[derive(Debug, Clone)]
pub struct SequenceFrames {
    pub pixels: Vec<f32>,
    /// Object count per frame.
    pub counts: Vec<f32>,
    pub frames: usize,
    pub height: usize,
    pub width: usize,
}

impl SequenceFrames {
    /// Move the frames onto `device` as a `(T, 1, 1, H, W)` / `(T, 1)` sample.
    pub fn into_sample<B: Backend>(self, device: &B::Device) -> LoadedSample<B> {
        let images = Tensor::<B, 5>::from_data(
            TensorData::new(self.pixels, [self.frames, 1, 1, self.height, self.width]),
            device,
        );
        let counts =
            Tensor::<B, 2>::from_data(TensorData::new(self.counts, [self.frames, 1]), device);
        LoadedSample { images, counts }
    }
}

/// A single materialized sequence.
#[derive(Debug, Clone)]
pub struct LoadedSample<B: Backend> {
    /// Shape `(T, 1, C, H, W)`, values in [0, 1].
    pub images: Tensor<B, 5>,
    /// Shape `(T, 1)`.
    pub counts: Tensor<B, 2>,
}

impl<B: Backend> LoadedSample<B> {
    pub fn seq_len(&self) -> usize {
        self.images.dims()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_map_to_split_dirs() {
        assert_eq!("train".parse::<DatasetMode>().unwrap().dir_name(), "train");
        assert_eq!("valid".parse::<DatasetMode>().unwrap().dir_name(), "test");
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "bogus".parse::<DatasetMode>().unwrap_err();
        match err {
            DatasetError::InvalidMode { mode } => assert_eq!(mode, "bogus"),
            other => panic!("expected InvalidMode, got {other:?}"),
        }
        // The split directory name is not an accepted mode.
        assert!("test".parse::<DatasetMode>().is_err());
    }

    #[test]
    fn mode_display_round_trips() {
        for mode in [DatasetMode::Train, DatasetMode::Valid] {
            assert_eq!(mode.to_string().parse::<DatasetMode>().unwrap(), mode);
        }
    }
}
