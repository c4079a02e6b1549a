use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the per-sequence annotation record inside each sample directory.
pub const ANNOTATION_FILE_NAME: &str = "annotations.json";

#[derive(Debug, Error)]
pub enum AnnotationError {
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
}

/// Detections for a single frame.
///
/// Only the number of boxes is consumed downstream; the box payloads are kept
/// as raw JSON so that differing geometry encodings parse the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameAnnotation {
    pub bboxes: Vec<serde_json::Value>,
}

impl FrameAnnotation {
    pub fn object_count(&self) -> usize {
        self.bboxes.len()
    }
}

/// Annotation record of one sequence: a JSON array with one entry per frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SequenceAnnotation {
    pub frames: Vec<FrameAnnotation>,
}

impl SequenceAnnotation {
    pub fn new(frames: Vec<FrameAnnotation>) -> Self {
        Self { frames }
    }

    /// Number of per-frame records.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Per-frame object counts, in frame order.
    pub fn object_counts(&self) -> Vec<usize> {
        self.frames.iter().map(FrameAnnotation::object_count).collect()
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// Read and parse an annotation file.
    pub fn load(path: &Path) -> Result<Self, AnnotationError> {
        let raw = fs::read(path).map_err(|e| AnnotationError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_slice(&raw).map_err(|e| AnnotationError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `annotations.json` from a sample directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self, AnnotationError> {
        Self::load(&dir.join(ANNOTATION_FILE_NAME))
    }
}
