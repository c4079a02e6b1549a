//! Indexing of sequence sample directories and per-index frame decoding.

use crate::types::{
    DatasetError, DatasetMode, DatasetResult, LoadedSample, SequenceEntry, SequenceFrames,
};
use burn::tensor::backend::Backend;
use data_contracts::{AnnotationError, SequenceAnnotation};
use std::fs;
use std::path::{Path, PathBuf};

/// Frame files are matched on this extension unless overridden.
pub const DEFAULT_FRAME_EXTENSION: &str = "jpg";

/// Builder for [`SequenceIndex`].
#[derive(Debug, Clone)]
pub struct SequenceIndexBuilder {
    root: PathBuf,
    mode: DatasetMode,
    seq_len: Option<usize>,
    frame_extension: String,
    strict_seq_len: bool,
}

impl SequenceIndexBuilder {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mode: DatasetMode::Train,
            seq_len: None,
            frame_extension: DEFAULT_FRAME_EXTENSION.to_string(),
            strict_seq_len: false,
        }
    }

    pub fn mode(mut self, mode: DatasetMode) -> Self {
        self.mode = mode;
        self
    }

    /// Expected number of frames per sequence.
    pub fn seq_len(mut self, seq_len: usize) -> Self {
        self.seq_len = Some(seq_len);
        self
    }

    /// Extension (without the dot) that identifies frame files. Case-sensitive.
    pub fn frame_extension(mut self, ext: impl Into<String>) -> Self {
        self.frame_extension = ext.into();
        self
    }

    /// Reject sequences whose frame count differs from the `seq_len` hint.
    pub fn strict_seq_len(mut self, yes: bool) -> Self {
        self.strict_seq_len = yes;
        self
    }

    /// Scan the split directory and load every annotation record.
    pub fn build(self) -> DatasetResult<SequenceIndex> {
        SequenceIndex::scan(self)
    }
}

/// Random-access view over the sequences of one dataset split.
///
/// The annotation table is read-only after construction; frames are decoded
/// from disk on every [`SequenceIndex::get`].
#[derive(Debug, Clone)]
pub struct SequenceIndex {
    split_dir: PathBuf,
    mode: DatasetMode,
    seq_len: Option<usize>,
    frame_extension: String,
    strict_seq_len: bool,
    entries: Vec<SequenceEntry>,
}

impl SequenceIndex {
    /// Build an index for `mode` (`"train"` or `"valid"`) under `root`.
    ///
    /// The mode is checked before any filesystem access.
    pub fn new<P: AsRef<Path>>(root: P, mode: &str, seq_len: usize) -> DatasetResult<Self> {
        let mode: DatasetMode = mode.parse()?;
        SequenceIndexBuilder::new(root)
            .mode(mode)
            .seq_len(seq_len)
            .build()
    }

    pub fn builder<P: AsRef<Path>>(root: P) -> SequenceIndexBuilder {
        SequenceIndexBuilder::new(root)
    }

    fn scan(cfg: SequenceIndexBuilder) -> DatasetResult<Self> {
        let split_dir = cfg.root.join(cfg.mode.dir_name());
        tracing::debug!(split_dir = %split_dir.display(), mode = %cfg.mode, "indexing sequences");

        let read = fs::read_dir(&split_dir).map_err(|e| DatasetError::Io {
            path: split_dir.clone(),
            source: e,
        })?;
        let mut dirs = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| DatasetError::Io {
                path: split_dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut entries = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let annotation = load_annotation(&dir)?;
            entries.push(SequenceEntry { dir, annotation });
        }

        tracing::info!(
            split_dir = %split_dir.display(),
            sequences = entries.len(),
            "indexed sequence dataset"
        );

        Ok(Self {
            split_dir,
            mode: cfg.mode,
            seq_len: cfg.seq_len,
            frame_extension: cfg.frame_extension,
            strict_seq_len: cfg.strict_seq_len,
            entries,
        })
    }

    /// Number of indexed sequences.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mode(&self) -> DatasetMode {
        self.mode
    }

    pub fn split_dir(&self) -> &Path {
        &self.split_dir
    }

    pub fn seq_len_hint(&self) -> Option<usize> {
        self.seq_len
    }

    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    pub fn sequence_dir(&self, index: usize) -> DatasetResult<&Path> {
        Ok(&self.entry(index)?.dir)
    }

    pub fn annotation(&self, index: usize) -> DatasetResult<&SequenceAnnotation> {
        Ok(&self.entry(index)?.annotation)
    }

    fn entry(&self, index: usize) -> DatasetResult<&SequenceEntry> {
        self.entries.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    /// Frame files of sequence `index`, in frame order.
    pub fn frame_paths(&self, index: usize) -> DatasetResult<Vec<PathBuf>> {
        let dir = &self.entry(index)?.dir;
        let read = fs::read_dir(dir).map_err(|e| DatasetError::Io {
            path: dir.clone(),
            source: e,
        })?;
        let mut frames = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| DatasetError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|s| s.to_str()) == Some(self.frame_extension.as_str())
            {
                frames.push(path);
            }
        }
        frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(frames)
    }

    /// Decode sequence `index` into host buffers without building tensors.
    pub fn load_frames(&self, index: usize) -> DatasetResult<SequenceFrames> {
        let entry = self.entry(index)?;
        let frame_paths = self.frame_paths(index)?;
        let frames = frame_paths.len();

        if frames != entry.annotation.len() {
            return Err(DatasetError::shape(format!(
                "{} has {} frame files but {} annotation records",
                entry.dir.display(),
                frames,
                entry.annotation.len()
            )));
        }
        if frames == 0 {
            return Err(DatasetError::shape(format!(
                "{} contains no frames",
                entry.dir.display()
            )));
        }
        if let (true, Some(expected)) = (self.strict_seq_len, self.seq_len) {
            if frames != expected {
                return Err(DatasetError::shape(format!(
                    "{} has {} frames, expected sequence length {}",
                    entry.dir.display(),
                    frames,
                    expected
                )));
            }
        }

        let mut pixels = Vec::new();
        let mut size: Option<(u32, u32)> = None;
        for path in &frame_paths {
            let img = image::open(path)
                .map_err(|e| DatasetError::ImageDecode {
                    path: path.clone(),
                    source: e,
                })?
                .to_rgb8();
            let dims = img.dimensions();
            match size {
                None => {
                    size = Some(dims);
                    pixels.reserve(frames * dims.0 as usize * dims.1 as usize);
                }
                Some(expected) if expected != dims => {
                    return Err(DatasetError::shape(format!(
                        "{} is {}x{}, expected {}x{}",
                        path.display(),
                        dims.0,
                        dims.1,
                        expected.0,
                        expected.1
                    )));
                }
                _ => {}
            }
            // First color channel only; grayscale sources replicate into it.
            pixels.extend(img.pixels().map(|p| p[0] as f32 / 255.0));
        }
        let (width, height) = size.unwrap_or((0, 0));

        let counts = entry
            .annotation
            .object_counts()
            .into_iter()
            .map(|n| n as f32)
            .collect();

        tracing::debug!(
            index,
            frames,
            height,
            width,
            dir = %entry.dir.display(),
            "decoded sequence"
        );

        Ok(SequenceFrames {
            pixels,
            counts,
            frames,
            height: height as usize,
            width: width as usize,
        })
    }

    /// Load sequence `index` as `(T, 1, 1, H, W)` images and `(T, 1)` counts.
    pub fn get<B: Backend>(
        &self,
        index: usize,
        device: &B::Device,
    ) -> DatasetResult<LoadedSample<B>> {
        Ok(self.load_frames(index)?.into_sample(device))
    }
}

fn load_annotation(dir: &Path) -> DatasetResult<SequenceAnnotation> {
    SequenceAnnotation::load_from_dir(dir).map_err(|e| match e {
        AnnotationError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            DatasetError::MissingAnnotation {
                dir: dir.to_path_buf(),
            }
        }
        AnnotationError::Io { path, source } => DatasetError::Io { path, source },
        AnnotationError::Json { path, source } => DatasetError::Json { path, source },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_mode_skips_filesystem() {
        let err = SequenceIndex::new("/definitely/not/a/dataset", "bogus", 10).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidMode { .. }));
    }

    #[test]
    fn missing_split_dir_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = SequenceIndex::new(tmp.path(), "valid", 10).unwrap_err();
        match err {
            DatasetError::Io { path, .. } => assert_eq!(path, tmp.path().join("test")),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn loose_files_in_split_dir_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let split = tmp.path().join("train");
        fs::create_dir_all(&split).unwrap();
        fs::write(split.join("README.txt"), "not a sample").unwrap();
        let index = SequenceIndex::new(tmp.path(), "train", 10).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.seq_len_hint(), Some(10));
        assert_eq!(index.mode(), DatasetMode::Train);
    }
}
