//! Shared data contracts for sequence sample annotations.

pub mod annotation;

pub use annotation::{AnnotationError, FrameAnnotation, SequenceAnnotation, ANNOTATION_FILE_NAME};
