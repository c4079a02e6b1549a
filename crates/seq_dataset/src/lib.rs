//! Sequential multi-digit MNIST data loading on top of Burn tensors.
//!
//! This crate provides:
//! - [`SequenceIndex`]: eager indexing of per-sequence sample directories and
//!   random access decoding into `(T, 1, C, H, W)` / `(T, 1)` tensors
//! - [`collate`]: time-major concatenation of loaded samples into a batch
//! - [`SequenceLoader`]: batch iteration (shuffle, drop-last, parallel decode)
//!
//! Sample directories and frame files are ordered by byte-wise comparison of
//! their file names, so datasets must use zero-padded names.

pub mod batch;
pub mod index;
pub mod loader;
pub mod types;

pub use batch::{collate, SequenceBatch};
pub use index::{SequenceIndex, SequenceIndexBuilder, DEFAULT_FRAME_EXTENSION};
pub use loader::{LoaderConfig, SequenceLoader};
pub use types::*;
