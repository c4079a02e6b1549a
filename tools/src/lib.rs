//! Experiment configuration and command-line tooling for sequential MNIST.

pub mod config;

pub use config::{AnnealSection, DatasetSection, ExperimentConfig, TrainSection, ValidSection};
