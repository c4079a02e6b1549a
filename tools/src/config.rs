use std::path::{Path, PathBuf};

use anyhow::Context;
use seq_dataset::{DatasetMode, LoaderConfig};
use serde::Deserialize;

const DEFAULT_CONFIG_NAME: &str = "seq-mnist.toml";
const CONFIG_ENV: &str = "SEQ_MNIST_CONFIG";

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSection {
    /// Dataset root holding the `train/` and `test/` splits.
    pub root: PathBuf,
    /// Expected frames per sequence.
    pub seq_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainSection {
    pub batch_size: usize,
    pub model_lr: f64,
    pub max_epochs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidSection {
    pub batch_size: usize,
}

/// Annealing schedule consumed by the training loop.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealSection {
    pub initial: f64,
    pub final_value: f64,
    pub total_steps: u64,
    pub interval: u64,
}

/// Experiment configuration, built once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub exp_name: String,
    pub resume: bool,
    pub device: String,
    pub dataset: DatasetSection,
    pub train: TrainSection,
    pub valid: ValidSection,
    pub anneal: AnnealSection,
    pub logdir: PathBuf,
    pub checkpointdir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            exp_name: "multiscalemnist".to_string(),
            resume: false,
            device: "cpu".to_string(),
            dataset: DatasetSection {
                root: PathBuf::from("dataset/"),
                seq_len: 10,
            },
            train: TrainSection {
                batch_size: 128,
                model_lr: 1e-4,
                max_epochs: 1000,
            },
            valid: ValidSection { batch_size: 128 },
            anneal: AnnealSection {
                initial: 0.70,
                final_value: 0.01,
                total_steps: 40000,
                interval: 500,
            },
            logdir: PathBuf::from("logs/"),
            checkpointdir: PathBuf::from("checkpoints/"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    exp_name: Option<String>,
    resume: Option<bool>,
    device: Option<String>,
    dataset: Option<DatasetFile>,
    train: Option<TrainFile>,
    valid: Option<ValidFile>,
    anneal: Option<AnnealFile>,
    logdir: Option<String>,
    checkpointdir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DatasetFile {
    root: Option<String>,
    seq_len: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct TrainFile {
    batch_size: Option<usize>,
    model_lr: Option<f64>,
    max_epochs: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ValidFile {
    batch_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct AnnealFile {
    initial: Option<f64>,
    #[serde(rename = "final")]
    final_value: Option<f64>,
    total_steps: Option<u64>,
    interval: Option<u64>,
}

impl ExperimentConfig {
    /// Load from `$SEQ_MNIST_CONFIG`, else `seq-mnist.toml`, else defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME));
        let cfg = if path.exists() {
            Self::from_path(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Self::default()
        };
        cfg.warn_if_invalid();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ConfigFile) -> Self {
        let d = Self::default();
        let dataset = file.dataset.unwrap_or_default();
        let train = file.train.unwrap_or_default();
        let valid = file.valid.unwrap_or_default();
        let anneal = file.anneal.unwrap_or_default();

        ExperimentConfig {
            exp_name: file.exp_name.unwrap_or(d.exp_name),
            resume: file.resume.unwrap_or(d.resume),
            device: file.device.unwrap_or(d.device),
            dataset: DatasetSection {
                root: dataset
                    .root
                    .map(|v| expand_path(&v))
                    .unwrap_or(d.dataset.root),
                seq_len: dataset.seq_len.unwrap_or(d.dataset.seq_len),
            },
            train: TrainSection {
                batch_size: train.batch_size.unwrap_or(d.train.batch_size),
                model_lr: train.model_lr.unwrap_or(d.train.model_lr),
                max_epochs: train.max_epochs.unwrap_or(d.train.max_epochs),
            },
            valid: ValidSection {
                batch_size: valid.batch_size.unwrap_or(d.valid.batch_size),
            },
            anneal: AnnealSection {
                initial: anneal.initial.unwrap_or(d.anneal.initial),
                final_value: anneal.final_value.unwrap_or(d.anneal.final_value),
                total_steps: anneal.total_steps.unwrap_or(d.anneal.total_steps),
                interval: anneal.interval.unwrap_or(d.anneal.interval),
            },
            logdir: file.logdir.map(|v| expand_path(&v)).unwrap_or(d.logdir),
            checkpointdir: file
                .checkpointdir
                .map(|v| expand_path(&v))
                .unwrap_or(d.checkpointdir),
        }
    }

    /// Batch loader settings for `mode`.
    pub fn loader_config(&self, mode: DatasetMode) -> LoaderConfig {
        match mode {
            DatasetMode::Train => LoaderConfig::train(self.train.batch_size),
            DatasetMode::Valid => LoaderConfig::valid(self.valid.batch_size),
        }
    }

    fn warn_if_invalid(&self) {
        if self.dataset.root.as_os_str().is_empty() {
            tracing::warn!("config: dataset.root is empty; dataset indexing will fail");
        }
        if self.train.batch_size == 0 {
            tracing::warn!("config: train.batch_size is 0; the train loader will refuse it");
        }
        if self.valid.batch_size == 0 {
            tracing::warn!("config: valid.batch_size is 0; the valid loader will refuse it");
        }
    }
}

fn expand_path(raw: &str) -> PathBuf {
    let mut out = raw.to_string();
    if let Some(stripped) = out.strip_prefix('~') {
        if let Ok(home) = std::env::var("HOME") {
            out = format!("{home}{stripped}");
        }
    }
    PathBuf::from(expand_env(&out))
}

/// Replace `${VAR}` with its value; unset variables are left as written.
fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let key = &rest[start + 2..start + 2 + len];
        match std::env::var(key) {
            Ok(val) => out.push_str(&val),
            Err(_) => out.push_str(&rest[start..start + 3 + len]),
        }
        rest = &rest[start + 3 + len..];
    }
    out.push_str(rest);
    out
}
