use std::fs;
use std::path::PathBuf;

use seq_tools::ExperimentConfig;

fn write_temp_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("seq-mnist.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn defaults_match_reference_experiment() {
    let cfg = ExperimentConfig::default();
    assert_eq!(cfg.exp_name, "multiscalemnist");
    assert!(!cfg.resume);
    assert_eq!(cfg.device, "cpu");
    assert_eq!(cfg.dataset.root, PathBuf::from("dataset/"));
    assert_eq!(cfg.dataset.seq_len, 10);
    assert_eq!(cfg.train.batch_size, 128);
    assert_eq!(cfg.train.max_epochs, 1000);
    assert!((cfg.train.model_lr - 1e-4).abs() < 1e-12);
    assert_eq!(cfg.valid.batch_size, 128);
    assert!((cfg.anneal.initial - 0.70).abs() < 1e-12);
    assert!((cfg.anneal.final_value - 0.01).abs() < 1e-12);
    assert_eq!(cfg.anneal.total_steps, 40000);
    assert_eq!(cfg.anneal.interval, 500);
    assert_eq!(cfg.logdir, PathBuf::from("logs/"));
    assert_eq!(cfg.checkpointdir, PathBuf::from("checkpoints/"));
}

#[test]
fn empty_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "");
    let cfg = ExperimentConfig::from_path(&path).expect("load config");
    assert_eq!(cfg, ExperimentConfig::default());
}

#[test]
fn partial_sections_override_only_given_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
exp_name = "len5"
device = "cuda:0"

[dataset]
root = "/data/seq_mnist"
seq_len = 5

[train]
batch_size = 16

[anneal]
final = 0.05
"#,
    );
    let cfg = ExperimentConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.exp_name, "len5");
    assert_eq!(cfg.device, "cuda:0");
    assert_eq!(cfg.dataset.root, PathBuf::from("/data/seq_mnist"));
    assert_eq!(cfg.dataset.seq_len, 5);
    assert_eq!(cfg.train.batch_size, 16);
    assert_eq!(cfg.train.max_epochs, 1000);
    assert_eq!(cfg.valid.batch_size, 128);
    assert!((cfg.anneal.final_value - 0.05).abs() < 1e-12);
    assert!((cfg.anneal.initial - 0.70).abs() < 1e-12);
}

#[test]
fn malformed_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "[train\nbatch_size = ");
    assert!(ExperimentConfig::from_path(&path).is_err());
}

#[test]
fn wrong_value_type_is_an_error() {
    assert!(ExperimentConfig::from_toml_str("[valid]\nbatch_size = \"many\"\n").is_err());
}
