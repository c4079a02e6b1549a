use anyhow::Context;
use burn_ndarray::NdArray;
use clap::{Parser, ValueEnum};
use seq_dataset::{DatasetMode, SequenceIndex, SequenceLoader};
use seq_tools::ExperimentConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Train,
    Valid,
}

impl From<ModeArg> for DatasetMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Train => DatasetMode::Train,
            ModeArg::Valid => DatasetMode::Valid,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "inspect_dataset",
    about = "Index a sequential MNIST split and print collated batch shapes"
)]
struct Args {
    /// Experiment config (defaults to $SEQ_MNIST_CONFIG or seq-mnist.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dataset root; overrides dataset.root from the config.
    #[arg(long)]
    root: Option<PathBuf>,
    /// Split to inspect.
    #[arg(long, value_enum, default_value_t = ModeArg::Valid)]
    mode: ModeArg,
    /// Number of batches to load.
    #[arg(long, default_value_t = 1)]
    batches: usize,
    /// Fail on sequences whose length differs from dataset.seq_len.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Shuffle seed for the train split.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => ExperimentConfig::from_path(path)?,
        None => ExperimentConfig::load()?,
    };
    let root = args.root.clone().unwrap_or_else(|| cfg.dataset.root.clone());
    let mode = DatasetMode::from(args.mode);

    let index = SequenceIndex::builder(&root)
        .mode(mode)
        .seq_len(cfg.dataset.seq_len)
        .strict_seq_len(args.strict)
        .build()
        .with_context(|| format!("indexing {} split under {}", mode, root.display()))?;
    println!(
        "{}: {} sequences in {}",
        mode,
        index.len(),
        index.split_dir().display()
    );

    let mut loader_cfg = cfg.loader_config(mode);
    if let Some(seed) = args.seed {
        loader_cfg = loader_cfg.seed(seed);
    }
    let mut loader = SequenceLoader::new(&index, loader_cfg)?;
    println!("{} batches per epoch", loader.num_batches());

    let device = Default::default();
    for n in 0..args.batches {
        let Some(batch) = loader.next_batch::<NdArray<f32>>(&device)? else {
            break;
        };
        let mean_counts = batch
            .counts
            .clone()
            .mean_dim(1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        println!(
            "batch {n}: images {:?} counts {:?} mean objects per frame {:?}",
            batch.images.dims(),
            batch.counts.dims(),
            mean_counts
        );
    }
    println!("avg load {:.2?} per batch", loader.avg_load_time());
    Ok(())
}
