use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use catsdogs_shards::dataloader::info::{
    count_images, print_dataset_info, print_shard_summary, shard_summary,
};
use catsdogs_shards::dataloader::split::DatasetSplit;
use catsdogs_shards::maintenance::{self, KAGGLE_SHARD};
use catsdogs_shards::utils::logging::{init_logging, LogConfig};
use catsdogs_shards::{DatasetConfig, DatasetError};

/// Builds the cats vs dogs TFRecord shards.
///
/// Without a subcommand all existing shards are deleted and regenerated.
#[derive(Parser, Debug)]
#[command(name = "catsdogs-shards")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Seed for the train/validation/test split, random when omitted
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    src_dir: Option<PathBuf>,

    #[arg(long)]
    kaggle_dir: Option<PathBuf>,

    /// Decode threads, defaults to the number of CPUs
    #[arg(long)]
    threads: Option<usize>,

    /// Side length images are resized to
    #[arg(long)]
    image_size: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete all shards, then regenerate train, validation, test and kaggle
    Rebuild,
    /// Delete all shards
    Clean,
    /// Print split sizes and the record count of each shard
    Info,
}

impl Cli {
    fn dataset_config(&self) -> Result<DatasetConfig, DatasetError> {
        let mut config = DatasetConfig::default();
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.src_dir {
            config.src_dir = dir.clone();
        }
        if let Some(dir) = &self.kaggle_dir {
            config.kaggle_dir = dir.clone();
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(size) = self.image_size {
            config.image_size = size;
        }
        config.shuffle_seed = self.seed;
        config.build()
    }
}

fn run(cli: &Cli) -> Result<(), DatasetError> {
    let config = cli.dataset_config()?;

    match cli.command.as_ref().unwrap_or(&Commands::Rebuild) {
        Commands::Rebuild => maintenance::rebuild(&config),
        Commands::Clean => maintenance::clean_all_records(&config).map(|_| ()),
        Commands::Info => {
            let labelled = count_images(&config.src_dir, &config.image_pattern)?;
            let kaggle = count_images(&config.kaggle_dir, &config.image_pattern)?;
            print_dataset_info(labelled, kaggle, &config);
            println!();

            let mut names: Vec<&str> = DatasetSplit::ALL.iter().map(|s| s.shard_name()).collect();
            names.push(KAGGLE_SHARD);
            let shards = shard_summary(&names, &config)?;
            print_shard_summary(&shards);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    if let Err(err) = init_logging(&log_config) {
        eprintln!("{}", err);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
