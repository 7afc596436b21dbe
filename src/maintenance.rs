//! Full rebuild of the record shards.
//!
//! Deleting shards cannot be undone, `clean_all_records` is only meant to run
//! right before `save_all_records`.

use std::path::PathBuf;

use tracing::info;

use crate::dataloader::config::DatasetConfig;
use crate::dataloader::error::DatasetError;
use crate::dataloader::label::LabelSource;
use crate::dataloader::split::{list_images, resolve_seed, split_paths, DatasetSplit};
use crate::records::writer::ShardEncoder;
use crate::records::SHARD_EXTENSION;

pub const KAGGLE_SHARD: &str = "kaggle";

/// Removes every `.tfrecords` file in the data directory.
pub fn clean_all_records(config: &DatasetConfig) -> Result<Vec<PathBuf>, DatasetError> {
    if !config.data_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    for entry in std::fs::read_dir(&config.data_dir)? {
        let path = entry?.path();
        let is_shard = path.is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(SHARD_EXTENSION);
        if is_shard {
            info!("Removing {}", path.display());
            std::fs::remove_file(&path)?;
            removed.push(path);
        }
    }

    removed.sort();
    Ok(removed)
}

/// Splits the labelled images and saves the validation, test and train shards.
pub fn save_training_records(
    encoder: &ShardEncoder,
    config: &DatasetConfig,
) -> Result<(), DatasetError> {
    let files = list_images(&config.src_dir, &config.image_pattern, config.sort_dataset)?;
    let seed = resolve_seed(config);
    let split = split_paths(files, config.train_ratio, config.test_ratio, seed);

    info!(
        "Split {} images: {} train, {} validation, {} test",
        split.len(),
        split.train.len(),
        split.validation.len(),
        split.test.len()
    );

    for dataset_split in DatasetSplit::ALL {
        encoder.save_records(
            split.files(dataset_split),
            dataset_split.shard_name(),
            &LabelSource::Filename,
        )?;
    }

    Ok(())
}

/// Saves the unlabelled Kaggle images, labelled by their numeric id.
pub fn save_kaggle_records(
    encoder: &ShardEncoder,
    config: &DatasetConfig,
) -> Result<(), DatasetError> {
    let files = list_images(&config.kaggle_dir, &config.image_pattern, config.sort_dataset)?;
    encoder.save_records(&files, KAGGLE_SHARD, &LabelSource::KaggleId)?;
    Ok(())
}

pub fn save_all_records(config: &DatasetConfig) -> Result<(), DatasetError> {
    let encoder = ShardEncoder::new(config)?;
    save_training_records(&encoder, config)?;
    save_kaggle_records(&encoder, config)?;
    Ok(())
}

/// Purges old shards, then regenerates all of them.
pub fn rebuild(config: &DatasetConfig) -> Result<(), DatasetError> {
    clean_all_records(config)?;
    save_all_records(config)
}
