use std::path::{Path, PathBuf};

use crate::records::read_shard;

use super::config::DatasetConfig;
use super::error::DatasetError;
use super::split::{list_images, split_sizes};

pub struct ShardInfo {
    pub name: String,
    pub path: PathBuf,
    pub records: Option<usize>,
}

pub fn print_dataset_info(total_size: usize, kaggle_size: usize, config: &DatasetConfig) {
    let (train_size, val_size, test_size) =
        split_sizes(total_size, config.train_ratio, config.test_ratio);
    let batch_size = config.batch_size;

    println!("Image Information:");
    println!("-------------------");
    println!("Image size: {}x{}", config.image_size, config.image_size);
    println!("Channels: {}", config.image_channels);
    println!("Bytes per image: {}", config.image_len());
    println!();
    println!("Dataset Information:");
    println!("-------------------");
    println!("Labelled images: {}", total_size);
    println!("Kaggle images: {}", kaggle_size);
    println!("Batch size: {}", batch_size);
    println!();

    let val_ratio = 1.0 - config.train_ratio - config.test_ratio;
    for (name, size, ratio) in [
        ("Train", train_size, config.train_ratio),
        ("Validation", val_size, val_ratio),
        ("Test", test_size, config.test_ratio),
    ] {
        println!("{} split:", name);
        println!("  Size: {} ({:.2}%)", size, ratio * 100.0);
        println!("  Full batches: {}", size / batch_size);
        println!("  Leftover samples: {}", size % batch_size);
        println!();
    }

    println!("Seed: {:?}", config.shuffle_seed);
}

/// Number of images matching `pattern` in `dir`, zero when `dir` does not exist.
pub fn count_images(dir: &Path, pattern: &str) -> Result<usize, DatasetError> {
    match list_images(dir, pattern, false) {
        Ok(files) => Ok(files.len()),
        Err(DatasetError::DirectoryNotFound(_)) => Ok(0),
        Err(err) => Err(err),
    }
}

/// Counts the records of each named shard; shards that do not exist yet get `None`.
pub fn shard_summary(names: &[&str], config: &DatasetConfig) -> Result<Vec<ShardInfo>, DatasetError> {
    names
        .iter()
        .map(|&name| -> Result<ShardInfo, DatasetError> {
            let path = config.shard_path(name);
            let records = if path.exists() {
                let mut count = 0;
                for record in read_shard(&path)? {
                    record?;
                    count += 1;
                }
                Some(count)
            } else {
                None
            };

            Ok(ShardInfo {
                name: name.to_string(),
                path,
                records,
            })
        })
        .collect()
}

pub fn print_shard_summary(shards: &[ShardInfo]) {
    println!("Shards:");
    println!("-------------------");
    for shard in shards {
        match shard.records {
            Some(count) => println!("  {:<12} {:>8} records  {}", shard.name, count, shard.path.display()),
            None => println!("  {:<12} {:>8}  {}", shard.name, "missing", shard.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::records::example::ImageRecord;
    use crate::records::tfrecord::RecordWriter;

    #[test]
    fn counts_existing_shards() {
        let dir = tempdir().unwrap();
        let config = DatasetConfig {
            data_dir: dir.path().to_owned(),
            ..Default::default()
        };

        let mut writer = RecordWriter::create(&config.shard_path("train")).unwrap();
        for label in 0..3 {
            let record = ImageRecord { image_raw: vec![1, 2], label };
            writer.write_record(&record.encode()).unwrap();
        }
        writer.flush().unwrap();

        let summary = shard_summary(&["train", "test"], &config).unwrap();
        assert_eq!(summary[0].records, Some(3));
        assert_eq!(summary[1].records, None);
    }

    #[test]
    fn counts_images_and_reports_listing_errors() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("cat.1.jpg"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        assert_eq!(count_images(dir.path(), "*.jpg").unwrap(), 1);
        assert_eq!(count_images(&dir.path().join("missing"), "*.jpg").unwrap(), 0);
        assert!(matches!(
            count_images(dir.path(), "[.jpg"),
            Err(DatasetError::PatternError(_))
        ));
    }
}
