use std::path::PathBuf;

use super::error::DatasetError;

/// Parameters shared by the splitter, the record writer and the batch reader.
///
/// Built once at startup and only ever handed out by shared reference.
#[derive(Clone, Debug)]
pub struct DatasetConfig {
    pub image_size: u32,
    pub image_channels: u32,
    pub data_dir: PathBuf,
    pub src_dir: PathBuf,
    pub kaggle_dir: PathBuf,
    /// Reserved for the training process that consumes the shards.
    pub log_dir: PathBuf,
    /// Reserved for the training process that consumes the shards.
    pub checkpoint_dir: PathBuf,
    pub image_pattern: String,
    /// Fraction of all labelled images that goes to the train shard.
    pub train_ratio: f64,
    /// Fraction of all labelled images that goes to the test shard.
    /// Validation gets whatever is left after train and test.
    pub test_ratio: f64,
    pub batch_size: usize,
    pub threads: usize,
    pub shuffle_seed: Option<u64>,
    pub sort_dataset: bool,
    pub min_after_dequeue: usize,
    pub capacity: usize,
    pub drop_last: bool,
}

impl DatasetConfig {
    pub fn build(self) -> Result<Self, DatasetError> {
        check_split_ratios(self.train_ratio, self.test_ratio)?;

        if self.image_size == 0 || !matches!(self.image_channels, 1 | 3 | 4) {
            return Err(DatasetError::InvalidImageShape {
                size: self.image_size,
                channels: self.image_channels,
            });
        }

        if self.batch_size == 0 {
            return Err(DatasetError::InvalidBatchSettings(
                "batch_size must be at least 1".into(),
            ));
        }

        let threshold = self
            .min_after_dequeue
            .checked_add(self.batch_size)
            .ok_or_else(|| {
                DatasetError::InvalidBatchSettings(format!(
                    "min_after_dequeue {} + batch_size {} overflows",
                    self.min_after_dequeue, self.batch_size
                ))
            })?;
        if self.capacity < threshold {
            return Err(DatasetError::InvalidBatchSettings(format!(
                "capacity {} is below min_after_dequeue {} + batch_size {}",
                self.capacity, self.min_after_dequeue, self.batch_size
            )));
        }

        Ok(self)
    }

    /// Same settings with a different batch size. A shuffle queue capacity
    /// still at its derived default follows the new batch size; an explicitly
    /// set capacity is kept.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, DatasetError> {
        if default_capacity(self.min_after_dequeue, self.batch_size) == Some(self.capacity) {
            self.capacity = default_capacity(self.min_after_dequeue, batch_size).ok_or_else(|| {
                DatasetError::InvalidBatchSettings(format!(
                    "capacity for batch_size {} overflows",
                    batch_size
                ))
            })?;
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// The length of flattened image vectors.
    pub fn image_len(&self) -> usize {
        let size = self.image_size as usize;
        size * size * self.image_channels as usize
    }

    /// The dimensions of unflattened images, optionally with the channel dimension.
    pub fn image_dim(&self, include_channels: bool) -> Vec<usize> {
        let size = self.image_size as usize;
        if include_channels {
            vec![size, size, self.image_channels as usize]
        } else {
            vec![size, size]
        }
    }

    pub fn shard_path(&self, name: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", name, crate::records::SHARD_EXTENSION))
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        let batch_size = 50;
        let min_after_dequeue = 1000;
        Self {
            image_size: 299,
            image_channels: 3,
            data_dir: PathBuf::from("./data/"),
            src_dir: PathBuf::from("./raw/train/"),
            kaggle_dir: PathBuf::from("./raw/test/"),
            log_dir: PathBuf::from("./log/"),
            checkpoint_dir: PathBuf::from("./checkpoint/"),
            image_pattern: "*.jpg".to_string(),
            train_ratio: 0.8,
            test_ratio: 0.15,
            batch_size,
            threads: num_cpus::get(),
            shuffle_seed: None,
            sort_dataset: true,
            min_after_dequeue,
            capacity: default_capacity(min_after_dequeue, batch_size).unwrap_or(usize::MAX),
            drop_last: true,
        }
    }
}

fn default_capacity(min_after_dequeue: usize, batch_size: usize) -> Option<usize> {
    batch_size
        .checked_mul(3)
        .and_then(|batches| batches.checked_add(min_after_dequeue))
}

fn check_split_ratios(train_ratio: f64, test_ratio: f64) -> Result<(), DatasetError> {
    if train_ratio <= 0.0
        || train_ratio >= 1.0
        || test_ratio <= 0.0
        || test_ratio >= 1.0
        || train_ratio + test_ratio >= 1.0
    {
        return Err(DatasetError::InvalidSplitRatios {
            train: train_ratio,
            test: test_ratio,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DatasetConfig::default().build().unwrap();
        assert_eq!(config.image_len(), 299 * 299 * 3);
        assert_eq!(config.image_dim(false), vec![299, 299]);
        assert_eq!(config.image_dim(true), vec![299, 299, 3]);
        assert_eq!(config.capacity, 1150);
        assert_eq!(config.log_dir, PathBuf::from("./log/"));
        assert_eq!(config.checkpoint_dir, PathBuf::from("./checkpoint/"));
    }

    #[test]
    fn rejects_bad_ratios() {
        let config = DatasetConfig {
            train_ratio: 0.9,
            test_ratio: 0.2,
            ..Default::default()
        };
        assert!(matches!(
            config.build(),
            Err(DatasetError::InvalidSplitRatios { .. })
        ));

        let config = DatasetConfig {
            train_ratio: 0.0,
            ..Default::default()
        };
        assert!(config.build().is_err());

        // Nothing would be left for validation
        let config = DatasetConfig {
            train_ratio: 0.8,
            test_ratio: 0.2,
            ..Default::default()
        };
        assert!(matches!(
            config.build(),
            Err(DatasetError::InvalidSplitRatios { .. })
        ));
    }

    #[test]
    fn rejects_bad_image_shape() {
        let config = DatasetConfig {
            image_channels: 2,
            ..Default::default()
        };
        assert!(matches!(
            config.build(),
            Err(DatasetError::InvalidImageShape { size: 299, channels: 2 })
        ));
    }

    #[test]
    fn batch_size_moves_capacity() {
        let config = DatasetConfig::default().with_batch_size(4).unwrap();
        assert_eq!(config.capacity, 1012);
        assert!(config.build().is_ok());
    }

    #[test]
    fn explicit_capacity_survives_batch_size() {
        let config = DatasetConfig {
            capacity: 5000,
            ..Default::default()
        }
        .build()
        .unwrap()
        .with_batch_size(4)
        .unwrap();
        assert_eq!(config.capacity, 5000);
        assert_eq!(config.batch_size, 4);
    }

    #[test]
    fn huge_batch_size_is_rejected() {
        let result = DatasetConfig::default().with_batch_size(usize::MAX / 2);
        assert!(matches!(result, Err(DatasetError::InvalidBatchSettings(_))));

        let config = DatasetConfig {
            min_after_dequeue: usize::MAX,
            batch_size: 1,
            capacity: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.build(),
            Err(DatasetError::InvalidBatchSettings(_))
        ));
    }

    #[test]
    fn shard_path_uses_extension() {
        let config = DatasetConfig {
            data_dir: PathBuf::from("out"),
            ..Default::default()
        };
        assert_eq!(config.shard_path("train"), PathBuf::from("out/train.tfrecords"));
    }
}
