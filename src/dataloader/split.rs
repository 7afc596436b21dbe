use std::path::{Path, PathBuf};

use glob::Pattern;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::config::DatasetConfig;
use super::error::DatasetError;

// Absorbs float noise in ratio products such as 20 * 0.75000000000000002
const RATIO_EPSILON: f64 = 1e-9;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DatasetSplit {
    Train,
    Validation,
    Test,
}

impl DatasetSplit {
    pub const ALL: [DatasetSplit; 3] = [
        DatasetSplit::Validation,
        DatasetSplit::Test,
        DatasetSplit::Train,
    ];

    pub fn shard_name(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Validation => "validation",
            DatasetSplit::Test => "test",
        }
    }
}

#[derive(Debug, Default)]
pub struct SplitAssignment {
    pub train: Vec<PathBuf>,
    pub validation: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

impl SplitAssignment {
    pub fn files(&self, split: DatasetSplit) -> &[PathBuf] {
        match split {
            DatasetSplit::Train => &self.train,
            DatasetSplit::Validation => &self.validation,
            DatasetSplit::Test => &self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lists the files directly inside `dir` whose name matches `pattern`.
pub fn list_images(dir: &Path, pattern: &str, sort: bool) -> Result<Vec<PathBuf>, DatasetError> {
    if !dir.is_dir() {
        return Err(DatasetError::DirectoryNotFound(dir.display().to_string()));
    }

    let pattern = Pattern::new(pattern)?;

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| pattern.matches(name))
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();

    // read_dir order is filesystem dependent, a seeded split is only
    // reproducible on a sorted listing
    if sort {
        files.sort_unstable();
    }

    debug!("Found {} files matching {} in {}", files.len(), pattern, dir.display());
    Ok(files)
}

/// Resolves the configured seed, drawing a fresh one when none is set.
pub fn resolve_seed(config: &DatasetConfig) -> u64 {
    match config.shuffle_seed {
        Some(seed) => seed,
        None => {
            let seed = rand::thread_rng().gen();
            info!("No shuffle seed configured, using {}", seed);
            seed
        }
    }
}

/// Returns `(train, validation, test)` counts for `total` files.
pub fn split_sizes(total: usize, train_ratio: f64, test_ratio: f64) -> (usize, usize, usize) {
    let train_size = (total as f64 * train_ratio).floor() as usize;
    let remainder = total - train_size;

    // test_ratio is a fraction of the whole set, the second split works on the remainder
    let test_fraction = test_ratio / (1.0 - train_ratio);
    let test_size = ((remainder as f64 * test_fraction) - RATIO_EPSILON)
        .ceil()
        .clamp(0.0, remainder as f64) as usize;
    let val_size = remainder - test_size;

    (train_size, val_size, test_size)
}

/// Randomly partitions `files` into train, validation and test sets.
///
/// First the whole set is shuffled and cut into train and a remainder, then
/// the remainder is shuffled and cut into validation and test.
pub fn split_paths(
    mut files: Vec<PathBuf>,
    train_ratio: f64,
    test_ratio: f64,
    seed: u64,
) -> SplitAssignment {
    let (train_size, _, test_size) = split_sizes(files.len(), train_ratio, test_ratio);
    let mut rng = StdRng::seed_from_u64(seed);

    files.shuffle(&mut rng);
    let mut remainder = files.split_off(train_size);
    let train = files;

    remainder.shuffle(&mut rng);
    let validation_size = remainder.len() - test_size;
    let test = remainder.split_off(validation_size);
    let validation = remainder;

    SplitAssignment {
        train,
        validation,
        test,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tempfile::tempdir;

    use super::*;

    fn fake_paths(count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let class = if i % 2 == 0 { "cat" } else { "dog" };
                PathBuf::from(format!("raw/train/{}.{}.jpg", class, i))
            })
            .collect()
    }

    #[test]
    fn sizes_follow_80_5_15() {
        assert_eq!(split_sizes(100, 0.8, 0.15), (80, 5, 15));
        assert_eq!(split_sizes(20, 0.8, 0.15), (16, 1, 3));
        assert_eq!(split_sizes(25000, 0.8, 0.15), (20000, 1250, 3750));
        assert_eq!(split_sizes(0, 0.8, 0.15), (0, 0, 0));
        assert_eq!(split_sizes(1, 0.8, 0.15), (0, 0, 1));
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        for count in [0, 1, 7, 20, 101, 1000] {
            let input = fake_paths(count);
            let split = split_paths(input.clone(), 0.8, 0.15, 727);

            let train: HashSet<_> = split.train.iter().collect();
            let validation: HashSet<_> = split.validation.iter().collect();
            let test: HashSet<_> = split.test.iter().collect();

            assert!(train.is_disjoint(&validation));
            assert!(train.is_disjoint(&test));
            assert!(validation.is_disjoint(&test));

            let union: HashSet<_> = train.union(&validation).chain(test.iter()).copied().collect();
            let expected: HashSet<_> = input.iter().collect();
            assert_eq!(union, expected);
            assert_eq!(split.len(), count);
        }
    }

    #[test]
    fn empty_input_gives_empty_partitions() {
        let split = split_paths(Vec::new(), 0.8, 0.15, 1);
        assert!(split.is_empty());
        assert!(split.train.is_empty() && split.validation.is_empty() && split.test.is_empty());
    }

    #[test]
    fn same_seed_same_split() {
        let a = split_paths(fake_paths(200), 0.8, 0.15, 42);
        let b = split_paths(fake_paths(200), 0.8, 0.15, 42);
        assert_eq!(a.train, b.train);
        assert_eq!(a.validation, b.validation);
        assert_eq!(a.test, b.test);

        let c = split_paths(fake_paths(200), 0.8, 0.15, 43);
        assert_ne!(a.train, c.train);
    }

    #[test]
    fn lists_only_matching_files() {
        let dir = tempdir().unwrap();
        for name in ["dog.2.jpg", "cat.1.jpg", "notes.txt", "cat.3.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let files = list_images(dir.path(), "*.jpg", true).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["cat.1.jpg", "dog.2.jpg"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = list_images(&dir.path().join("absent"), "*.jpg", true);
        assert!(matches!(result, Err(DatasetError::DirectoryNotFound(_))));
    }

    #[test]
    fn configured_seed_is_used() {
        let config = DatasetConfig {
            shuffle_seed: Some(9),
            ..Default::default()
        };
        assert_eq!(resolve_seed(&config), 9);
    }
}
