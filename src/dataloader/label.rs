use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::DatasetError;

pub const CAT: i64 = 0;
pub const DOG: i64 = 1;

/// How the integer label of each record is derived.
#[derive(Clone, Debug)]
pub enum LabelSource {
    /// `1` when the path contains "dog" anywhere, else `0`.
    Filename,
    /// Like `Filename` but only looks at the first `.` separated token of the
    /// file name, which must be exactly `cat` or `dog`.
    StrictFilename,
    /// Kaggle test set: the label is the numeric id in the file stem.
    KaggleId,
    /// Explicit path to label mapping.
    Manifest(HashMap<PathBuf, i64>),
}

impl LabelSource {
    pub fn label_for(&self, path: &Path) -> Result<i64, DatasetError> {
        match self {
            LabelSource::Filename => Ok(label_from_path(path)),
            LabelSource::StrictFilename => class_from_file_name(path),
            LabelSource::KaggleId => kaggle_id(path),
            LabelSource::Manifest(labels) => labels
                .get(path)
                .copied()
                .ok_or_else(|| DatasetError::MissingLabel(path.to_owned())),
        }
    }
}

pub fn label_from_path(path: &Path) -> i64 {
    if path.to_string_lossy().contains("dog") {
        DOG
    } else {
        CAT
    }
}

pub fn class_from_file_name(path: &Path) -> Result<i64, DatasetError> {
    let class = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next());

    match class {
        Some("cat") => Ok(CAT),
        Some("dog") => Ok(DOG),
        _ => Err(DatasetError::UnknownClass(path.to_owned())),
    }
}

pub fn kaggle_id(path: &Path) -> Result<i64, DatasetError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse::<i64>().ok())
        .ok_or_else(|| DatasetError::InvalidKaggleId(path.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dog_anywhere_in_path() {
        assert_eq!(label_from_path(Path::new("raw/train/dog.1.jpg")), DOG);
        assert_eq!(label_from_path(Path::new("raw/train/cat.1.jpg")), CAT);
        // The substring rule also fires on directories
        assert_eq!(label_from_path(Path::new("hotdogs/cat.1.jpg")), DOG);
    }

    #[test]
    fn strict_rule_only_reads_file_name() {
        assert_eq!(class_from_file_name(Path::new("hotdogs/cat.1.jpg")).unwrap(), CAT);
        assert_eq!(class_from_file_name(Path::new("raw/dog.99.jpg")).unwrap(), DOG);
        assert!(matches!(
            class_from_file_name(Path::new("raw/doge.1.jpg")),
            Err(DatasetError::UnknownClass(_))
        ));
    }

    #[test]
    fn kaggle_ids_from_stem() {
        assert_eq!(kaggle_id(Path::new("raw/test/1234.jpg")).unwrap(), 1234);
        assert_eq!(LabelSource::KaggleId.label_for(Path::new("7.jpg")).unwrap(), 7);
        assert!(matches!(
            kaggle_id(Path::new("raw/test/cat.1.jpg")),
            Err(DatasetError::InvalidKaggleId(_))
        ));
    }

    #[test]
    fn manifest_lookup() {
        let labels = HashMap::from([(PathBuf::from("a.jpg"), 5)]);
        let source = LabelSource::Manifest(labels);
        assert_eq!(source.label_for(Path::new("a.jpg")).unwrap(), 5);
        assert!(matches!(
            source.label_for(Path::new("b.jpg")),
            Err(DatasetError::MissingLabel(_))
        ));
    }
}
