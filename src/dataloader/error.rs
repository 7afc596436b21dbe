use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    // IO and system errors
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid file pattern: {0}")]
    PatternError(#[from] glob::PatternError),

    // Config errors
    #[error("Invalid dataset split ratios. Train: {train}, Test: {test}")]
    InvalidSplitRatios { train: f64, test: f64 },

    #[error("Invalid image shape. Size: {size}, Channels: {channels}")]
    InvalidImageShape { size: u32, channels: u32 },

    #[error("Invalid batch settings: {0}")]
    InvalidBatchSettings(String),

    // Label errors
    #[error("Kaggle image name is not a numeric id: {0}")]
    InvalidKaggleId(PathBuf),

    #[error("Cannot derive class label from file name: {0}")]
    UnknownClass(PathBuf),

    #[error("No label in manifest for: {0}")]
    MissingLabel(PathBuf),

    // Record errors
    #[error("Record checksum mismatch in {what} at offset {offset}")]
    Checksum { what: &'static str, offset: u64 },

    #[error("Truncated record at offset {0}")]
    TruncatedRecord(u64),

    #[error("Record decode error: {0}")]
    DecodeError(#[from] prost::DecodeError),

    #[error("Record is missing feature `{0}`")]
    MissingFeature(&'static str),

    #[error("Image data has length {actual}, expected {expected}")]
    ImageLength { expected: usize, actual: usize },

    #[error("Shard not found: {0}")]
    ShardNotFound(PathBuf),

    // Pipeline errors
    #[error("Worker thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Record reader thread panicked")]
    ReaderPanicked,
}
