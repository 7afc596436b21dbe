//! Turns a directory of cat and dog JPEGs into TFRecord shards and reads them
//! back as shuffled, normalised batches.

pub mod dataloader;
pub mod maintenance;
pub mod records;
pub mod utils;

pub use dataloader::config::DatasetConfig;
pub use dataloader::error::DatasetError;
pub use records::pipeline::{inputs, BatchPipeline, InputOptions};
