pub mod batch;
pub mod example;
pub mod pipeline;
pub mod tfrecord;
pub mod writer;

use std::path::Path;

use crate::dataloader::error::DatasetError;

use example::ImageRecord;
use tfrecord::RecordReader;

pub const SHARD_EXTENSION: &str = "tfrecords";

/// Reads every record of the shard at `path` in file order, without shuffling.
pub fn read_shard(
    path: &Path,
) -> Result<impl Iterator<Item = Result<ImageRecord, DatasetError>>, DatasetError> {
    let reader = RecordReader::open(path)?;
    Ok(reader.map(|bytes| bytes.and_then(|bytes| ImageRecord::decode(&bytes))))
}
