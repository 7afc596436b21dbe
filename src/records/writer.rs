use std::path::PathBuf;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::dataloader::config::DatasetConfig;
use crate::dataloader::error::DatasetError;
use crate::dataloader::image_loader::load_image;
use crate::dataloader::label::LabelSource;

use super::example::ImageRecord;
use super::tfrecord::RecordWriter;

// Images decoded per worker before the writer drains them
const IMAGES_PER_WORKER: usize = 8;

/// Writes labelled images into `<data_dir>/<name>.tfrecords`.
///
/// Owns the decode pool so every shard written through the same encoder
/// reuses the same worker threads.
pub struct ShardEncoder<'a> {
    config: &'a DatasetConfig,
    pool: ThreadPool,
}

impl<'a> ShardEncoder<'a> {
    pub fn new(config: &'a DatasetConfig) -> Result<Self, DatasetError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|idx| format!("shard-decode-{}", idx))
            .build()?;

        Ok(ShardEncoder { config, pool })
    }

    /// Saves `files` in order to the shard called `name`, replacing any
    /// previous shard of that name. Returns the number of records written.
    pub fn save_records(
        &self,
        files: &[PathBuf],
        name: &str,
        labels: &LabelSource,
    ) -> Result<usize, DatasetError> {
        std::fs::create_dir_all(&self.config.data_dir)?;
        let record_file = self.config.shard_path(name);
        let mut writer = RecordWriter::create(&record_file)?;

        info!("Writing {}...", record_file.display());

        let chunk_size = (self.config.threads * IMAGES_PER_WORKER).max(1);
        let mut written = 0;

        for chunk in files.chunks(chunk_size) {
            let records = self.pool.install(|| {
                chunk
                    .par_iter()
                    .map(|path| -> Result<ImageRecord, DatasetError> {
                        let image_raw = load_image(path, self.config)?;
                        let label = labels.label_for(path)?;
                        Ok(ImageRecord { image_raw, label })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })?;

            for record in &records {
                writer.write_record(&record.encode())?;
            }
            written += records.len();
            debug!("{}: {}/{} records", name, written, files.len());
        }

        writer.flush()?;
        info!("Writing {} done, {} records", record_file.display(), written);

        Ok(written)
    }
}
