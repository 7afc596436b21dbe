use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::dataloader::config::DatasetConfig;
use crate::dataloader::error::DatasetError;

use super::batch::{Batch, Sample};
use super::example::ImageRecord;
use super::tfrecord::RecordReader;

type SampleResult = Result<Sample, DatasetError>;

#[derive(Clone, Copy, Debug)]
pub struct InputOptions {
    pub batch_size: usize,
    /// Passes over the shard before the pipeline runs dry. `None` repeats
    /// until the pipeline is closed.
    pub num_epochs: Option<usize>,
    /// Skip the [-0.5, 0.5] rescaling so pixels stay viewable.
    pub display: bool,
    /// Keep labels as integer ids instead of float targets.
    pub predict: bool,
}

impl InputOptions {
    pub fn new(config: &DatasetConfig) -> Self {
        InputOptions {
            batch_size: config.batch_size,
            num_epochs: Some(1),
            display: false,
            predict: false,
        }
    }
}

/// Opens the shard `name` and returns shuffled batches of its records.
pub fn inputs(
    name: &str,
    options: InputOptions,
    config: &DatasetConfig,
) -> Result<BatchPipeline, DatasetError> {
    let config = config.clone().with_batch_size(options.batch_size)?.build()?;
    BatchPipeline::open(&config.shard_path(name), options, &config)
}

/// A shard reader thread feeding a bounded shuffle buffer.
///
/// Dropping or closing the pipeline disconnects the queue and joins the
/// reader thread.
pub struct BatchPipeline {
    receiver: Option<Receiver<SampleResult>>,
    reader: Option<JoinHandle<()>>,
    buffer: Vec<Sample>,
    rng: StdRng,
    image_len: usize,
    batch_size: usize,
    min_after_dequeue: usize,
    capacity: usize,
    drop_last: bool,
    display: bool,
    predict: bool,
    next_batch: usize,
    exhausted: bool,
    failed: bool,
}

impl BatchPipeline {
    pub fn open(
        path: &Path,
        options: InputOptions,
        config: &DatasetConfig,
    ) -> Result<Self, DatasetError> {
        // Opened here so a missing shard fails before any thread starts
        let first_pass = RecordReader::open(path)?;

        let (sender, receiver) = bounded(options.batch_size);
        let path = path.to_owned();
        let image_len = config.image_len();
        let num_epochs = options.num_epochs;

        let reader = thread::Builder::new()
            .name("shard-reader".to_string())
            .spawn(move || read_epochs(path, first_pass, num_epochs, image_len, sender))?;

        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(BatchPipeline {
            receiver: Some(receiver),
            reader: Some(reader),
            buffer: Vec::with_capacity(config.capacity),
            rng,
            image_len,
            batch_size: options.batch_size,
            min_after_dequeue: config.min_after_dequeue,
            capacity: config.capacity,
            drop_last: config.drop_last,
            display: options.display,
            predict: options.predict,
            next_batch: 0,
            exhausted: false,
            failed: false,
        })
    }

    /// Stops the reader thread and waits for it.
    pub fn close(mut self) -> Result<(), DatasetError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), DatasetError> {
        self.receiver.take();
        match self.reader.take() {
            Some(handle) => handle.join().map_err(|_| DatasetError::ReaderPanicked),
            None => Ok(()),
        }
    }

    /// Blocks until the buffer holds `min_after_dequeue + batch_size` samples
    /// or the reader is done. After the first batch, samples already queued
    /// are also taken up to `capacity`.
    fn fill_buffer(&mut self) -> Result<(), DatasetError> {
        let threshold = self.min_after_dequeue + self.batch_size;
        let limit = if self.next_batch == 0 {
            threshold
        } else {
            self.capacity
        };

        while !self.exhausted && self.buffer.len() < limit {
            let received = match &self.receiver {
                Some(receiver) if self.buffer.len() < threshold => {
                    receiver.recv().map_err(|_| TryRecvError::Disconnected)
                }
                Some(receiver) => receiver.try_recv(),
                None => break,
            };

            match received {
                Ok(Ok(sample)) => self.buffer.push(sample),
                Ok(Err(err)) => return Err(err),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.exhausted = true;
                    self.shutdown()?;
                }
            }
        }

        Ok(())
    }

    fn take_random(&mut self, count: usize) -> Vec<Sample> {
        (0..count)
            .map(|_| {
                let idx = self.rng.gen_range(0..self.buffer.len());
                self.buffer.swap_remove(idx)
            })
            .collect()
    }
}

impl Iterator for BatchPipeline {
    type Item = Result<Batch, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Err(err) = self.fill_buffer() {
            self.failed = true;
            if let Err(join_err) = self.shutdown() {
                warn!("{}", join_err);
            }
            return Some(Err(err));
        }

        let available = self.buffer.len();
        if available == 0 || (available < self.batch_size && self.drop_last) {
            if available > 0 {
                debug!("Dropping {} samples short of a full batch", available);
                self.buffer.clear();
            }
            return None;
        }

        let samples = self.take_random(available.min(self.batch_size));
        let batch = Batch::from_samples(
            samples,
            self.image_len,
            self.next_batch,
            self.display,
            self.predict,
        );
        self.next_batch += 1;

        Some(Ok(batch))
    }
}

impl Drop for BatchPipeline {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("{}", err);
        }
    }
}

fn read_epochs(
    path: PathBuf,
    first_pass: RecordReader<std::io::BufReader<std::fs::File>>,
    num_epochs: Option<usize>,
    image_len: usize,
    sender: Sender<SampleResult>,
) {
    let mut first_pass = Some(first_pass);
    let mut epoch = 0;

    while num_epochs.map_or(true, |n| epoch < n) {
        let reader = match first_pass.take() {
            Some(reader) => reader,
            None => match RecordReader::open(&path) {
                Ok(reader) => reader,
                Err(err) => {
                    let _ = sender.send(Err(err));
                    return;
                }
            },
        };

        let mut records_this_epoch = 0;
        for record in reader {
            let sample = record
                .and_then(|bytes| ImageRecord::decode(&bytes))
                .and_then(|record| to_sample(record, image_len));
            let failed = sample.is_err();

            // A closed receiver means the consumer is gone
            if sender.send(sample).is_err() || failed {
                return;
            }
            records_this_epoch += 1;
        }

        debug!("Finished epoch {} of {} ({} records)", epoch + 1, path.display(), records_this_epoch);

        // Repeating an empty shard forever would never yield anything
        if records_this_epoch == 0 {
            return;
        }
        epoch += 1;
    }
}

fn to_sample(record: ImageRecord, image_len: usize) -> SampleResult {
    if record.image_raw.len() != image_len {
        return Err(DatasetError::ImageLength {
            expected: image_len,
            actual: record.image_raw.len(),
        });
    }

    Ok(Sample {
        image: record.image_raw,
        label: record.label,
    })
}
