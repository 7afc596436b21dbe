/// One decoded record waiting in the shuffle buffer.
#[derive(Clone, Debug)]
pub struct Sample {
    pub image: Vec<u8>,
    pub label: i64,
}

pub enum ImageData {
    /// Raw pixel bytes, kept when reading for display.
    U8(Box<[u8]>),
    /// Pixels rescaled to [-0.5, 0.5].
    F32(Box<[f32]>),
}

pub enum LabelData {
    /// Training targets.
    F32(Box<[f32]>),
    /// Kaggle image ids, untouched.
    I64(Box<[i64]>),
}

pub struct Batch {
    pub images: ImageData,
    pub labels: LabelData,
    pub samples_in_batch: usize,
    pub bytes_per_sample: usize,
    pub batch_number: usize,
}

pub fn normalize_pixel(value: u8) -> f32 {
    value as f32 * (1.0 / 255.0) - 0.5
}

impl Batch {
    pub fn from_samples(
        samples: Vec<Sample>,
        bytes_per_sample: usize,
        batch_number: usize,
        display: bool,
        predict: bool,
    ) -> Batch {
        let samples_in_batch = samples.len();
        let mut pixels = Vec::with_capacity(samples_in_batch * bytes_per_sample);
        let mut ids = Vec::with_capacity(samples_in_batch);

        for sample in samples {
            debug_assert_eq!(sample.image.len(), bytes_per_sample);
            pixels.extend_from_slice(&sample.image);
            ids.push(sample.label);
        }

        let images = if display {
            ImageData::U8(pixels.into_boxed_slice())
        } else {
            ImageData::F32(pixels.into_iter().map(normalize_pixel).collect())
        };

        let labels = if predict {
            LabelData::I64(ids.into_boxed_slice())
        } else {
            LabelData::F32(ids.into_iter().map(|id| id as f32).collect())
        };

        Batch {
            images,
            labels,
            samples_in_batch,
            bytes_per_sample,
            batch_number,
        }
    }

    /// `(samples, flattened image length)`
    pub fn images_shape(&self) -> (usize, usize) {
        (self.samples_in_batch, self.bytes_per_sample)
    }

    /// Labels are a column vector, `(samples, 1)`.
    pub fn labels_shape(&self) -> (usize, usize) {
        (self.samples_in_batch, 1)
    }

    pub fn image_u8(&self, idx: usize) -> Option<&[u8]> {
        match &self.images {
            ImageData::U8(data) => data.chunks_exact(self.bytes_per_sample).nth(idx),
            ImageData::F32(_) => None,
        }
    }

    pub fn image_f32(&self, idx: usize) -> Option<&[f32]> {
        match &self.images {
            ImageData::F32(data) => data.chunks_exact(self.bytes_per_sample).nth(idx),
            ImageData::U8(_) => None,
        }
    }

    /// Label of sample `idx` as an integer, whichever way it is stored.
    pub fn label(&self, idx: usize) -> Option<i64> {
        match &self.labels {
            LabelData::F32(labels) => labels.get(idx).map(|&l| l as i64),
            LabelData::I64(labels) => labels.get(idx).copied(),
        }
    }

    pub fn to_f32(&self) -> Vec<f32> {
        match &self.images {
            ImageData::U8(data) => data.iter().map(|&x| x as f32).collect(),
            ImageData::F32(data) => data.to_vec(),
        }
    }
}
