//! The subset of `tensorflow/core/example/{example,feature}.proto` needed to
//! store one labelled image per record.

use std::collections::HashMap;

use prost::Message;

use crate::dataloader::error::DatasetError;

pub const IMAGE_RAW: &str = "image_raw";
pub const LABEL: &str = "label";

#[derive(Clone, PartialEq, Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Features {
    #[prost(map = "string, message", tag = "1")]
    pub feature: HashMap<String, Feature>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
        #[prost(message, tag = "3")]
        Int64List(super::Int64List),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Int64List {
    #[prost(int64, repeated, tag = "1")]
    pub value: Vec<i64>,
}

/// One decoded record: flattened image bytes and its integer label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    pub image_raw: Vec<u8>,
    pub label: i64,
}

impl ImageRecord {
    pub fn to_example(&self) -> Example {
        let mut feature = HashMap::with_capacity(2);
        feature.insert(
            IMAGE_RAW.to_string(),
            Feature {
                kind: Some(feature::Kind::BytesList(BytesList {
                    value: vec![self.image_raw.clone()],
                })),
            },
        );
        feature.insert(
            LABEL.to_string(),
            Feature {
                kind: Some(feature::Kind::Int64List(Int64List {
                    value: vec![self.label],
                })),
            },
        );

        Example {
            features: Some(Features { feature }),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_example().encode_to_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DatasetError> {
        let mut example = Example::decode(bytes)?;
        let mut features = example
            .features
            .take()
            .map(|f| f.feature)
            .unwrap_or_default();

        let image_raw = match features.remove(IMAGE_RAW).and_then(|f| f.kind) {
            Some(feature::Kind::BytesList(list)) => list.value.into_iter().next(),
            _ => None,
        }
        .ok_or(DatasetError::MissingFeature(IMAGE_RAW))?;

        let label = match features.remove(LABEL).and_then(|f| f.kind) {
            Some(feature::Kind::Int64List(list)) => list.value.first().copied(),
            _ => None,
        }
        .ok_or(DatasetError::MissingFeature(LABEL))?;

        Ok(ImageRecord { image_raw, label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_what_it_encodes() {
        let record = ImageRecord {
            image_raw: vec![0, 1, 2, 255],
            label: 12500,
        };
        assert_eq!(ImageRecord::decode(&record.encode()).unwrap(), record);
    }

    #[test]
    fn label_wire_format() {
        // Int64List { value: [1] } is a packed field 1 holding varint 1
        let list = Int64List { value: vec![1] };
        assert_eq!(list.encode_to_vec(), vec![0x0a, 0x01, 0x01]);
    }

    #[test]
    fn missing_label_is_reported() {
        let mut example = ImageRecord {
            image_raw: vec![1],
            label: 0,
        }
        .to_example();
        example.features.as_mut().unwrap().feature.remove(LABEL);

        let result = ImageRecord::decode(&example.encode_to_vec());
        assert!(matches!(result, Err(DatasetError::MissingFeature("label"))));
    }

    #[test]
    fn wrong_feature_kind_is_reported() {
        let mut example = ImageRecord {
            image_raw: vec![1],
            label: 0,
        }
        .to_example();
        example.features.as_mut().unwrap().feature.insert(
            IMAGE_RAW.to_string(),
            Feature {
                kind: Some(feature::Kind::FloatList(FloatList { value: vec![0.5] })),
            },
        );

        let result = ImageRecord::decode(&example.encode_to_vec());
        assert!(matches!(result, Err(DatasetError::MissingFeature("image_raw"))));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            ImageRecord::decode(&[0xff, 0xff, 0xff]),
            Err(DatasetError::DecodeError(_))
        ));
    }
}
