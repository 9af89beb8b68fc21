//! Record codec for durable queues

use bytes::Bytes;
use contracts::RecordFormat;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PersistenceError;

/// Encodes queue records in the configured format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCodec {
    format: RecordFormat,
}

impl RecordCodec {
    pub fn new(format: RecordFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes, PersistenceError> {
        let buf = match self.format {
            RecordFormat::Json => serde_json::to_vec(value).map_err(PersistenceError::codec)?,
            RecordFormat::Bincode => bincode::serialize(value).map_err(PersistenceError::codec)?,
        };
        Ok(Bytes::from(buf))
    }

    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, PersistenceError> {
        match self.format {
            RecordFormat::Json => serde_json::from_slice(data).map_err(PersistenceError::codec),
            RecordFormat::Bincode => bincode::deserialize(data).map_err(PersistenceError::codec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::LocationSample;

    #[test]
    fn test_bincode_keeps_optional_fields() {
        let codec = RecordCodec::new(RecordFormat::Bincode);
        let fix = LocationSample::new(47.6, -122.3, 1_000).with_accuracy(4.0);
        let bytes = codec.encode(&fix).unwrap();
        let back: LocationSample = codec.decode(&bytes).unwrap();
        assert_eq!(back, fix);
        assert_eq!(back.speed_mps, None);
    }

    #[test]
    fn test_json_is_readable() {
        let codec = RecordCodec::default();
        let bytes = codec.encode(&LocationSample::new(1.0, 2.0, 3)).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains("\"timestamp_ms\":3"));
    }

    #[test]
    fn test_decode_garbage() {
        let codec = RecordCodec::new(RecordFormat::Json);
        let err = codec.decode::<LocationSample>(b"not json").unwrap_err();
        assert!(matches!(err, PersistenceError::Codec { .. }));
    }
}
