use super::{CheckpointRecord, PersistenceError};

use ron::ser::PrettyConfig;

/// A text encoding of checkpoint records.
///
/// Every encoded checkpoint starts with a header line naming the
/// codec that wrote it, so that reading it back with another codec
/// fails with [`PersistenceError::UnsupportedCodec`] instead of a
/// parse error.
pub trait Codec {
    /// Name written in the checkpoint header.
    const NAME: &'static str;
    /// Extension of checkpoint files, without the dot.
    const EXTENSION: &'static str;

    fn encode_body(record: &CheckpointRecord) -> Result<String, PersistenceError>;

    fn decode_body(body: &str) -> Result<CheckpointRecord, PersistenceError>;

    /// Encodes a record, header included.
    fn encode(record: &CheckpointRecord) -> Result<String, PersistenceError> {
        Ok(format!("{}{}\n{}", HEADER_PREFIX, Self::NAME, Self::encode_body(record)?))
    }

    /// Decodes a record, checking its header.
    fn decode(text: &str) -> Result<CheckpointRecord, PersistenceError> {
        let (header, body) = text.split_once('\n').unwrap_or((text, ""));
        let found = header.strip_prefix(HEADER_PREFIX).ok_or_else(|| {
            PersistenceError::Schema("missing checkpoint header".into())
        })?;
        if found.trim() != Self::NAME {
            return Err(PersistenceError::UnsupportedCodec {
                found: found.trim().to_string(),
                expected: Self::NAME.to_string(),
            });
        }
        Self::decode_body(body)
    }
}

const HEADER_PREFIX: &str = "evoneat-checkpoint ";

/// Encodes checkpoints as pretty-printed RON.
#[derive(Clone, Copy, Debug, Default)]
pub struct RonCodec;

impl Codec for RonCodec {
    const NAME: &'static str = "ron";
    const EXTENSION: &'static str = "ron";

    fn encode_body(record: &CheckpointRecord) -> Result<String, PersistenceError> {
        ron::ser::to_string_pretty(record, PrettyConfig::default())
            .map_err(|e| PersistenceError::Codec(e.to_string()))
    }

    fn decode_body(body: &str) -> Result<CheckpointRecord, PersistenceError> {
        ron::from_str(body).map_err(|e| PersistenceError::Codec(e.to_string()))
    }
}

/// Encodes checkpoints as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    const NAME: &'static str = "json";
    const EXTENSION: &'static str = "json";

    fn encode_body(record: &CheckpointRecord) -> Result<String, PersistenceError> {
        serde_json::to_string(record).map_err(|e| PersistenceError::Codec(e.to_string()))
    }

    fn decode_body(body: &str) -> Result<CheckpointRecord, PersistenceError> {
        serde_json::from_str(body).map_err(|e| PersistenceError::Codec(e.to_string()))
    }
}
