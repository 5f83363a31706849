use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Wire shape of every persisted record.
///
/// `type_tag` selects a registered decoder. When `is_rich` is `false` the
/// payload is used verbatim (it is already a primitive or identifier);
/// when `true` the payload must be passed through the decoder registered
/// for the tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordEnvelope {
    pub type_tag: String,
    pub is_rich: bool,
    pub payload: serde_json::Value,
}

impl RecordEnvelope {
    /// Wrap a typed record as a rich payload.
    pub fn rich<T: Serialize>(type_tag: &str, record: &T) -> StoreResult<Self> {
        let payload = serde_json::to_value(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            type_tag: type_tag.to_owned(),
            is_rich: true,
            payload,
        })
    }

    /// Wrap an already-primitive payload that needs no decoding.
    pub fn verbatim(type_tag: &str, payload: serde_json::Value) -> Self {
        Self {
            type_tag: type_tag.to_owned(),
            is_rich: false,
            payload,
        }
    }
}

/// Result of decoding a [`RecordEnvelope`].
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded<T> {
    /// The envelope was not rich; the payload stands as-is.
    Raw(serde_json::Value),
    /// The payload passed through the decoder registered for its tag.
    Record(T),
}

/// Decode function for one type tag.
pub type DecodeFn<T> = fn(&serde_json::Value) -> StoreResult<T>;

/// Registry mapping type tags to decode functions.
///
/// Built once at startup and passed by reference into any code that needs
/// to decode persisted records; there is no global registry.
pub struct DecoderRegistry<T> {
    decoders: HashMap<String, DecodeFn<T>>,
}

impl<T> DecoderRegistry<T> {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register a decoder for a tag. Duplicate registration is rejected.
    pub fn register(&mut self, type_tag: &str, decode: DecodeFn<T>) -> StoreResult<()> {
        if self.decoders.contains_key(type_tag) {
            return Err(StoreError::DuplicateTypeTag {
                tag: type_tag.to_owned(),
            });
        }
        self.decoders.insert(type_tag.to_owned(), decode);
        Ok(())
    }

    /// Decode an envelope: verbatim payloads come back raw, rich payloads
    /// go through the decoder registered for their tag.
    pub fn decode(&self, envelope: &RecordEnvelope) -> StoreResult<Decoded<T>> {
        if !envelope.is_rich {
            return Ok(Decoded::Raw(envelope.payload.clone()));
        }
        let decode = self
            .decoders
            .get(&envelope.type_tag)
            .ok_or_else(|| StoreError::UnknownTypeTag {
                tag: envelope.type_tag.clone(),
            })?;
        decode(&envelope.payload).map(Decoded::Record)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl<T> Default for DecoderRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_u64(payload: &serde_json::Value) -> StoreResult<u64> {
        payload.as_u64().ok_or_else(|| StoreError::Decode {
            tag: "test-u64".into(),
            reason: "expected unsigned integer".into(),
        })
    }

    #[test]
    fn rich_envelope_decodes_through_registry() {
        let mut registry = DecoderRegistry::new();
        registry.register("test-u64", decode_u64).unwrap();

        let envelope = RecordEnvelope::rich("test-u64", &7u64).unwrap();
        assert_eq!(registry.decode(&envelope).unwrap(), Decoded::Record(7));
    }

    #[test]
    fn verbatim_envelope_skips_decoding() {
        let registry: DecoderRegistry<u64> = DecoderRegistry::new();
        let envelope = RecordEnvelope::verbatim("anything", json!("raw-id"));
        assert_eq!(
            registry.decode(&envelope).unwrap(),
            Decoded::Raw(json!("raw-id"))
        );
    }

    #[test]
    fn unknown_rich_tag_fails() {
        let registry: DecoderRegistry<u64> = DecoderRegistry::new();
        let envelope = RecordEnvelope::rich("missing", &1u64).unwrap();
        assert_eq!(
            registry.decode(&envelope).unwrap_err(),
            StoreError::UnknownTypeTag {
                tag: "missing".into()
            }
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = DecoderRegistry::new();
        registry.register("test-u64", decode_u64).unwrap();
        assert_eq!(
            registry.register("test-u64", decode_u64).unwrap_err(),
            StoreError::DuplicateTypeTag {
                tag: "test-u64".into()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn decode_failure_carries_tag() {
        let mut registry = DecoderRegistry::new();
        registry.register("test-u64", decode_u64).unwrap();

        let envelope = RecordEnvelope {
            type_tag: "test-u64".into(),
            is_rich: true,
            payload: json!("not a number"),
        };
        assert!(matches!(
            registry.decode(&envelope).unwrap_err(),
            StoreError::Decode { .. }
        ));
    }

    #[test]
    fn envelope_serde_roundtrip() {
        let envelope = RecordEnvelope::rich("tag", &json!({"k": 1})).unwrap();
        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: RecordEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope, parsed);
    }
}
