//! JSON at the edges.
//!
//! Decoders and encoders work on [`Value`]; these helpers let them take and
//! produce `serde_json` documents directly.
//!
//! # Example
//! ```rust,ignore
//! let decoder = schemata::decoder_for(&person)?;
//! let decoded = decoder.decode_json_str(r#"{"name":"a"}"#)?;
//! let wire = encoder.encode_json(decoded.value().unwrap())?;
//! ```

use crate::error::SchemaResult;
use crate::interpreter::{DecodeResult, Decoder, Encoder};
use crate::value::Value;

impl Decoder {
    pub fn decode_json(&self, json: &serde_json::Value) -> DecodeResult<Value> {
        self.decode(&Value::from(json.clone()))
    }

    /// Parse `source` and decode it. Only malformed JSON is an `Err`; schema
    /// violations come back in the [`DecodeResult`].
    pub fn decode_json_str(&self, source: &str) -> SchemaResult<DecodeResult<Value>> {
        let json: serde_json::Value = serde_json::from_str(source)?;
        Ok(self.decode_json(&json))
    }
}

impl Encoder {
    /// Encode `value` and convert the result to JSON.
    pub fn encode_json(&self, value: &Value) -> SchemaResult<serde_json::Value> {
        self.encode(value).to_json()
    }

    pub fn encode_json_string(&self, value: &Value) -> SchemaResult<String> {
        Ok(serde_json::to_string(&self.encode_json(value)?)?)
    }
}

/// A decoder and encoder for the same schema.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    decoder: Decoder,
    encoder: Encoder,
}

impl JsonCodec {
    pub fn new(decoder: Decoder, encoder: Encoder) -> Self {
        Self { decoder, encoder }
    }

    pub fn decode_str(&self, source: &str) -> SchemaResult<DecodeResult<Value>> {
        self.decoder.decode_json_str(source)
    }

    pub fn encode_string(&self, value: &Value) -> SchemaResult<String> {
        self.encoder.encode_json_string(value)
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }
}
