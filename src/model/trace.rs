//! Trace records supplied by the external trace store.
//!
//! This is the ingestion boundary: records are a fixed shape, and unknown
//! or missing fields are rejected instead of defaulted.

use serde::{Deserialize, Serialize};
use crate::{Error, Result};

/// A single reasoning trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceRecord {
    pub content: String,
    pub resonance: f32,
    pub emotion: String,
    /// Unix seconds.
    pub timestamp: f64,
    /// Precomputed embedding. When absent the builder asks the embedder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl TraceRecord {
    pub fn new(content: impl Into<String>, resonance: f32) -> Self {
        Self {
            content: content.into(),
            resonance,
            emotion: "neutral".to_string(),
            timestamp: 0.0,
            embedding: None,
        }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = emotion.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Check field ranges. Shape is already enforced by deserialization.
    pub fn validate(&self) -> Result<()> {
        if !self.resonance.is_finite() || !(0.0..=1.0).contains(&self.resonance) {
            return Err(Error::InvalidTrace(format!(
                "resonance {} outside [0, 1]",
                self.resonance
            )));
        }
        if !self.timestamp.is_finite() {
            return Err(Error::InvalidTrace("timestamp is not finite".into()));
        }
        if let Some(embedding) = &self.embedding {
            if embedding.iter().any(|x| !x.is_finite()) {
                return Err(Error::InvalidTrace("embedding has non-finite component".into()));
            }
        }
        Ok(())
    }

    /// Parse and validate one record from a loosely typed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let record: TraceRecord = serde_json::from_value(value)
            .map_err(|e| Error::InvalidTrace(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }
}

/// Parse a JSON array of trace records, failing on the first bad entry.
pub fn parse_trace_log(json: &str) -> Result<Vec<TraceRecord>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| Error::InvalidTrace(e.to_string()))?;
    raw.into_iter()
        .enumerate()
        .map(|(i, v)| {
            TraceRecord::from_json_value(v).map_err(|e| match e {
                Error::InvalidTrace(msg) => Error::InvalidTrace(format!("record {i}: {msg}")),
                other => other,
            })
        })
        .collect()
}
