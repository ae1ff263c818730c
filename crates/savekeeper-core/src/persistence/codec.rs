//! Conversion between `ProgressData` and stored save-file text.

use std::sync::Arc;

use thiserror::Error;

use super::cipher::{CipherAdapter, CipherError};
use super::types::ProgressData;
use crate::logging::{LogSink, Severity};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes profiles to JSON and passes the result through the cipher adapter.
#[derive(Clone)]
pub struct ProfileCodec {
    adapter: CipherAdapter,
    sink: Arc<dyn LogSink>,
}

impl ProfileCodec {
    pub fn new(adapter: CipherAdapter, sink: Arc<dyn LogSink>) -> Self {
        Self { adapter, sink }
    }

    pub fn ciphering_enabled(&self) -> bool {
        self.adapter.is_enabled()
    }

    pub fn to_stored(&self, data: &ProgressData) -> Result<String, CodecError> {
        let json = serde_json::to_string(data)?;
        Ok(self.adapter.encode(&json)?)
    }

    pub fn try_from_stored(&self, text: &str) -> Result<ProgressData, CodecError> {
        let json = self.adapter.decode(text)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Decode stored text; a corrupt file is reported and yields `None`.
    pub fn from_stored(&self, text: &str) -> Option<ProgressData> {
        match self.try_from_stored(text) {
            Ok(data) => Some(data),
            Err(e) => {
                log::debug!("decode failed: {e}");
                self.sink
                    .send("Save file corrupted, could not read", Severity::Warning);
                None
            }
        }
    }
}
