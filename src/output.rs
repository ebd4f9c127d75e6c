//! Result types returned by [`crate::convert::convert`].

use crate::format::ColorFormat;
use serde::Serialize;

/// Converted payload: raw bytes, or text for C-array output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputBody {
    Binary(Vec<u8>),
    Text(String),
}

impl OutputBody {
    pub fn len(&self) -> usize {
        match self {
            OutputBody::Binary(b) => b.len(),
            OutputBody::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            OutputBody::Binary(b) => b,
            OutputBody::Text(t) => t.into_bytes(),
        }
    }
}

/// One finished conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub body: OutputBody,
    /// `Content-Type` for the response.
    pub content_type: &'static str,
    /// Suggested download name, e.g. `output.bin`.
    pub filename: String,
    pub stats: ConversionStats,
}

/// What was produced, for logging and callers that want the details.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    /// Format written to the header (after true-color and swap resolution).
    pub format: ColorFormat,
    /// Final dimensions; 0 for RAW input whose header could not be read.
    pub width: u32,
    pub height: u32,
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub duration_ms: u64,
}
