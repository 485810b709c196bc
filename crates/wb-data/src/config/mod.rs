//! Configuration for decoding uploaded data

mod null_handling;

pub use null_handling::NullConfig;

use serde::{Serialize, Deserialize};

/// Settings applied when text formats are decoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Rows inspected to infer column types
    pub sample_rows: usize,

    /// Which cell values count as missing
    pub null_config: NullConfig,

    /// Forces a delimiter for delimited text instead of sniffing one
    pub delimiter: Option<u8>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sample_rows: 5000,
            null_config: NullConfig::default(),
            delimiter: None,
        }
    }
}
