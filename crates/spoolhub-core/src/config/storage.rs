//! Spool and output directory configuration.

use serde::{Deserialize, Serialize};

/// Location of job records and spooled source files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoolConfig {
    /// Directory holding `<jobId>.json` records.
    #[serde(default = "default_spool_root")]
    pub root: String,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            root: default_spool_root(),
        }
    }
}

/// Location of rendered pages and finished documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one sub-directory per job.
    #[serde(default = "default_output_root")]
    pub root: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
        }
    }
}

fn default_spool_root() -> String {
    "./spool".to_string()
}

fn default_output_root() -> String {
    "./output".to_string()
}
