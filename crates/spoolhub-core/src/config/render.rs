//! Page renderer configuration.

use serde::{Deserialize, Serialize};

/// Text rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Nominal font size in points; scaled by `dpi / 72` at render time.
    #[serde(default = "default_base_point_size")]
    pub base_point_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_point_size: default_base_point_size(),
        }
    }
}

fn default_base_point_size() -> u32 {
    12
}
