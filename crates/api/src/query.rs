//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Query parameters for listings that can include hidden entries.
#[derive(Debug, Deserialize)]
pub struct IncludeHiddenParams {
    #[serde(default)]
    pub include_hidden: bool,
}
