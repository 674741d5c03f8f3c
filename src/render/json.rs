//! JSON rendering of page element trees.

use crate::error::{Error, Result};
use crate::model::Element;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a page element tree to JSON.
pub fn to_json(page: &Element, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(page),
        JsonFormat::Compact => serde_json::to_string(page),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
