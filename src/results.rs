use crate::colors::normalize_colors;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Visual design summary of a rendered page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    /// URL that was requested
    pub url: String,

    /// Document title at sampling time
    pub title: String,

    /// Full-page PNG, when requested
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,

    /// Computed color values, first-seen order
    pub colors: Vec<String>,

    /// Primary font families
    pub fonts: Vec<String>,

    pub font_sizes: Vec<String>,

    /// Padding, margin and gap values
    pub spacing: Vec<String>,

    /// Layout mechanisms and detected CSS frameworks
    pub layout_patterns: Vec<String>,

    /// Semantic component labels
    pub component_types: Vec<String>,

    /// Allowlisted meta values keyed by lowercase name
    pub meta: BTreeMap<String, String>,
}

impl ScrapeResult {
    /// Colors canonicalized to deduplicated lowercase hex
    pub fn palette(&self) -> Vec<String> {
        normalize_colors(&self.colors)
    }

    pub fn has_screenshot(&self) -> bool {
        self.screenshot.is_some()
    }
}
