//! Bounded style sampling.
//!
//! The page-side collector ([`script::STYLE_SAMPLER`]) reads computed
//! styles for at most [`ELEMENT_SAMPLE_LIMIT`] elements. [`StyleSampler`]
//! folds those records into capped, first-seen-ordered categories.

pub mod components;
pub(crate) mod script;


use crate::browser::PageHandle;
use crate::error::ScrapeError;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Maximum number of elements read from the document
pub const ELEMENT_SAMPLE_LIMIT: usize = 500;

/// Per-category limits on distinct values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCaps {
    pub colors: usize,
    pub fonts: usize,
    pub font_sizes: usize,
    pub spacing: usize,
    pub layout_patterns: usize,
    pub component_types: usize,
}

pub const CATEGORY_CAPS: CategoryCaps = CategoryCaps {
    colors: 30,
    fonts: 10,
    font_sizes: 15,
    spacing: 20,
    layout_patterns: 6,
    component_types: 15,
};

/// Computed-style record for one element, as returned by the collector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementSample {
    pub tag: String,
    pub role: Option<String>,
    pub class_name: String,
    pub data_component: Option<String>,
    pub background_color: String,
    pub color: String,
    pub border_color: String,
    pub font_family: String,
    pub font_size: String,
    pub padding: String,
    pub margin: String,
    pub gap: String,
    pub display: String,
}

/// Everything the collector returns in one evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSample {
    pub elements: Vec<ElementSample>,
    /// `<link href>` and `<script src>` values
    pub assets: Vec<String>,
}

/// The six capped categories of a scrape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSummary {
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub font_sizes: Vec<String>,
    pub spacing: Vec<String>,
    pub layout_patterns: Vec<String>,
    pub component_types: Vec<String>,
}

/// Insertion-ordered set that stops admitting values at its cap
#[derive(Debug)]
struct CappedSet {
    cap: usize,
    values: IndexSet<String>,
}

impl CappedSet {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            values: IndexSet::with_capacity(cap),
        }
    }

    fn insert(&mut self, value: &str) {
        if self.values.len() >= self.cap || value.is_empty() {
            return;
        }
        if !self.values.contains(value) {
            self.values.insert(value.to_string());
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.values.into_iter().collect()
    }
}

/// Folds element samples into a [`StyleSummary`]
#[derive(Debug)]
pub struct StyleSampler {
    colors: CappedSet,
    fonts: CappedSet,
    font_sizes: CappedSet,
    spacing: CappedSet,
    layout_patterns: CappedSet,
    component_types: CappedSet,
    sampled: usize,
}

impl Default for StyleSampler {
    fn default() -> Self {
        Self::with_caps(CATEGORY_CAPS)
    }
}

impl StyleSampler {
    pub fn with_caps(caps: CategoryCaps) -> Self {
        Self {
            colors: CappedSet::new(caps.colors),
            fonts: CappedSet::new(caps.fonts),
            font_sizes: CappedSet::new(caps.font_sizes),
            spacing: CappedSet::new(caps.spacing),
            layout_patterns: CappedSet::new(caps.layout_patterns),
            component_types: CappedSet::new(caps.component_types),
            sampled: 0,
        }
    }

    /// Number of element records accepted so far
    pub fn sampled(&self) -> usize {
        self.sampled
    }

    /// Record one element. Elements past the sample limit are ignored.
    pub fn ingest(&mut self, element: &ElementSample) {
        if self.sampled >= ELEMENT_SAMPLE_LIMIT {
            return;
        }
        self.sampled += 1;

        if !is_transparent(&element.background_color) {
            self.colors.insert(&element.background_color);
        }
        self.colors.insert(&element.color);
        // Unset borders usually compute to plain black
        if compact(&element.border_color) != "rgb(0,0,0)" {
            self.colors.insert(&element.border_color);
        }

        if let Some(family) = primary_font(&element.font_family) {
            self.fonts.insert(&family);
        }

        if element.font_size != "0px" {
            self.font_sizes.insert(&element.font_size);
        }

        for value in [&element.padding, &element.margin, &element.gap] {
            if value != "0px" && value != "normal" {
                self.spacing.insert(value);
            }
        }

        match element.display.as_str() {
            "flex" => self.layout_patterns.insert("flexbox"),
            "grid" => self.layout_patterns.insert("css-grid"),
            _ => {}
        }

        for label in components::detect(element) {
            self.component_types.insert(label);
        }
    }

    /// Record CSS frameworks fingerprinted from asset URLs
    pub fn ingest_assets<S: AsRef<str>>(&mut self, assets: &[S]) {
        for framework in components::detect_frameworks(assets) {
            self.layout_patterns.insert(framework);
        }
    }

    /// Walk a whole collector result, elements first, then assets
    pub fn ingest_page(&mut self, sample: &PageSample) {
        for element in &sample.elements {
            self.ingest(element);
        }
        self.ingest_assets(&sample.assets);
    }

    pub fn finish(self) -> StyleSummary {
        StyleSummary {
            colors: self.colors.into_vec(),
            fonts: self.fonts.into_vec(),
            font_sizes: self.font_sizes.into_vec(),
            spacing: self.spacing.into_vec(),
            layout_patterns: self.layout_patterns.into_vec(),
            component_types: self.component_types.into_vec(),
        }
    }
}

/// Summarize a collector result with the default caps
pub fn summarize(sample: &PageSample) -> StyleSummary {
    let mut sampler = StyleSampler::default();
    sampler.ingest_page(sample);
    ::log::debug!(
        "Sampled {} of {} element records",
        sampler.sampled(),
        sample.elements.len()
    );
    sampler.finish()
}

/// Run the collector in the page and summarize what it returns
pub async fn sample_page<P: PageHandle>(page: &mut P) -> Result<StyleSummary, ScrapeError> {
    let raw = page
        .evaluate(
            &script::STYLE_SAMPLER,
            vec![serde_json::json!(ELEMENT_SAMPLE_LIMIT)],
        )
        .await?;
    let sample: PageSample = serde_json::from_value(raw).map_err(|e| ScrapeError::Evaluation {
        script: script::STYLE_SAMPLER.name,
        reason: e.to_string(),
    })?;
    Ok(summarize(&sample))
}

fn compact(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_transparent(value: &str) -> bool {
    value == "transparent" || compact(value) == "rgba(0,0,0,0)"
}

/// First family of a `font-family` list, quotes stripped
fn primary_font(font_family: &str) -> Option<String> {
    let first = font_family.split(',').next()?.trim();
    let unquoted = first.trim_matches(|c| c == '"' || c == '\'').trim();
    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}
