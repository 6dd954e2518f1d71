use crate::browser::{PageHandle, PageScript};
use crate::error::ScrapeError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Meta names and properties kept in a result; everything else is ignored
pub const META_ALLOWLIST: &[&str] = &[
    "description",
    "og:title",
    "og:description",
    "og:image",
    "theme-color",
    "viewport",
];

pub(crate) const META_EXTRACTOR: PageScript = PageScript {
    name: "meta extractor",
    source: r#"
const tags = [];
document.querySelectorAll('meta[name], meta[property]').forEach(m => {
    const key = m.getAttribute('name') || m.getAttribute('property');
    tags.push([key, m.getAttribute('content') || '']);
});
return { title: document.title || '', tags: tags };
"#,
};

/// Raw output of the page-side meta collector
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawMeta {
    pub title: String,
    /// `(name or property, content)` in document order
    pub tags: Vec<(String, String)>,
}

/// Reduce collected meta tags to the allowlist.
///
/// Keys are lower-cased and the last occurrence of a key wins. A non-empty
/// document title is recorded under `title`.
pub fn filter_meta(raw: &RawMeta) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    if !raw.title.is_empty() {
        meta.insert("title".to_string(), raw.title.clone());
    }
    for (key, content) in &raw.tags {
        let key = key.to_lowercase();
        if META_ALLOWLIST.contains(&key.as_str()) {
            meta.insert(key, content.clone());
        }
    }
    meta
}

/// Collect and filter the page's meta tags
pub async fn extract_meta<P: PageHandle>(
    page: &mut P,
) -> Result<BTreeMap<String, String>, ScrapeError> {
    let raw = page.evaluate(&META_EXTRACTOR, Vec::new()).await?;
    let raw: RawMeta = serde_json::from_value(raw).map_err(|e| ScrapeError::Evaluation {
        script: META_EXTRACTOR.name,
        reason: e.to_string(),
    })?;
    Ok(filter_meta(&raw))
}
