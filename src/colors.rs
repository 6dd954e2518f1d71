use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;

static RGB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rgba?\((\d+),\s*(\d+),\s*(\d+)").expect("valid rgb pattern"));

/// Convert an `rgb(...)` or `rgba(...)` string to lowercase `#rrggbb`.
///
/// Alpha is ignored. Returns `None` when the string does not match or any
/// channel is out of range.
pub fn rgb_to_hex(rgb: &str) -> Option<String> {
    let caps = RGB_PATTERN.captures(rgb)?;

    let mut channels = [0u8; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        let raw = &caps[i + 1];
        match raw.parse::<u32>() {
            Ok(value) if value <= 255 => *channel = value as u8,
            _ => {
                ::log::warn!("Ignoring color with invalid channel {:?}: {}", raw, rgb);
                return None;
            }
        }
    }

    Some(format!(
        "#{:02x}{:02x}{:02x}",
        channels[0], channels[1], channels[2]
    ))
}

/// Canonicalize a list of colors to lowercase hex, dropping anything unparseable.
///
/// Output keeps first-occurrence order with duplicates removed.
pub fn normalize_colors<S: AsRef<str>>(colors: &[S]) -> Vec<String> {
    let mut seen = IndexSet::new();
    for color in colors {
        let color = color.as_ref();
        let normalized = if color.starts_with('#') {
            Some(color.to_lowercase())
        } else {
            rgb_to_hex(color)
        };
        if let Some(hex) = normalized {
            seen.insert(hex);
        }
    }
    seen.into_iter().collect()
}
