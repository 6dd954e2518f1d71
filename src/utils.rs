use url::Url;

const MAX_FILENAME_LEN: usize = 100;

/// Characters not allowed in file names on common filesystems
const FORBIDDEN_CHARS: &str = "/:?&=#%\\*\"<>|";

/// Convert a URL to a sanitized filename stem
pub fn sanitize_filename(url: &str) -> String {
    // Remove protocol and replace invalid filename characters
    let mut name = url.replace("http://", "").replace("https://", "");
    name = name.replace(|c: char| FORBIDDEN_CHARS.contains(c), "_");
    let name = name.trim_matches('_');

    // Limit filename length without splitting a character
    match name.char_indices().nth(MAX_FILENAME_LEN) {
        Some((end, _)) => name[..end].to_string(),
        None => name.to_string(),
    }
}

/// Default PNG path for a page's screenshot, named after its host and path
pub fn screenshot_filename(url: &str) -> String {
    let stem = match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("page");
            sanitize_filename(&format!("{}{}", host, parsed.path()))
        }
        Err(_) => sanitize_filename(url),
    };

    if stem.is_empty() {
        "page.png".to_string()
    } else {
        format!("{stem}.png")
    }
}
