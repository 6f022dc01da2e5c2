//! Derived artifact filenames
//!
//! A response's filename decides where it lands on disk and is the only
//! deduplication key, so the same URL must always map to the same name.

use url::Url;

/// Extension used when the source has none
const UNKNOWN_EXTENSION: &str = "unknown";

/// Derives the on-disk filename for a fetched artifact
///
/// Prefers the `filename` parameter of a `Content-Disposition` header. With a
/// query string the name is `<path>_<query>`, otherwise the path without its
/// leading slash. The result is passed through [`sanitize_filename`].
pub fn derive_filename(url: &Url, content_disposition: Option<&str>) -> String {
    if let Some(name) = content_disposition.and_then(disposition_filename) {
        return sanitize_filename(&name);
    }

    let path = url.path();
    match url.query() {
        Some(query) if !query.is_empty() => sanitize_filename(&format!("{}_{}", path, query)),
        _ => sanitize_filename(path.trim_start_matches('/')),
    }
}

/// Makes a name safe to use as a single path component
///
/// The stem and extension keep only ASCII alphanumerics, `.` and `_`; anything
/// else (including `/` and `-`) becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let (stem, extension) = match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() && !name[idx + 1..].contains('/') => {
            (&name[..idx], &name[idx + 1..])
        }
        _ => (name, ""),
    };

    let stem = clean_component(stem);
    let stem = if stem.is_empty() { "_".to_string() } else { stem };
    let extension = clean_component(extension);
    let extension = if extension.is_empty() {
        UNKNOWN_EXTENSION.to_string()
    } else {
        extension
    };

    format!("{}.{}", stem, extension)
}

fn clean_component(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

/// Extracts the `filename` parameter from a Content-Disposition value
fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}
