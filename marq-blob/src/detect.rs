use base64::Engine;

/// Predicate separating fresh base64 upload payloads from retained URLs.
///
/// Detection is shape-based, never content-type sniffing: the asset
/// resolver applies whichever detector it was constructed with, and a value
/// that fails the predicate is treated as a pass-through URL.
pub type Base64Detector = fn(&str) -> bool;

/// Default detector: data-URI prefix, or a decodable standard-alphabet
/// payload of plausible length.
pub fn is_base64_payload(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    // data URIs carry their payload after the comma
    let body = match value.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((_, body)) => body,
            None => return false,
        },
        None => value,
    };

    // URLs are never base64 content
    if body.contains("://") || body.starts_with('/') {
        return false;
    }
    if body.len() < 8 || body.len() % 4 != 0 {
        return false;
    }
    if !body
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
    {
        return false;
    }

    base64::engine::general_purpose::STANDARD.decode(body).is_ok()
}
