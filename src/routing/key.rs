//! Route key normalization.
//!
//! A route key is `"<METHOD>.<path>"` with at most one trailing `/` removed.
//! Keys are compared byte for byte: no decoding, no case folding, no segment
//! matching.

/// Builds the lookup key for a method and path.
pub fn normalize(method: &str, path: &str) -> String {
    let mut key = String::with_capacity(method.len() + 1 + path.len());
    key.push_str(method);
    key.push('.');
    key.push_str(path);

    if key.ends_with('/') {
        key.pop();
    }

    key
}
