/// Turn heading text into a URL-fragment id.
///
/// Lowercases, then collapses every run of characters outside
/// `[A-Za-z0-9_]` into a single `-`, and trims `-` from both ends.
/// Text without any word character yields an empty string.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut pending_dash = false;

    for c in lower.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }

    out
}
