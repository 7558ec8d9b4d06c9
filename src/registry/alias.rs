//! Auto-derived snake_case aliases for mixed-case tool names.

/// Inserts `_` before each upper-case character (unless the preceding
/// character is already `_`) and lower-cases the result. Returns `None`
/// when `name` has no upper-case characters at all, since no alias is
/// needed in that case.
pub fn derive_alias(name: &str) -> Option<String> {
    if !name.chars().any(|c| c.is_ascii_uppercase()) {
        return None;
    }

    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase() && prev.is_some() && prev != Some('_') {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
        prev = Some(c);
    }

    if out == name {
        None
    } else {
        Some(out)
    }
}
