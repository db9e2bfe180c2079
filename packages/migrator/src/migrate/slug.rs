//! URL slug derivation with prefix-count collision suffixing.

/// Lowercase, URL-safe slug: alphanumeric runs joined by single dashes.
pub(crate) fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Resolve a slug collision by appending `-<count>` where `count` is the
/// number of existing slugs sharing the prefix. Matches the live state at
/// call time only; runs are single-writer.
pub(crate) fn with_collision_suffix(slug: &str, existing: i64) -> String {
    if existing > 0 {
        format!("{slug}-{existing}")
    } else {
        slug.to_string()
    }
}
