/// URL slug derivation for club names.
///
/// Slugs are lowercase ASCII alphanumerics separated by single hyphens.
/// Collision resolution appends a numeric suffix (`chess-club`,
/// `chess-club-1`, `chess-club-2`, …); the caller supplies the "is taken"
/// check since that requires a database lookup.

/// Turn an arbitrary name into a slug.
///
/// Whitespace, underscores, and hyphen runs collapse to a single hyphen;
/// every other non-alphanumeric character is dropped. A name with no usable
/// characters falls back to `"club"` so slugs are never empty.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        "club".to_string()
    } else {
        slug
    }
}

/// The nth candidate slug for a base: the base itself, then `base-1`,
/// `base-2`, …
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}
