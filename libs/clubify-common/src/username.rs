/// Username derivation for accounts created without an explicit username
/// (e.g. social sign-ups that only carry a profile name and email).

/// Build a base username from profile data.
///
/// Prefers `first_last` built from the cleaned name parts, then the cleaned
/// email local part, then a generic `"user"`. Cleaning keeps alphanumerics
/// (and underscores for the email path) and lowercases.
pub fn base_username(first_name: &str, last_name: &str, email: Option<&str>) -> String {
    let first = clean_alnum(first_name);
    let last = clean_alnum(last_name);

    match (first.is_empty(), last.is_empty()) {
        (false, false) => format!("{first}_{last}"),
        (false, true) => first,
        (true, false) => last,
        (true, true) => {
            let local = email
                .and_then(|e| e.split('@').next())
                .map(clean_identifier)
                .unwrap_or_default();
            if local.is_empty() {
                "user".to_string()
            } else {
                local
            }
        }
    }
}

/// The nth unique-username candidate: the base itself, then `base1`,
/// `base2`, … The caller owns the "is taken" lookup.
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}{n}")
    }
}

fn clean_alnum(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn clean_identifier(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
