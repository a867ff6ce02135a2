/// Deterministic last-resort summary: the opening of the text itself.

/// Inputs shorter than this (after trimming) are returned verbatim instead
/// of being sent to a backend.
pub const MIN_SUMMARIZABLE_CHARS: usize = 50;

/// Character budget of the truncation fallback.
pub const FALLBACK_MAX_CHARS: usize = 300;

/// First 300 characters of the text, with an ellipsis when truncated.
pub fn truncate_fallback(text: &str) -> String {
    if text.chars().count() <= FALLBACK_MAX_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(FALLBACK_MAX_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_fallback("short"), "short");
    }

    #[test]
    fn test_exactly_at_budget_untouched() {
        let text = "a".repeat(FALLBACK_MAX_CHARS);
        assert_eq!(truncate_fallback(&text), text);
    }

    #[test]
    fn test_long_text_truncated_with_ellipsis() {
        let text = "b".repeat(FALLBACK_MAX_CHARS + 100);
        let out = truncate_fallback(&text);
        assert_eq!(out.chars().count(), FALLBACK_MAX_CHARS + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_multibyte_boundary_safe() {
        let text = "é".repeat(FALLBACK_MAX_CHARS + 1);
        let out = truncate_fallback(&text);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), FALLBACK_MAX_CHARS + 3);
    }
}
