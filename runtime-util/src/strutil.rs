//! String utilities (component O), mirroring the original's `pstring.h`
//! surface (`p_strchomp`, `p_strtok`, case conversion) as thin wrappers
//! over the standard library's own string methods.

/// Trims leading/trailing ASCII whitespace, matching `p_strchomp`.
pub fn chomp(value: &str) -> &str {
    value.trim()
}

/// Splits `value` on `delimiter`, dropping empty fragments — matching
/// `p_strtok`'s behavior of collapsing consecutive separators.
pub fn split(value: &str, delimiter: char) -> Vec<&str> {
    value.split(delimiter).filter(|s| !s.is_empty()).collect()
}

pub fn to_upper(value: &str) -> String {
    value.to_uppercase()
}

pub fn to_lower(value: &str) -> String {
    value.to_lowercase()
}

/// `true` iff `value` is empty or contains only ASCII whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chomp_trims_whitespace() {
        assert_eq!(chomp("  hello \t\n"), "hello");
    }

    #[test]
    fn split_collapses_consecutive_delimiters() {
        assert_eq!(split("a,,b,c,", ','), vec!["a", "b", "c"]);
    }

    #[test]
    fn case_conversion_round_trips_ascii() {
        assert_eq!(to_upper("MultiOS"), "MULTIOS");
        assert_eq!(to_lower("MultiOS"), "multios");
    }

    #[test]
    fn is_blank_detects_whitespace_only_strings() {
        assert!(is_blank("   \t  "));
        assert!(!is_blank("  x "));
    }
}
