//! Server name validation.

use std::sync::LazyLock;

use regex::Regex;

/// Starts and ends alphanumeric, hyphens allowed in between.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?$").expect("name pattern compiles")
});

/// Validate a candidate server name. Returns an empty string when the
/// name is acceptable, else a user-facing message. A trimmed-empty
/// input is acceptable: it means "auto-generate a name", not an error.
pub fn validate_server_name(input: &str) -> String {
    let name = input.trim();
    if name.is_empty() {
        return String::new();
    }
    let length = name.chars().count();
    if !(3..=63).contains(&length) {
        return "Name must be between 3 and 63 characters long.".into();
    }
    if !NAME_PATTERN.is_match(name) {
        return "Name may only contain letters, digits and hyphens, \
                and must start and end with a letter or digit."
            .into();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_pass() {
        for name in ["web-01", "abc", "A1b", "x0-y1-z2", &"a".repeat(63)] {
            assert_eq!(validate_server_name(name), "", "expected {name:?} to pass");
        }
    }

    #[test]
    fn empty_and_whitespace_mean_auto_generate() {
        assert_eq!(validate_server_name(""), "");
        assert_eq!(validate_server_name("   "), "");
    }

    #[test]
    fn length_bounds_are_enforced() {
        assert!(validate_server_name("ab").contains("between 3 and 63"));
        assert!(validate_server_name(&"a".repeat(64)).contains("between 3 and 63"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Two characters, four bytes: still a length error, not a
        // pattern error.
        assert!(validate_server_name("ÿÿ").contains("between 3 and 63"));
    }

    #[test]
    fn pattern_violations_get_the_pattern_message() {
        for name in ["-abc", "abc-", "he llo", "tÿpo", "a_b_c"] {
            let msg = validate_server_name(name);
            assert!(msg.contains("letters, digits and hyphens"), "{name:?}: {msg}");
        }
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_before_validation() {
        assert_eq!(validate_server_name("  web-01  "), "");
    }
}
