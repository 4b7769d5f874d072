//! Label text parsing for the wizard's labels step.

/// Parse newline-delimited `key=value` text into an ordered list of
/// unique-by-key pairs. Lines without `=` or with an empty trimmed key
/// or value are silently skipped; the first occurrence of a duplicate
/// key wins.
pub fn parse_labels(text: &str) -> Vec<(String, String)> {
    let mut labels: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        if labels.iter().any(|(existing, _)| existing == key) {
            continue;
        }
        labels.push((key.to_string(), value.to_string()));
    }
    labels
}
