// Name heuristics for attribute-based ("core") requirement groups and the
// double-count note grammar.

/// A group satisfies by attribute tag (rather than an explicit course list)
/// when its name contains the token "core" in any casing.
pub fn is_core_group(group_name: &str) -> bool {
    group_name.to_lowercase().contains("core")
}

/// Derive the expected `Core: <attribute>` tag value from a group name.
///
/// Three positional rules, checked in order:
/// - a leading "Core " is stripped ("Core Philosophy" -> "Philosophy");
/// - a trailing " Core" is stripped ("Philosophy Core" -> "Philosophy");
/// - otherwise every standalone "core" token is removed and the remaining
///   tokens re-joined ("First Core Seminar" -> "First Seminar").
pub fn expected_core_attribute(group_name: &str) -> String {
    let lower = group_name.to_lowercase();
    if lower.starts_with("core ") {
        group_name[5..].trim().to_string()
    } else if lower.ends_with(" core") {
        group_name[..group_name.len() - 4].trim().to_string()
    } else {
        group_name
            .split_whitespace()
            .filter(|part| !part.eq_ignore_ascii_case("core"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Extract the `Core: <tag>` values from a section's comma-separated
/// attribute string. Non-core tags are ignored.
pub fn core_attribute_tags(attribute: &str) -> Vec<String> {
    attribute
        .split(',')
        .map(str::trim)
        .filter(|part| part.to_lowercase().starts_with("core:"))
        .map(|part| part[5..].trim().to_string())
        .collect()
}

/// Parse the sequence ids out of a "Can double count with (1, 2)" group
/// note. Anything else (including a malformed id list) yields an empty set.
pub fn parse_double_count_note(note: &str) -> Vec<i64> {
    if !note.contains("Can double count with") {
        return Vec::new();
    }
    let tail = note.rsplit("with").next().unwrap_or("");
    tail.replace('(', "")
        .replace(')', "")
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()) {
                part.parse::<i64>().ok()
            } else {
                None
            }
        })
        .collect()
}
