//! Text utilities kept pure for reuse across services and pipelines.
//!
//! Functions exposed here must remain side-effect free so they can be
//! composed from orchestrators without introducing hidden IO or mutable
//! state. Line structure is preserved: the fallback extractor reasons about
//! individual lines and their adjacency.

/// Normalizes raw document text before structured extraction.
///
/// Strips control characters (keeping newlines and tabs), collapses runs of
/// whitespace within each line, and trims leading/trailing blank lines.
pub fn cleanup_text(text: &str) -> String {
    let filtered = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n'))
        .collect::<String>();

    let lines = filtered
        .lines()
        .map(collapse_line)
        .collect::<Vec<_>>()
        .join("\n");

    lines.trim_matches('\n').to_string()
}

/// Trims a text field and collapses internal whitespace; empty input maps to
/// `None`.
pub fn clean_field(value: &str) -> Option<String> {
    let collapsed = collapse_line(value);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn collapse_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_per_line() {
        let input = "Assignment:   Lab  Report\n\tDue:  2025-04-01  ";
        assert_eq!(cleanup_text(input), "Assignment: Lab Report\nDue: 2025-04-01");
    }

    #[test]
    fn preserves_line_structure() {
        let input = "first\nsecond\n\nfourth";
        assert_eq!(cleanup_text(input).lines().count(), 4);
    }

    #[test]
    fn strips_control_characters() {
        let input = "Phys\u{0}ics\u{7}";
        assert_eq!(cleanup_text(input), "Physics");
    }

    #[test]
    fn clean_field_maps_blank_to_none() {
        assert_eq!(clean_field("   "), None);
        assert_eq!(clean_field(" Lab   Report "), Some("Lab Report".to_string()));
    }
}
