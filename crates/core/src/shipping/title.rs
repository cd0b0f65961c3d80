//! Delivery-option title parsing and formatting.

use crate::types::Priority;

/// Separator between the priority and the display name in option titles.
pub const TITLE_SEPARATOR: &str = " - ";

/// Turn `"1 - express delivery"` into `"Express Delivery"`.
///
/// Takes the segment after the first `" - "` when present (and non-empty),
/// otherwise the whole string, lower-cases it and capitalizes every word.
#[must_use]
pub fn format_title(raw: &str) -> String {
    let name = raw
        .split(TITLE_SEPARATOR)
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .unwrap_or(raw);

    name.to_lowercase()
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Leading priority of an option title formatted as `"<n> - <name>"`.
#[must_use]
pub fn title_priority(title: &str) -> Option<Priority> {
    let head = title
        .split_once(TITLE_SEPARATOR)
        .map_or(title, |(head, _)| head);
    Priority::parse(head)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_title_round_trip() {
        assert_eq!(format_title("1 - express delivery"), "Express Delivery");
    }

    #[test]
    fn test_format_title_without_separator() {
        assert_eq!(format_title("STANDARD shipping"), "Standard Shipping");
    }

    #[test]
    fn test_format_title_takes_second_segment_only() {
        assert_eq!(format_title("3 - same day - evening"), "Same Day");
    }

    #[test]
    fn test_format_title_empty_second_segment_uses_whole() {
        assert_eq!(format_title("2 - "), "2 - ");
    }

    #[test]
    fn test_format_title_non_ascii() {
        assert_eq!(format_title("1 - ÉÉN dag"), "Één Dag");
    }

    #[test]
    fn test_title_priority() {
        assert_eq!(title_priority("2 - Express"), Some(Priority::new(2)));
        assert_eq!(title_priority("5"), Some(Priority::new(5)));
        assert_eq!(title_priority("Express - 2"), None);
    }
}
