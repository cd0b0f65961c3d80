//! Selector configuration, read from the delivery customization's metafield.

use serde::{Deserialize, Serialize};

/// Label of the option kept visible when no cart line carries a priority.
pub const DEFAULT_OPTION_LABEL: &str = "Standaard verzending";

/// Whether target titles are reformatted before renaming.
pub const FORMAT_TITLES: bool = false;

/// How the winning delivery option is chosen once a priority is known.
///
/// The two policies disagree whenever option ordering differs from priority
/// ordering, so exactly one of them is applied per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Keep the option whose title's leading integer equals the winning priority.
    #[default]
    TitleMatch,
    /// Rename the first option to the winning label and hide the rest.
    RenameFirst,
}

/// Selector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorConfig {
    pub strategy: SelectionStrategy,
    /// Reformat the winning label with [`super::format_title`].
    pub format_titles: bool,
    /// Title of the fallback option (compared after trimming).
    pub default_label: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::default(),
            format_titles: FORMAT_TITLES,
            default_label: DEFAULT_OPTION_LABEL.to_string(),
        }
    }
}

impl SelectorConfig {
    /// Parse the configuration JSON, falling back to defaults when it is
    /// missing or malformed.
    #[must_use]
    pub fn from_json(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid selector configuration, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SelectorConfig::default();
        assert_eq!(config.strategy, SelectionStrategy::TitleMatch);
        assert!(!config.format_titles);
        assert_eq!(config.default_label, DEFAULT_OPTION_LABEL);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = SelectorConfig::from_json(r#"{"strategy":"rename_first"}"#);
        assert_eq!(config.strategy, SelectionStrategy::RenameFirst);
        assert_eq!(config.default_label, DEFAULT_OPTION_LABEL);
    }

    #[test]
    fn test_full_json() {
        let config = SelectorConfig::from_json(
            r#"{"strategy":"title_match","formatTitles":true,"defaultLabel":"Standard"}"#,
        );
        assert!(config.format_titles);
        assert_eq!(config.default_label, "Standard");
    }

    #[test]
    fn test_malformed_json_falls_back() {
        assert_eq!(
            SelectorConfig::from_json("{not json"),
            SelectorConfig::default()
        );
        assert_eq!(
            SelectorConfig::from_json(r#"{"strategy":"both"}"#),
            SelectorConfig::default()
        );
    }
}
