//! Shipping-method selection for the checkout delivery-customization function.
//!
//! Given the cart lines (each optionally carrying a priority metafield on its
//! product) and the checkout's delivery groups, decide which single delivery
//! option stays visible and emit `hide` / `rename` operations for the rest.
//!
//! The selector is a pure, total function: malformed or missing input is
//! ignored and the worst case is an empty operation list.
//!
//! # Example
//!
//! ```rust
//! use dutchned_core::shipping::{
//!     Cart, CartLine, DeliveryGroup, DeliveryOption, SelectorConfig, select_operations,
//! };
//!
//! let cart = Cart {
//!     lines: vec![CartLine::with_metafield("1"), CartLine::with_metafield("2")],
//!     delivery_groups: vec![DeliveryGroup {
//!         delivery_options: vec![
//!             DeliveryOption::new("std", "1 - Standard"),
//!             DeliveryOption::new("exp", "2 - Express"),
//!         ],
//!     }],
//! };
//!
//! let result = select_operations(&cart, &SelectorConfig::default());
//! assert_eq!(result.hidden_handles().collect::<Vec<_>>(), vec!["std"]);
//! ```

mod config;
mod schema;
mod title;

pub use config::{DEFAULT_OPTION_LABEL, FORMAT_TITLES, SelectionStrategy, SelectorConfig};
pub use schema::*;
pub use title::{TITLE_SEPARATOR, format_title, title_priority};

use std::collections::HashSet;

use crate::types::Priority;

/// The highest priority found among the cart lines, with the raw metafield
/// value of the (first) line that carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinningPriority<'a> {
    pub priority: Priority,
    pub raw: &'a str,
}

/// Run the function over a deserialized input.
#[must_use]
pub fn run(input: &FunctionInput) -> FunctionResult {
    select_operations(&input.cart, &input.config())
}

/// Run the function over a raw JSON input.
///
/// Input that does not deserialize is logged and produces no operations.
#[must_use]
pub fn run_json(raw: &str) -> FunctionResult {
    match serde_json::from_str::<FunctionInput>(raw) {
        Ok(input) => run(&input),
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable function input, returning no operations");
            FunctionResult::empty()
        }
    }
}

/// Compute the operations for `cart` under `config`.
#[must_use]
pub fn select_operations(cart: &Cart, config: &SelectorConfig) -> FunctionResult {
    let options: Vec<&DeliveryOption> = cart.delivery_options().collect();
    if cart.lines.is_empty() || options.is_empty() {
        return FunctionResult::empty();
    }

    let Some(winner) = winning_priority(&cart.lines) else {
        return isolate_default(&options, config);
    };

    let target_title = if config.format_titles {
        format_title(winner.raw)
    } else {
        winner.raw.to_string()
    };

    match config.strategy {
        SelectionStrategy::TitleMatch => {
            let matched = options
                .iter()
                .find(|option| title_priority(option.title()) == Some(winner.priority));

            match matched {
                Some(keep) => {
                    let mut result = hide_all_except(&options, &keep.handle);
                    if config.format_titles {
                        result
                            .operations
                            .push(Operation::rename(&keep.handle, target_title));
                    }
                    result
                }
                None => {
                    tracing::debug!(
                        priority = %winner.priority,
                        "No delivery option matches the winning priority"
                    );
                    isolate_default(&options, config)
                }
            }
        }
        SelectionStrategy::RenameFirst => {
            let Some(first) = options.first() else {
                return FunctionResult::empty();
            };
            let mut result = FunctionResult {
                operations: vec![Operation::rename(&first.handle, target_title)],
            };
            result
                .operations
                .extend(hide_all_except(&options, &first.handle).operations);
            result
        }
    }
}

/// Maximum valid priority across `lines`; ties keep the first line.
#[must_use]
pub fn winning_priority(lines: &[CartLine]) -> Option<WinningPriority<'_>> {
    lines
        .iter()
        .filter_map(|line| {
            let raw = line.metafield_value()?;
            Priority::parse(raw).map(|priority| WinningPriority { priority, raw })
        })
        .fold(None, |best, candidate| match best {
            Some(current) if current.priority >= candidate.priority => Some(current),
            _ => Some(candidate),
        })
}

/// Keep only the option titled exactly like the default label; no-op when
/// there is none.
fn isolate_default(options: &[&DeliveryOption], config: &SelectorConfig) -> FunctionResult {
    let label = config.default_label.trim();
    options
        .iter()
        .find(|option| option.title().trim() == label)
        .map_or_else(FunctionResult::empty, |keep| {
            hide_all_except(options, &keep.handle)
        })
}

/// Hide every option whose handle differs from `keep`, once per handle.
fn hide_all_except(options: &[&DeliveryOption], keep: &str) -> FunctionResult {
    let mut seen = HashSet::new();
    let operations = options
        .iter()
        .filter(|option| option.handle != keep)
        .filter(|option| seen.insert(option.handle.as_str()))
        .map(|option| Operation::hide(&option.handle))
        .collect();
    FunctionResult { operations }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart(lines: &[Option<&str>], groups: &[&[(&str, &str)]]) -> Cart {
        Cart {
            lines: lines
                .iter()
                .map(|value| value.map_or_else(CartLine::default, CartLine::with_metafield))
                .collect(),
            delivery_groups: groups
                .iter()
                .map(|options| DeliveryGroup {
                    delivery_options: options
                        .iter()
                        .map(|(handle, title)| DeliveryOption::new(*handle, *title))
                        .collect(),
                })
                .collect(),
        }
    }

    fn standard_groups() -> Vec<&'static [(&'static str, &'static str)]> {
        let options: &'static [(&'static str, &'static str)] = &[
            ("std", "Standaard verzending"),
            ("one", "1 - Pakketpost"),
            ("two", "2 - Koeltransport"),
        ];
        vec![options]
    }

    fn visible(cart: &Cart, result: &FunctionResult) -> Vec<String> {
        let hidden: HashSet<&str> = result.hidden_handles().collect();
        cart.delivery_options()
            .map(|o| o.handle.clone())
            .filter(|h| !hidden.contains(h.as_str()))
            .collect()
    }

    #[test]
    fn test_empty_cart_is_noop() {
        let cart = cart(&[], &standard_groups());
        assert_eq!(
            select_operations(&cart, &SelectorConfig::default()),
            FunctionResult::empty()
        );
    }

    #[test]
    fn test_no_delivery_options_is_noop() {
        let cart = cart(&[Some("2")], &[]);
        assert_eq!(
            select_operations(&cart, &SelectorConfig::default()),
            FunctionResult::empty()
        );
    }

    #[test]
    fn test_no_priority_isolates_default_option() {
        let cart = cart(&[None, Some("n/a")], &standard_groups());
        let result = select_operations(&cart, &SelectorConfig::default());

        assert_eq!(visible(&cart, &result), vec!["std"]);
        assert_eq!(result.renames().count(), 0);
    }

    #[test]
    fn test_no_priority_and_no_default_is_noop() {
        let cart = cart(&[None], &[&[("a", "1 - A"), ("b", "2 - B")]]);
        assert_eq!(
            select_operations(&cart, &SelectorConfig::default()),
            FunctionResult::empty()
        );
    }

    #[test]
    fn test_default_label_is_trimmed() {
        let cart = cart(&[None], &[&[("a", "  Standaard verzending "), ("b", "2 - B")]]);
        let result = select_operations(&cart, &SelectorConfig::default());
        assert_eq!(visible(&cart, &result), vec!["a"]);
    }

    #[test]
    fn test_title_match_keeps_highest_priority() {
        let cart = cart(&[Some("1"), Some("2 - koelen"), None], &standard_groups());
        let result = select_operations(&cart, &SelectorConfig::default());

        assert_eq!(visible(&cart, &result), vec!["two"]);
        assert_eq!(result.renames().count(), 0);
    }

    #[test]
    fn test_title_match_across_groups() {
        let cart = cart(
            &[Some("1")],
            &[&[("a", "2 - Fast")], &[("b", "1 - Normal"), ("c", "Standaard verzending")]],
        );
        let result = select_operations(&cart, &SelectorConfig::default());
        assert_eq!(visible(&cart, &result), vec!["b"]);
    }

    #[test]
    fn test_title_match_with_formatting_renames_winner() {
        let config = SelectorConfig {
            format_titles: true,
            ..SelectorConfig::default()
        };
        let cart = cart(&[Some("2 - koel TRANSPORT")], &standard_groups());
        let result = select_operations(&cart, &config);

        let renames: Vec<_> = result.renames().collect();
        assert_eq!(renames.len(), 1);
        assert_eq!(renames[0].delivery_option_handle, "two");
        assert_eq!(renames[0].title, "Koel Transport");
    }

    #[test]
    fn test_title_match_without_match_falls_back_to_default() {
        let cart = cart(&[Some("7")], &standard_groups());
        let result = select_operations(&cart, &SelectorConfig::default());
        assert_eq!(visible(&cart, &result), vec!["std"]);
    }

    #[test]
    fn test_rename_first_strategy() {
        let config = SelectorConfig {
            strategy: SelectionStrategy::RenameFirst,
            ..SelectorConfig::default()
        };
        let cart = cart(&[Some("1 - post"), Some("2 - koeling")], &standard_groups());
        let result = select_operations(&cart, &config);

        assert_eq!(
            result.operations.first(),
            Some(&Operation::rename("std", "2 - koeling"))
        );
        assert_eq!(visible(&cart, &result), vec!["std"]);
    }

    #[test]
    fn test_rename_first_strategy_formats_when_enabled() {
        let config = SelectorConfig {
            strategy: SelectionStrategy::RenameFirst,
            format_titles: true,
            ..SelectorConfig::default()
        };
        let cart = cart(&[Some("2 - koeling")], &standard_groups());
        let result = select_operations(&cart, &config);
        assert_eq!(result.renames().next().unwrap().title, "Koeling");
    }

    #[test]
    fn test_winning_priority_is_maximum() {
        let cart = cart(
            &[Some("3 - a"), Some("10 - b"), Some("x"), Some("-1"), Some("10 - c")],
            &[],
        );
        let winner = winning_priority(&cart.lines).unwrap();
        assert_eq!(winner.priority, Priority::new(10));
        assert_eq!(winner.raw, "10 - b");
    }

    #[test]
    fn test_duplicate_handles_hidden_once() {
        let cart = cart(&[Some("1")], &[&[("a", "1 - A"), ("b", "2 - B")], &[("b", "2 - B")]]);
        let result = select_operations(&cart, &SelectorConfig::default());
        assert_eq!(result.hidden_handles().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_run_json_contract() {
        let input = r#"{
            "cart": {
                "lines": [
                    {"merchandise": {"__typename": "ProductVariant", "product": {"metafield": {"value": "2"}}}},
                    {"merchandise": {"__typename": "CustomProduct"}}
                ],
                "deliveryGroups": [
                    {"deliveryOptions": [
                        {"handle": "h1", "title": "1 - Post"},
                        {"handle": "h2", "title": "2 - Koel"}
                    ]}
                ]
            }
        }"#;

        let result = run_json(input);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"operations": [{"hide": {"deliveryOptionHandle": "h1"}}]})
        );
    }

    #[test]
    fn test_run_json_reads_config_metafield() {
        let input = r#"{
            "cart": {
                "lines": [{"merchandise": {"product": {"metafield": {"value": "1 - post"}}}}],
                "deliveryGroups": [{"deliveryOptions": [
                    {"handle": "h1", "title": "Anything"},
                    {"handle": "h2", "title": "Else"}
                ]}]
            },
            "deliveryCustomization": {"metafield": {"value": "{\"strategy\":\"rename_first\",\"formatTitles\":true}"}}
        }"#;

        let result = run_json(input);
        assert_eq!(
            result.operations,
            vec![Operation::rename("h1", "Post"), Operation::hide("h2")]
        );
    }

    #[test]
    fn test_run_json_malformed_is_noop() {
        assert_eq!(run_json("not json"), FunctionResult::empty());
        assert_eq!(run_json("{}"), FunctionResult::empty());
    }
}
