//! Grouping keys derived from free-text category labels.
//!
//! A label such as `"Snacks (Imported)"` carries two independent
//! classification axes: the parenthetical *group* (`"Imported"`) and the
//! leading *prefix* (`"Snacks"`). Both are computed for every record, once,
//! at load time.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::OTHER_CATEGORY;

fn paren_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(([^)]+)\)").expect("regex is valid"))
}

/// Both grouping keys of one category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryKeys {
    pub group: String,
    pub prefix: String,
}

impl CategoryKeys {
    pub fn extract(label: &str) -> Self {
        Self {
            group: group_key(label),
            prefix: prefix_key(label),
        }
    }
}

/// Content of the first non-empty `(...)` span, trimmed.
///
/// Returns [`OTHER_CATEGORY`] when the label has no such span. A span of
/// only whitespace yields an empty key.
///
/// # Examples
///
/// ```
/// use sales_core::category::group_key;
///
/// assert_eq!(group_key("Snacks (Imported)"), "Imported");
/// assert_eq!(group_key("Snacks"), "other");
/// ```
pub fn group_key(label: &str) -> String {
    paren_pattern()
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(OTHER_CATEGORY)
        .to_string()
}

/// Text preceding the first `(`, trimmed.
///
/// Returns [`OTHER_CATEGORY`] for blank labels and for labels with nothing
/// before the parenthesis.
///
/// # Examples
///
/// ```
/// use sales_core::category::prefix_key;
///
/// assert_eq!(prefix_key("Snacks (Imported)"), "Snacks");
/// assert_eq!(prefix_key("   "), "other");
/// ```
pub fn prefix_key(label: &str) -> String {
    let prefix = match label.find('(') {
        Some(idx) => &label[..idx],
        None => label,
    };

    match prefix.trim() {
        "" => OTHER_CATEGORY.to_string(),
        trimmed => trimmed.to_string(),
    }
}
