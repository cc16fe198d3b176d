//! Bidirectional emoji icon ↔ canonical category label mapping.
//!
//! Both directions are total: unrecognized input degrades to the default
//! instead of failing, so display cosmetics can never block a record from
//! being saved.

/// Canonical label used when an icon (or label) is unrecognized.
pub const DEFAULT_CATEGORY: &str = "shopping";

/// Icon returned for unrecognized labels.
pub const DEFAULT_ICON: &str = "🛒";

const ICON_CATEGORIES: [(&str, &str); 15] = [
    ("🛒", "shopping"),
    ("🍔", "food"),
    ("🚗", "transport"),
    ("🏥", "health"),
    ("📚", "education"),
    ("🎬", "entertainment"),
    ("✈️", "travel"),
    ("🏠", "housing"),
    ("⚡", "utilities"),
    ("💻", "electronics"),
    ("👕", "clothing"),
    ("🎮", "gaming"),
    ("🌮", "dining"),
    ("☕", "beverages"),
    ("🎫", "events"),
];

/// Maps a client-facing icon to its storage label.
pub fn icon_to_category(icon: &str) -> &'static str {
    ICON_CATEGORIES
        .iter()
        .find_map(|(i, c)| (*i == icon).then_some(*c))
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Maps a storage label back to its client-facing icon.
pub fn category_to_icon(category: &str) -> &'static str {
    ICON_CATEGORIES
        .iter()
        .find_map(|(i, c)| (*c == category).then_some(*i))
        .unwrap_or(DEFAULT_ICON)
}

/// Returns true when `category` is one of the canonical labels.
pub fn is_known_category(category: &str) -> bool {
    ICON_CATEGORIES.iter().any(|(_, c)| *c == category)
}
