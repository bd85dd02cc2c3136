//! Alias & Trigger Tables
//!
//! Static mappings from canonical map locations to their garden names, and
//! the trigger keywords that make gossip more likely.

/// Canonical location -> alias, as used in rumor text.
pub const RUMOR_LOCATION_ALIASES: &[(&str, &str)] = &[
    ("Isabella Rodriguez's apartment", "怡红院"),
    ("Dorm for Oak Hill College", "潇湘馆"),
    ("The Rose and Crown Pub", "蘅芜苑"),
    ("Johnson Park", "沁芳亭"),
    ("Harvey Oak Supply Store", "稻香村"),
];

/// Canonical location -> alias, as used when placing scenes.
pub const SCENE_LOCATION_ALIASES: &[(&str, &str)] = &[
    ("Isabella Rodriguez's apartment", "怡红院"),
    ("Dorm for Oak Hill College", "潇湘馆"),
    ("The Rose and Crown Pub", "蘅芜苑"),
    ("Johnson Park", "沁芳亭"),
    ("Hobbs Cafe", "正厅"),
];

/// Names and places whose mention makes a conversation gossip-worthy.
pub const TRIGGER_KEYWORDS: &[&str] = &[
    "沁芳亭", "潇湘馆", "怡红院", "蘅芜苑", "稻香村", "宝玉", "黛玉", "宝钗",
];

/// Alias for a canonical location in rumor text.
pub fn rumor_alias(location: &str) -> Option<&'static str> {
    RUMOR_LOCATION_ALIASES
        .iter()
        .find(|(canonical, _)| *canonical == location)
        .map(|(_, alias)| *alias)
}

/// Canonical location for a rumor alias.
pub fn location_for_alias(alias: &str) -> Option<&'static str> {
    RUMOR_LOCATION_ALIASES
        .iter()
        .find(|(_, a)| *a == alias)
        .map(|(canonical, _)| *canonical)
}

/// First `(alias, canonical)` pair, in table order, whose alias occurs in `text`.
pub fn first_alias_in(text: &str) -> Option<(&'static str, &'static str)> {
    RUMOR_LOCATION_ALIASES
        .iter()
        .find(|(_, alias)| text.contains(alias))
        .map(|(canonical, alias)| (*alias, *canonical))
}

/// Scene alias for a location; unknown locations pass through unchanged.
pub fn scene_alias(location: &str) -> &str {
    SCENE_LOCATION_ALIASES
        .iter()
        .find(|(canonical, _)| *canonical == location)
        .map_or(location, |(_, alias)| *alias)
}

/// Trigger keywords that appear in `text`, in table order.
pub fn triggers_in(text: &str) -> impl Iterator<Item = &'static str> + '_ {
    TRIGGER_KEYWORDS.iter().copied().filter(move |kw| text.contains(kw))
}

/// Probability bonus for `text`: `per_keyword` for each distinct trigger present.
pub fn trigger_boost(text: &str, per_keyword: f64) -> f64 {
    triggers_in(text).count() as f64 * per_keyword
}
