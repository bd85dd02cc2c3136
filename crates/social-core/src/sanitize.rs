//! Text Filter
//!
//! Generated text is filtered before it reaches a memory store: asides in
//! parentheses and fragments that reveal the underlying map are removed.

use regex::Regex;

/// A pure string filter. Implementations must be idempotent and never fail.
pub trait TextFilter: Send + Sync {
    fn sanitize(&self, text: &str) -> String;
}

/// Default filter for the garden setting.
///
/// Removes `(...)` and `（...）` asides, drops any clause mentioning the
/// College/Dorm/University map names, then collapses whitespace.
#[derive(Debug, Clone)]
pub struct WorldSanitizer {
    ascii_aside: Regex,
    wide_aside: Regex,
    map_clause: Regex,
    spaces: Regex,
}

impl WorldSanitizer {
    pub fn new() -> Self {
        // literal patterns; compilation cannot fail
        let compile = |pattern: &str| Regex::new(pattern).expect("literal pattern");
        Self {
            ascii_aside: compile(r"\([^)]*\)"),
            wide_aside: compile(r"（[^）]*）"),
            map_clause: compile(r"[^，。！？、]*\b(?:College|Dorm|University)\b[^，。！？、]*"),
            spaces: compile(r"\s{2,}"),
        }
    }
}

impl Default for WorldSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFilter for WorldSanitizer {
    fn sanitize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let text = self.ascii_aside.replace_all(text, "");
        let text = self.wide_aside.replace_all(&text, "");
        let text = self.map_clause.replace_all(&text, "");
        self.spaces.replace_all(&text, " ").trim().to_string()
    }
}
