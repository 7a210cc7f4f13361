//! Reduce a source unit to its narrative prose.
//!
//! Link and passage-structure markup is removed and whitespace collapsed, so
//! adding, removing, or reordering choices leaves the prose text unchanged.
use regex::Regex;
use std::sync::LazyLock;

static STRUCTURE_MARKUP: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // [[Target]], [[Text|Target]], [[Text->Target]], [[Target<-Text]],
        // and SugarCube setter links such as [[Text|Target][$x to 1]].
        r"\[\[.*?\]\](?:\[[^\]]*\])?",
        // Harlowe navigation macros; quoted arguments may contain parentheses.
        r#"\((?:link-goto|click-goto|link-reveal-goto|goto)\s*:(?:"[^"]*"|'[^']*'|[^)"'])*\)"#,
        // SugarCube navigation macros and their closing tags.
        r#"<<(?:goto|link|button|choice|actions|back|return)\b(?:"[^"]*"|'[^']*'|[^>"'])*>>"#,
        r"<</(?:link|button)>>",
        // Twee passage headers carry name, tags, and layout metadata.
        r"(?m)^::.*$",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("structure markup pattern"))
    .collect()
});

/// Remove link and passage-structure markup, keeping everything else.
pub fn strip_structure_markup(text: &str) -> String {
    STRUCTURE_MARKUP
        .iter()
        .fold(text.to_string(), |acc, pattern| {
            pattern.replace_all(&acc, " ").into_owned()
        })
}

/// Collapse every run of whitespace, blank lines included, to one space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prose used for the narrative-change comparison.
pub fn prose_text(text: &str) -> String {
    normalize_whitespace(&strip_structure_markup(text))
}
