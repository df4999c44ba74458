//! Step-answer parsers shared by every calculator.
//!
//! All matching is heuristic free-text matching: keywords are case-insensitive substrings and
//! are tried in list order, so the first listed keyword wins when several are present.

use regex::Regex;
use std::sync::LazyLock;

/// `(keyword, code)` pairs for an enumerated step; ordinal digits are keywords too.
pub type Keywords = [(&'static str, &'static str)];

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("Invalid regex"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("Invalid regex"));

const NEGATIVE_WORDS: &[&str] = &["нет", "не", "ноль", "no", "none"];

/// Largest count accepted for a single step; larger answers are re-asked.
pub const MAX_COUNT: u32 = 10_000;

/// Code of the first keyword contained in `input`.
pub fn match_keyword(input: &str, keywords: &Keywords) -> Option<&'static str> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    keywords
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, code)| *code)
}

/// Yes/no answer from an ordered `(keyword, value)` list.
pub fn match_flag(input: &str, keywords: &[(&str, bool)]) -> Option<bool> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    keywords
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, value)| *value)
}

/// First embedded integer, at most [`MAX_COUNT`]. A negative answer without digits counts
/// as zero.
pub fn parse_count(input: &str) -> Option<u32> {
    if let Some(m) = INTEGER.find(input) {
        return m
            .as_str()
            .parse::<u32>()
            .ok()
            .filter(|count| *count <= MAX_COUNT);
    }
    let lowered = input.to_lowercase();
    let negative = lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| NEGATIVE_WORDS.contains(&word));
    negative.then_some(0)
}

/// First embedded positive decimal; a comma is accepted as the decimal separator.
pub fn parse_decimal(input: &str) -> Option<f64> {
    let normalized = input.replace(',', ".");
    DECIMAL
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| *value > 0.0)
}

/// Like [`parse_decimal`], but blank input is a valid "no value" answer.
///
/// Returns `None` on a parse failure and `Some(None)` for an explicit blank.
pub fn parse_optional_decimal(input: &str) -> Option<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Some(None);
    }
    parse_decimal(trimmed).map(Some)
}

/// Multi-select answer.
///
/// A standalone `0` or any of `none_words` yields an empty selection. Otherwise comma
/// separated input takes the first number of each part and free text takes every number;
/// numbers map through `options`, and `synonyms` add further codes by keyword. Unknown
/// numbers are ignored and the result keeps first-seen order without duplicates.
pub fn parse_selection(
    input: &str,
    options: &Keywords,
    synonyms: &Keywords,
    none_words: &[&str],
) -> Vec<String> {
    let lowered = input.trim().to_lowercase();
    let numbers: Vec<&str> = if lowered.contains(',') {
        lowered
            .split(',')
            .filter_map(|part| INTEGER.find(part).map(|m| m.as_str()))
            .collect()
    } else {
        INTEGER.find_iter(&lowered).map(|m| m.as_str()).collect()
    };

    if numbers.contains(&"0") || none_words.iter().any(|word| lowered.contains(word)) {
        return Vec::new();
    }

    let mut selected: Vec<String> = Vec::new();
    let mut push = |code: &str| {
        if !selected.iter().any(|s| s == code) {
            selected.push(code.to_string());
        }
    };

    for number in numbers {
        if let Some((_, code)) = options.iter().find(|(digit, _)| *digit == number) {
            push(*code);
        }
    }
    for (keyword, code) in synonyms {
        if lowered.contains(keyword) {
            push(*code);
        }
    }
    selected
}
