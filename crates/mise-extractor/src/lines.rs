//! Line-level cues shared by the heuristic and pattern strategies

use crate::locale::{normalize_token, Vocabulary};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<mixed>\d+)\s+(?P<mixnum>\d+)/(?P<mixden>\d+)|(?P<num>\d+)/(?P<den>\d+)|(?P<dec>\d+(?:[.,]\d+)?)\s*(?P<glyph>[½¼¾⅓⅔⅛])?|(?P<only>[½¼¾⅓⅔⅛]))(?:\s*[-–]\s*\d+(?:[.,]\d+)?)?",
    )
    .unwrap()
});

static ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:schritt|step)\s+\d{1,2}\s*[.:)]?|\d{1,2}\s*[.)])\s+(?P<text>\S.*)$").unwrap()
});

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-•*·–]\s+(?P<text>\S.*)$").unwrap());

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<n>\d+(?:[.,]\d+)?)\s*(?P<unit>stunden|stunde|std|hours|hour|hrs|hr|h|minuten|minute|minutes|mins|min)\b",
    )
    .unwrap()
});

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Section of a recipe a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// After an ingredient heading
    Ingredients,
    /// After a step heading
    Steps,
}

/// An ingredient line broken into parts
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedIngredient {
    /// Numeric amount
    pub amount: Option<f64>,
    /// Unit as written, trailing '.' removed
    pub unit: Option<String>,
    /// Ingredient name
    pub name: String,
}

/// Text of a `#` heading line
pub fn heading_text(line: &str) -> Option<&str> {
    let line = line.trim();
    if !line.starts_with('#') {
        return None;
    }
    let text = line.trim_start_matches('#').trim();
    (!text.is_empty()).then_some(text)
}

/// Instruction text of an ordinal step line ("1. Mehl sieben" -> "Mehl sieben")
pub fn ordinal_step(line: &str) -> Option<&str> {
    ORDINAL_RE
        .captures(line.trim())
        .and_then(|c| c.name("text"))
        .map(|m| m.as_str().trim())
}

/// Item text of a bulleted line
pub fn bullet_item(line: &str) -> Option<&str> {
    BULLET_RE
        .captures(line.trim())
        .and_then(|c| c.name("text"))
        .map(|m| m.as_str().trim())
}

fn glyph_value(glyph: &str) -> f64 {
    match glyph {
        "½" => 0.5,
        "¼" => 0.25,
        "¾" => 0.75,
        "⅓" => 1.0 / 3.0,
        "⅔" => 2.0 / 3.0,
        "⅛" => 0.125,
        _ => 0.0,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.replace(',', ".").parse().ok()
}

fn amount_value(caps: &Captures<'_>) -> Option<f64> {
    if let (Some(whole), Some(num), Some(den)) =
        (caps.name("mixed"), caps.name("mixnum"), caps.name("mixden"))
    {
        let den = parse_number(den.as_str()).filter(|d| *d > 0.0)?;
        return Some(parse_number(whole.as_str())? + parse_number(num.as_str())? / den);
    }
    if let (Some(num), Some(den)) = (caps.name("num"), caps.name("den")) {
        let den = parse_number(den.as_str()).filter(|d| *d > 0.0)?;
        return Some(parse_number(num.as_str())? / den);
    }
    if let Some(dec) = caps.name("dec") {
        let glyph = caps.name("glyph").map_or(0.0, |g| glyph_value(g.as_str()));
        return Some(parse_number(dec.as_str())? + glyph);
    }
    caps.name("only").map(|g| glyph_value(g.as_str()))
}

/// Amount at the start of `text` and the remainder after it
pub fn leading_amount(text: &str) -> Option<(f64, &str)> {
    let caps = AMOUNT_RE.captures(text)?;
    let end = caps.get(0)?.end();
    let value = amount_value(&caps)?;
    Some((value, &text[end..]))
}

/// Whether the line opens with an amount
pub fn starts_with_amount(line: &str) -> bool {
    AMOUNT_RE.is_match(line.trim())
}

fn is_unit(token: &str, vocab: &Vocabulary, extra_units: &[String]) -> bool {
    let normalized = normalize_token(token);
    vocab.is_unit(token) || extra_units.iter().any(|u| u.to_lowercase() == normalized)
}

fn starts_alphabetic(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_alphabetic)
}

fn split_unit<'a>(
    rest: &'a str,
    vocab: &Vocabulary,
    extra_units: &[String],
) -> (Option<String>, &'a str) {
    let rest = rest.trim_start();
    let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let token = &rest[..token_end];
    if !token.is_empty() && is_unit(token, vocab, extra_units) {
        let unit = token.trim_end_matches('.').to_string();
        (Some(unit), rest[token_end..].trim_start())
    } else {
        (None, rest)
    }
}

fn clean_name(name: &str) -> String {
    let name = name.trim().trim_end_matches([',', ';', ':']).trim();
    name.strip_prefix("of ").unwrap_or(name).trim().to_string()
}

/// Parse "200 g Mehl", "2 Eier", "1 1/2 TL Salz"
pub fn ingredient_amount_first(
    line: &str,
    vocab: &Vocabulary,
    extra_units: &[String],
) -> Option<ParsedIngredient> {
    let line = line.trim();
    let (amount, rest) = leading_amount(line)?;
    let (unit, name) = split_unit(rest, vocab, extra_units);
    let name = clean_name(name);

    if name.is_empty() || !starts_alphabetic(&name) {
        return None;
    }
    if line.ends_with('.') && name.split_whitespace().count() > 3 {
        return None;
    }

    Some(ParsedIngredient {
        amount: Some(amount),
        unit,
        name,
    })
}

/// Parse "Mehl 200 g" or "Salz, 1 Prise"
pub fn ingredient_name_first(
    line: &str,
    vocab: &Vocabulary,
    extra_units: &[String],
) -> Option<ParsedIngredient> {
    let line = line.trim();
    let mut offset = 0;
    for word in line.split_whitespace() {
        let start = offset + line[offset..].find(word)?;
        offset = start + word.len();
        if start == 0 {
            continue;
        }
        let Some((amount, rest)) = leading_amount(&line[start..]) else {
            continue;
        };
        let name = clean_name(&line[..start]);
        if name.is_empty() || !starts_alphabetic(&name) {
            return None;
        }
        let (unit, _) = split_unit(rest, vocab, extra_units);
        return Some(ParsedIngredient {
            amount: Some(amount),
            unit,
            name,
        });
    }
    None
}

/// Total minutes of every duration in the line ("1 Std. 30 Min." -> 90)
pub fn duration_minutes(line: &str) -> Option<u32> {
    let mut total = 0.0;
    let mut found = false;
    for caps in DURATION_RE.captures_iter(line) {
        let Some(n) = caps.name("n").and_then(|m| parse_number(m.as_str())) else {
            continue;
        };
        let unit = caps.name("unit").map_or("", |m| m.as_str()).to_lowercase();
        let factor = if unit.starts_with('h') || unit.starts_with("st") { 60.0 } else { 1.0 };
        total += n * factor;
        found = true;
    }
    found.then(|| total.round() as u32)
}

/// First integer in the line
pub fn first_integer(line: &str) -> Option<u32> {
    INTEGER_RE
        .find(line)
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

/// Lowercase word tokens of a line
pub fn words(line: &str) -> Vec<String> {
    line.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether any marker occurs in the line, as a word or (multi-word) phrase
pub fn contains_marker<S: AsRef<str>>(line: &str, markers: &[S]) -> bool {
    let lower = line.to_lowercase();
    let tokens = words(line);
    markers.iter().any(|marker| {
        let marker = marker.as_ref();
        if marker.contains(' ') {
            lower.contains(marker)
        } else {
            tokens.iter().any(|t| t == marker)
        }
    })
}

/// Servings count when the line names one
pub fn servings<S: AsRef<str>>(line: &str, markers: &[S]) -> Option<u32> {
    if contains_marker(line, markers) {
        first_integer(line)
    } else {
        None
    }
}

/// Minutes when the line carries one of the markers and a duration
pub fn marked_duration<S: AsRef<str>>(line: &str, markers: &[S]) -> Option<u32> {
    if contains_marker(line, markers) {
        duration_minutes(line)
    } else {
        None
    }
}

/// Lowercase heading text without '#', trailing ':' or surrounding space
pub fn normalize_heading(line: &str) -> String {
    line.trim()
        .trim_start_matches('#')
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_lowercase()
}

fn opens_with(normalized: &str, heading: &str) -> bool {
    normalized
        .strip_prefix(heading)
        .is_some_and(|rest| !rest.chars().next().is_some_and(char::is_alphanumeric))
}

/// Whether the line is a heading that opens with `heading` (lowercase)
pub fn heading_matches(line: &str, heading: &str) -> bool {
    let normalized = normalize_heading(line);
    normalized.split_whitespace().count() <= 5
        && duration_minutes(&normalized).is_none()
        && opens_with(&normalized, heading)
}

/// Ingredient or step section heading ("Zutaten:", "## Method")
///
/// A line that carries a duration is a time line, not a heading.
pub fn section_heading(line: &str, vocab: &Vocabulary) -> Option<Section> {
    let normalized = normalize_heading(line);
    if normalized.is_empty() || normalized.split_whitespace().count() > 5 {
        return None;
    }
    if duration_minutes(&normalized).is_some() {
        return None;
    }
    if vocab.ingredient_headings.iter().any(|h| opens_with(&normalized, h)) {
        return Some(Section::Ingredients);
    }
    if vocab.step_headings.iter().any(|h| opens_with(&normalized, h)) {
        return Some(Section::Steps);
    }
    None
}

/// Whether the first or last word is an imperative verb
pub fn is_imperative(line: &str, vocab: &Vocabulary) -> bool {
    let mut tokens = line.split_whitespace();
    let first = tokens.next();
    let last = tokens.last();
    first.is_some_and(|t| vocab.is_imperative(t)) || last.is_some_and(|t| vocab.is_imperative(t))
}

/// Sentence-like line: terminal punctuation and at least four words
pub fn is_prose(line: &str) -> bool {
    let line = line.trim();
    (line.ends_with('.') || line.ends_with('!')) && line.split_whitespace().count() >= 4
}

/// Whether the line looks like a recipe title
///
/// Short, capitalised, no terminal punctuation, and none of the structural
/// cues (amount, ordinal, bullet, section heading, servings or time).
pub fn is_title_like(line: &str, vocab: &Vocabulary, max_words: usize) -> bool {
    let text = heading_text(line).unwrap_or_else(|| line.trim());
    if text.is_empty() || text.chars().count() > 80 {
        return false;
    }
    if text.split_whitespace().count() > max_words {
        return false;
    }
    if !text.chars().next().is_some_and(char::is_uppercase) {
        return false;
    }
    if text.ends_with(['.', ',', ':', ';']) {
        return false;
    }
    !(starts_with_amount(text)
        || ordinal_step(text).is_some()
        || bullet_item(text).is_some()
        || section_heading(text, vocab).is_some()
        || servings(text, vocab.servings_markers).is_some()
        || duration_minutes(text).is_some())
}
