//! Structural document fingerprints
//!
//! Only layout features go into the hash: how lines are shaped, how numbers
//! are written, whether pages are broken. Words never do, so two books from
//! the same layout family share a fingerprint even when every recipe differs.

use crate::lines::{bullet_item, heading_text, is_prose, leading_amount, ordinal_step};
use mise_domain::Fingerprint;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static COMMA_DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d,\d").unwrap());
static DOT_DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d\.\d").unwrap());
static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d/\d|[½¼¾⅓⅔⅛]").unwrap());

const HEX_DIGITS: usize = 16;

#[derive(Debug, Default)]
struct LineShapes {
    total: usize,
    headings: usize,
    numbered: usize,
    quantity_led: usize,
    bullets: usize,
    prose: usize,
    blank_runs: usize,
}

/// Share of lines rounded into one of five bins (0..=4)
fn share_bin(count: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 4.0).round() as usize
}

fn count_bin(count: usize) -> &'static str {
    match count {
        0 => "none",
        1..=3 => "few",
        _ => "many",
    }
}

fn line_shapes(text: &str) -> LineShapes {
    let mut shapes = LineShapes::default();
    let mut blank = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank += 1;
            continue;
        }
        if blank >= 2 {
            shapes.blank_runs += 1;
        }
        blank = 0;

        shapes.total += 1;
        if heading_text(line).is_some() {
            shapes.headings += 1;
        } else if ordinal_step(line).is_some() {
            shapes.numbered += 1;
        } else if leading_amount(line).is_some() {
            shapes.quantity_led += 1;
        } else if bullet_item(line).is_some() {
            shapes.bullets += 1;
        } else if is_prose(line) {
            shapes.prose += 1;
        }
    }
    shapes
}

fn decimal_style(text: &str) -> &'static str {
    match (COMMA_DECIMAL_RE.is_match(text), DOT_DECIMAL_RE.is_match(text)) {
        (true, true) => "mixed",
        (true, false) => "comma",
        (false, true) => "dot",
        (false, false) => "none",
    }
}

/// Dominant casing of the short token right after a leading amount
fn unit_casing(text: &str) -> &'static str {
    let (mut upper, mut capital, mut lower) = (0usize, 0usize, 0usize);
    for line in text.lines() {
        let Some((_, rest)) = leading_amount(line.trim()) else {
            continue;
        };
        let Some(token) = rest.split_whitespace().next() else {
            continue;
        };
        let token = token.trim_end_matches('.');
        if token.is_empty()
            || token.chars().count() > 4
            || !token.chars().all(char::is_alphabetic)
        {
            continue;
        }
        if token.chars().all(char::is_uppercase) {
            upper += 1;
        } else if token.chars().next().is_some_and(char::is_uppercase) {
            capital += 1;
        } else {
            lower += 1;
        }
    }
    match (upper, capital, lower) {
        (0, 0, 0) => "none",
        (u, c, l) if u >= c && u >= l => "upper",
        (_, c, l) if c >= l => "capital",
        _ => "lower",
    }
}

/// Layout feature string that is hashed into the fingerprint
fn features(text: &str) -> String {
    let shapes = line_shapes(text);
    format!(
        "h{}|n{}|q{}|b{}|p{}|gaps:{}|pb:{}|dec:{}|frac:{}|units:{}",
        share_bin(shapes.headings, shapes.total),
        share_bin(shapes.numbered, shapes.total),
        share_bin(shapes.quantity_led, shapes.total),
        share_bin(shapes.bullets, shapes.total),
        share_bin(shapes.prose, shapes.total),
        count_bin(shapes.blank_runs),
        text.contains('\x0c'),
        decimal_style(text),
        FRACTION_RE.is_match(text),
        unit_casing(text),
    )
}

/// Compute the structural fingerprint of a document
pub fn compute(text: &str) -> Fingerprint {
    let digest = Sha256::digest(features(text).as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HEX_DIGITS);
    Fingerprint::new(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_and_short() {
        let text = "# Brot\n500 g Mehl\n1. Kneten";
        let a = compute(text);
        assert_eq!(a, compute(text));
        assert_eq!(a.as_str().len(), HEX_DIGITS);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_words_do_not_matter() {
        let a = compute("# Brot\n500 g Mehl\n1. Kneten");
        let b = compute("# Kuchen\n250 g Zucker\n1. Backen");
        assert_eq!(a, b);
    }

    #[test]
    fn test_layout_changes_fingerprint() {
        let numbered = compute("# Brot\n500 g Mehl\n1. Kneten");
        let bulleted = compute("Brot\n- Mehl\n- Wasser\nDen Teig lange kneten und backen.");
        assert_ne!(numbered, bulleted);

        let upper = compute("Brot\n2 EL Öl\n1 TL Salz");
        let lower = compute("Brot\n2 el Öl\n1 tl Salz");
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_decimal_style() {
        assert_eq!(decimal_style("1,5 l Milch"), "comma");
        assert_eq!(decimal_style("1.5 cups milk"), "dot");
        assert_eq!(decimal_style("2 Eier"), "none");
    }
}
