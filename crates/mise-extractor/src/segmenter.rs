//! Splits document text into candidate recipes

use crate::config::ExtractorConfig;
use crate::error::SegmentationError;
use crate::lines::{heading_text, is_title_like};
use crate::locale::Locale;
use mise_domain::Segment;
use std::collections::BTreeSet;
use std::ops::Range;

const PAGE_BREAK: char = '\x0c';

/// Splits a document into ordered, disjoint segments covering all of it
///
/// Boundaries come from the extractor's hints and from layout markers in
/// the text: page breaks, `#` headings, and blank-line gaps followed by a
/// title-like line. Whitespace-only pieces are folded into a neighbour.
#[derive(Debug, Clone)]
pub struct Segmenter {
    locale: Locale,
    min_gap_lines: usize,
    max_title_words: usize,
}

impl Segmenter {
    /// Create a new segmenter
    pub fn new(locale: Locale, min_gap_lines: usize, max_title_words: usize) -> Self {
        Self {
            locale,
            min_gap_lines: min_gap_lines.max(1),
            max_title_words,
        }
    }

    /// Segmenter with the knobs from an extractor configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.locale, config.min_gap_lines, config.max_title_words)
    }

    /// Segment `text`, honouring the extractor's boundary hints
    pub fn segment(&self, text: &str, hints: &[usize]) -> Result<Vec<Segment>, SegmentationError> {
        if text.trim().is_empty() {
            return Err(SegmentationError::Empty);
        }
        self.validate_hints(text, hints)?;

        let (mut boundaries, starts_with_recipe) = self.layout_boundaries(text);
        boundaries.extend(hints.iter().copied());
        boundaries.retain(|&b| b > 0 && b < text.len());

        if boundaries.is_empty() && hints.is_empty() && !starts_with_recipe {
            return Err(SegmentationError::NoBoundary);
        }

        let ranges = fold_blank_pieces(text, &boundaries);
        Ok(ranges
            .into_iter()
            .enumerate()
            .map(|(index, range)| {
                let raw_text = text[range.clone()].to_string();
                let heading_guess = self.heading_guess(&raw_text);
                Segment {
                    index,
                    offset_range: range,
                    raw_text,
                    heading_guess,
                }
            })
            .collect())
    }

    fn validate_hints(&self, text: &str, hints: &[usize]) -> Result<(), SegmentationError> {
        let mut previous: Option<usize> = None;
        for &offset in hints {
            if offset > text.len() {
                return Err(SegmentationError::InvalidHint {
                    offset,
                    reason: format!("beyond end of text ({} bytes)", text.len()),
                });
            }
            if !text.is_char_boundary(offset) {
                return Err(SegmentationError::InvalidHint {
                    offset,
                    reason: "not on a UTF-8 character boundary".to_string(),
                });
            }
            if previous.is_some_and(|p| offset <= p) {
                return Err(SegmentationError::InvalidHint {
                    offset,
                    reason: "hints must be strictly increasing".to_string(),
                });
            }
            previous = Some(offset);
        }
        Ok(())
    }

    /// Boundary offsets from layout markers, and whether the text opens
    /// with a heading or title
    fn layout_boundaries(&self, text: &str) -> (BTreeSet<usize>, bool) {
        let vocab = self.locale.vocabulary();
        let mut boundaries = BTreeSet::new();
        let mut starts_with_recipe = false;
        let mut seen_content = false;
        let mut blank_run = 0usize;
        let mut offset = 0usize;

        for (i, c) in text.char_indices() {
            if c == PAGE_BREAK {
                boundaries.insert(i + c.len_utf8());
            }
        }

        for line in text.split_inclusive('\n') {
            let start = offset;
            offset += line.len();

            let trimmed = line.trim();
            if trimmed.is_empty() {
                blank_run += 1;
                continue;
            }

            let is_heading = heading_text(trimmed).is_some();
            let title_like = is_title_like(trimmed, vocab, self.max_title_words);

            if !seen_content {
                starts_with_recipe = is_heading || title_like;
                seen_content = true;
            } else if is_heading || (blank_run >= self.min_gap_lines && title_like) {
                boundaries.insert(start);
            }
            blank_run = 0;
        }

        (boundaries, starts_with_recipe)
    }

    fn heading_guess(&self, raw: &str) -> Option<String> {
        let first = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
        if let Some(text) = heading_text(first) {
            return Some(text.to_string());
        }
        is_title_like(first, self.locale.vocabulary(), self.max_title_words)
            .then(|| first.to_string())
    }
}

/// Cut `text` at `boundaries`, merging whitespace-only pieces into the
/// previous piece (or the next, at the start)
fn fold_blank_pieces(text: &str, boundaries: &BTreeSet<usize>) -> Vec<Range<usize>> {
    let mut cuts = Vec::with_capacity(boundaries.len() + 2);
    cuts.push(0);
    cuts.extend(boundaries.iter().copied());
    cuts.push(text.len());

    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut pending_start: Option<usize> = None;

    for pair in cuts.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start == end {
            continue;
        }
        if text[start..end].trim().is_empty() {
            match ranges.last_mut() {
                Some(last) => last.end = end,
                None => pending_start = pending_start.or(Some(start)),
            }
            continue;
        }
        let start = pending_start.take().unwrap_or(start);
        ranges.push(start..end);
    }

    ranges
}
