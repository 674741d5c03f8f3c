//! Word segmentation with bounding-box synthesis.
//!
//! Used when the granularity of the text layer does not match the words
//! hOCR wants: either the layer goes down to characters, or it stops at a
//! text run that has to be split. Both paths run a word-break pass over the
//! text and derive a box for every resulting word.

use std::fmt;
use std::sync::Arc;

use super::hocr::{WORD_CLASS, WORD_TAG};
use super::{RenderOptions, WordSegmentation};
use crate::error::Result;
use crate::model::{bbox_title, bboxes_title, BBox, Element, Zone};
use icu_locale_core::LanguageIdentifier;
use icu_segmenter::options::{WordBreakInvariantOptions, WordBreakOptions};
use icu_segmenter::WordSegmenter;
use log::warn;

/// Splits text into words and builds word elements for them.
#[derive(Clone)]
pub struct WordBreaker {
    strategy: WordSegmentation,
    language: String,
    segmenter: Option<Arc<WordSegmenter>>,
}

impl WordBreaker {
    /// Create a word breaker.
    ///
    /// For [`WordSegmentation::Uax29`] the language tag becomes the content
    /// locale of a dictionary-backed segmenter, so scripts written without
    /// spaces (Thai, Chinese, Japanese...) are split into words rather than
    /// code points. A tag that is not a valid locale falls back to the root
    /// rules.
    pub fn new(strategy: WordSegmentation, language: impl Into<String>) -> Self {
        let language = language.into();
        let segmenter = match strategy {
            WordSegmentation::Simple => None,
            WordSegmentation::Uax29 => dictionary_segmenter(&language).map(Arc::new),
        };
        Self {
            strategy,
            language,
            segmenter,
        }
    }

    /// Create a word breaker from run-wide options.
    pub fn from_options(options: &RenderOptions) -> Self {
        Self::new(options.segmentation, options.language.clone())
    }

    /// Segmentation strategy in use.
    pub fn strategy(&self) -> WordSegmentation {
        self.strategy
    }

    /// Word boundaries as code-point offsets.
    ///
    /// The offsets are strictly increasing and end at the text length; an
    /// empty text has no boundaries. Each consecutive pair delimits either a
    /// word or a whitespace run.
    pub fn boundaries(&self, text: &str) -> Vec<usize> {
        match self.strategy {
            WordSegmentation::Simple => whitespace_boundaries(text),
            WordSegmentation::Uax29 => {
                let breaks: Vec<usize> = match &self.segmenter {
                    Some(segmenter) => segmenter.as_borrowed().segment_str(text).collect(),
                    None => WordSegmenter::new_dictionary(WordBreakInvariantOptions::default())
                        .segment_str(text)
                        .collect(),
                };
                char_offsets(text, &breaks)
            }
        }
    }

    /// Rebuild words from character-level zones.
    ///
    /// Every character gets a box (a zone holding several code points has
    /// its box divided evenly among them); a word's box is the union of its
    /// characters' boxes, and its title lists each of them.
    pub fn break_chars(&self, zones: &[Zone]) -> Result<Vec<Element>> {
        let mut text = String::new();
        let mut boxes = Vec::new();
        for zone in zones {
            let zone_text = zone.text()?;
            let len = zone_text.chars().count();
            if len == 0 {
                continue;
            }
            let bbox = zone.bbox();
            boxes.extend((0..len).map(|i| bbox.horizontal_slice(i, i + 1, len)));
            text.push_str(zone_text);
        }

        Ok(self.build_words(&text, |start, end| {
            let parts = &boxes[start..end];
            let bbox = BBox::union_all(parts);
            bboxes_title(&bbox, parts)
        }))
    }

    /// Split a text run that spans `bbox` into words.
    ///
    /// Glyphs are assumed to be of equal width, so each word's horizontal
    /// extent is interpolated from its code-point offsets.
    pub fn break_plain_text(&self, text: &str, bbox: &BBox) -> Vec<Element> {
        let len = text.chars().count();
        self.build_words(text, |start, end| {
            bbox_title(&bbox.horizontal_slice(start, end, len))
        })
    }

    fn build_words<F>(&self, text: &str, mut title: F) -> Vec<Element>
    where
        F: FnMut(usize, usize) -> String,
    {
        let chars: Vec<char> = text.chars().collect();
        let mut words: Vec<Element> = Vec::new();
        let mut start = 0;
        for end in self.boundaries(text) {
            let segment = &chars[start..end];
            if segment.iter().all(|c| c.is_whitespace()) {
                if let Some(last) = words.last_mut() {
                    last.set_tail(" ");
                }
            } else {
                let mut word = Element::new(WORD_TAG, WORD_CLASS, title(start, end));
                word.set_text(&segment.iter().collect::<String>());
                words.push(word);
            }
            start = end;
        }
        words
    }
}

impl fmt::Debug for WordBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordBreaker")
            .field("strategy", &self.strategy)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

fn dictionary_segmenter(language: &str) -> Option<WordSegmenter> {
    let locale = match language.replace('_', "-").parse::<LanguageIdentifier>() {
        Ok(locale) => Some(locale),
        Err(e) => {
            warn!(
                "language {:?} is not a locale ({}), using root word-break rules",
                language, e
            );
            None
        }
    };
    let mut options = WordBreakOptions::default();
    options.content_locale = locale.as_ref();
    match WordSegmenter::try_new_dictionary(options) {
        Ok(segmenter) => Some(segmenter),
        Err(e) => {
            warn!("no word-break data for {:?} ({}), using root rules", language, e);
            None
        }
    }
}

/// Convert byte offsets of word breaks into code-point offsets, dropping
/// the leading zero.
fn char_offsets(text: &str, breaks: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(breaks.len());
    let mut last = 0;
    let mut count = 0;
    for &b in breaks {
        if b <= last {
            continue;
        }
        count += text[last..b].chars().count();
        offsets.push(count);
        last = b;
    }
    offsets
}

fn whitespace_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut chars = text.chars();
    let mut in_space = match chars.next() {
        Some(c) => c.is_whitespace(),
        None => return boundaries,
    };
    let mut count = 1;
    for c in chars {
        if c.is_whitespace() != in_space {
            boundaries.push(count);
            in_space = !in_space;
        }
        count += 1;
    }
    boundaries.push(count);
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ZoneContent, ZoneType};

    fn simple() -> WordBreaker {
        WordBreaker::new(WordSegmentation::Simple, "eng")
    }

    fn uax29() -> WordBreaker {
        WordBreaker::new(WordSegmentation::Uax29, "eng")
    }

    fn char_zone(text: &str, x0: i64, x1: i64) -> Zone {
        Zone::new(
            ZoneType::Character,
            BBox::new(x0, 0, x1, 10),
            ZoneContent::Text(text.to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_simple_boundaries() {
        assert_eq!(simple().boundaries("AB CD"), vec![2, 3, 5]);
        assert_eq!(simple().boundaries("  x"), vec![2, 3]);
        assert!(simple().boundaries("").is_empty());
    }

    #[test]
    fn test_uax29_boundaries() {
        assert_eq!(uax29().boundaries("AB CD"), vec![2, 3, 5]);
        // Punctuation is its own segment
        assert_eq!(uax29().boundaries("Hi, yo"), vec![2, 3, 4, 6]);
    }

    #[test]
    fn test_uax29_groups_scripts_without_spaces() {
        for (language, text) in [("tha", "ภาษาไทย"), ("zh", "我们是学生")] {
            let breaker = WordBreaker::new(WordSegmentation::Uax29, language);
            let boundaries = breaker.boundaries(text);
            let len = text.chars().count();

            assert_eq!(boundaries.last(), Some(&len));
            assert!(
                boundaries.len() < len,
                "{} split per code point: {:?}",
                language,
                boundaries
            );
            assert!(breaker.break_plain_text(text, &BBox::new(0, 0, 70, 10)).len() < len);
        }
    }

    #[test]
    fn test_uax29_unknown_locale_uses_root_rules() {
        let breaker = WordBreaker::new(WordSegmentation::Uax29, "abcd");
        assert_eq!(breaker.boundaries("AB CD"), vec![2, 3, 5]);
        assert!(breaker.boundaries("").is_empty());
    }

    #[test]
    fn test_char_offsets() {
        // "ż" is two bytes
        assert_eq!(char_offsets("żb c", &[0, 3, 4, 5]), vec![2, 3, 4]);
        assert!(char_offsets("", &[0]).is_empty());
    }

    #[test]
    fn test_break_plain_text() {
        let words = uax29().break_plain_text("AB CD", &BBox::new(0, 0, 100, 10));
        assert_eq!(words.len(), 2);

        assert_eq!(words[0].text.as_deref(), Some("AB"));
        assert_eq!(words[0].title, "bbox 0 0 40 10");
        assert_eq!(words[0].tail.as_deref(), Some(" "));

        assert_eq!(words[1].text.as_deref(), Some("CD"));
        assert_eq!(words[1].title, "bbox 60 0 100 10");
        assert_eq!(words[1].tail, None);
        assert_eq!(words[1].class, "ocrx_word");
    }

    #[test]
    fn test_break_plain_text_counts_code_points() {
        let words = simple().break_plain_text("żó ab", &BBox::new(0, 0, 50, 10));
        assert_eq!(words[0].title, "bbox 0 0 20 10");
        assert_eq!(words[1].title, "bbox 30 0 50 10");
    }

    #[test]
    fn test_break_chars() {
        let zones = vec![
            char_zone("H", 0, 10),
            char_zone("i", 10, 15),
            char_zone(" ", 15, 20),
            char_zone("x", 20, 30),
        ];
        let words = simple().break_chars(&zones).unwrap();
        assert_eq!(words.len(), 2);

        assert_eq!(words[0].text.as_deref(), Some("Hi"));
        assert_eq!(
            words[0].title,
            "bbox 0 0 15 10; bboxes 0 0 10 10, 10 0 15 10"
        );
        assert_eq!(words[0].tail.as_deref(), Some(" "));

        assert_eq!(words[1].text.as_deref(), Some("x"));
        assert_eq!(words[1].title, "bbox 20 0 30 10; bboxes 20 0 30 10");
    }

    #[test]
    fn test_break_chars_splits_multi_codepoint_zone() {
        let zones = vec![char_zone("ab", 0, 10), char_zone("", 10, 12)];
        let words = simple().break_chars(&zones).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text.as_deref(), Some("ab"));
        assert_eq!(
            words[0].title,
            "bbox 0 0 10 10; bboxes 0 0 5 10, 5 0 10 10"
        );
    }

    #[test]
    fn test_break_chars_is_deterministic() {
        let zones = vec![char_zone("a", 0, 5), char_zone("b", 5, 9)];
        let breaker = uax29();
        assert_eq!(
            breaker.break_chars(&zones).unwrap(),
            breaker.break_chars(&zones).unwrap()
        );
    }

    #[test]
    fn test_leading_whitespace_has_no_owner() {
        let words = simple().break_plain_text(" a", &BBox::new(0, 0, 20, 10));
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].title, "bbox 10 0 20 10");
        assert_eq!(words[0].tail, None);
    }
}
