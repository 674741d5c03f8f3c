//! Zone-tree to hOCR element-tree transformation.
//!
//! The builder walks a page's zone tree top-down and assembles elements
//! bottom-up. Two situations make it re-segment words itself instead of
//! mirroring the zones one-to-one:
//!
//! - **Character-level zones.** Characters have no hOCR class. Processing
//!   one yields [`ZoneOutcome::NeedsCharacterFallback`], which only the
//!   character's parent handles: it drops its own wrapper, rebuilds words
//!   from all of its character children and hands them to its own parent.
//! - **Word-level text runs** with locale-aware segmentation. A word zone
//!   whose text is a plain run is split again and replaced by the words
//!   found, with boxes interpolated along the run.

use super::hocr::zone_to_hocr;
use super::segment::WordBreaker;
use super::RenderOptions;
use crate::error::{Error, Result};
use crate::model::{BBox, Element, Zone, ZoneContent, ZoneType};
use log::debug;

/// What a processed zone contributes to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// The zone's own element
    Wrapper(Element),
    /// Elements to splice into the parent in place of the zone
    Inline(Vec<Element>),
    /// Nothing
    Suppressed,
}

/// Result of processing one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneOutcome {
    /// The zone was handled
    Emitted(Emission),
    /// The zone is character-level; the parent must rebuild words from
    /// its children
    NeedsCharacterFallback,
}

/// Builds the hOCR element tree of one page.
pub struct TreeBuilder {
    breaker: WordBreaker,
    page_bbox: BBox,
}

impl TreeBuilder {
    /// Create a builder for a page with the given full-page box.
    pub fn new(options: &RenderOptions, page_bbox: BBox) -> Self {
        Self::with_breaker(WordBreaker::from_options(options), page_bbox)
    }

    /// Create a builder reusing a word breaker shared across pages.
    pub fn with_breaker(breaker: WordBreaker, page_bbox: BBox) -> Self {
        Self { breaker, page_bbox }
    }

    /// Build the element tree for a page.
    ///
    /// `None` stands for a page without a text layer and yields an empty
    /// page container.
    pub fn build_page(&self, zone: Option<&Zone>) -> Result<Element> {
        let zone = match zone {
            Some(zone) => zone,
            None => {
                return Ok(Element::with_bbox("div", "ocr_page", &self.page_bbox));
            }
        };
        match self.process(zone, false, true)? {
            ZoneOutcome::Emitted(Emission::Wrapper(root)) => Ok(root),
            ZoneOutcome::Emitted(_) => Err(Error::Render(format!(
                "{} root zone produced no element",
                zone.zone_type()
            ))),
            ZoneOutcome::NeedsCharacterFallback => Err(Error::ZoneShape(
                "character zone at the root of a page".to_string(),
            )),
        }
    }

    /// Process one zone.
    ///
    /// `has_parent` is false only for the root of the page tree; `is_last`
    /// tells whether the zone is the last of its siblings.
    pub fn process(&self, zone: &Zone, has_parent: bool, is_last: bool) -> Result<ZoneOutcome> {
        let zone_type = zone.zone_type();
        let (tag, class) = match zone_to_hocr(zone_type) {
            Some(mapping) => mapping,
            None => return Ok(ZoneOutcome::NeedsCharacterFallback),
        };
        let bbox = if zone_type == ZoneType::Page {
            self.page_bbox
        } else {
            zone.bbox()
        };
        let mut element = Element::with_bbox(tag, class, &bbox);

        let emission = match zone.content() {
            ZoneContent::Children(children) => {
                let last_index = children.len() - 1;
                for (i, child) in children.iter().enumerate() {
                    if child.zone_type() <= ZoneType::Line {
                        if let Some(previous) = element.last_child_mut() {
                            previous.set_tail("\n");
                        }
                    }
                    match self.process(child, true, i == last_index)? {
                        ZoneOutcome::Emitted(Emission::Wrapper(e)) => element.push(e),
                        ZoneOutcome::Emitted(Emission::Inline(elements)) => {
                            element.children.extend(elements)
                        }
                        ZoneOutcome::Emitted(Emission::Suppressed) => {}
                        ZoneOutcome::NeedsCharacterFallback => {
                            debug!(
                                "{} zone at {} has character-level details, rebuilding words",
                                zone_type, bbox
                            );
                            let words = self.character_fallback(zone_type, children, is_last)?;
                            if !has_parent {
                                // No grandparent to take the words: keep the wrapper.
                                let mut root = Element::with_bbox(tag, class, &bbox);
                                root.children = words;
                                return Ok(ZoneOutcome::Emitted(Emission::Wrapper(root)));
                            }
                            return Ok(ZoneOutcome::Emitted(splice(words)));
                        }
                    }
                }
                Emission::Wrapper(element)
            }
            ZoneContent::Text(text) => {
                if zone_type >= ZoneType::Word
                    && self.breaker.strategy().is_locale_aware()
                    && has_parent
                {
                    debug!("re-segmenting {} zone text {:?}", zone_type, text);
                    let mut words = self.breaker.break_plain_text(text, &bbox);
                    mark_word_end(&mut words, zone_type, is_last);
                    splice(words)
                } else {
                    element.set_text(text);
                    if zone_type == ZoneType::Word && !is_last {
                        element.set_tail(" ");
                    }
                    Emission::Wrapper(element)
                }
            }
        };
        Ok(ZoneOutcome::Emitted(emission))
    }

    fn character_fallback(
        &self,
        zone_type: ZoneType,
        children: &[Zone],
        is_last: bool,
    ) -> Result<Vec<Element>> {
        let mut words = self.breaker.break_chars(children)?;
        mark_word_end(&mut words, zone_type, is_last);
        Ok(words)
    }
}

/// A word zone that is not the last of its siblings is followed by a space.
fn mark_word_end(words: &mut [Element], zone_type: ZoneType, is_last: bool) {
    if zone_type == ZoneType::Word && !is_last {
        if let Some(last) = words.last_mut() {
            last.set_tail(" ");
        }
    }
}

fn splice(words: Vec<Element>) -> Emission {
    if words.is_empty() {
        Emission::Suppressed
    } else {
        Emission::Inline(words)
    }
}
