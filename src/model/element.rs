//! Output element tree.

use super::BBox;
use crate::text::is_forbidden_control;
use serde::Serialize;

/// Class of the placeholder span standing in for a control character.
pub const CONTROL_CHAR_CLASS: &str = "djvu_char";

/// A node of the generated hOCR tree.
///
/// Mirrors the XML infoset the serializer needs: leading `text`, ordered
/// `children`, and a `tail` that follows the closing tag inside the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    /// Tag name (`div`, `p`, `span`)
    pub tag: &'static str,

    /// Value of the `class` attribute
    pub class: &'static str,

    /// Value of the `title` attribute
    pub title: String,

    /// Text before the first child
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child elements in document order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,

    /// Text after the closing tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
}

impl Element {
    /// Create an element without text or children.
    pub fn new(tag: &'static str, class: &'static str, title: impl Into<String>) -> Self {
        Self {
            tag,
            class,
            title: title.into(),
            text: None,
            children: Vec::new(),
            tail: None,
        }
    }

    /// Create an element whose title carries only its bounding box.
    pub fn with_bbox(tag: &'static str, class: &'static str, bbox: &BBox) -> Self {
        Self::new(tag, class, bbox_title(bbox))
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Most recently appended child.
    pub fn last_child_mut(&mut self) -> Option<&mut Element> {
        self.children.last_mut()
    }

    /// Set the text that follows this element's closing tag.
    pub fn set_tail(&mut self, tail: &str) {
        self.tail = Some(tail.to_string());
    }

    /// Set the element text.
    ///
    /// Control characters that XML cannot carry are replaced by placeholder
    /// spans holding a single space, each titled with the hex code point.
    /// Text between placeholders becomes the preceding placeholder's tail.
    pub fn set_text(&mut self, text: &str) {
        let mut run = String::new();
        let mut placeholders: Vec<Element> = Vec::new();
        for c in text.chars() {
            if is_forbidden_control(c) {
                flush_run(&mut self.text, &mut placeholders, &mut run);
                let mut placeholder =
                    Element::new("span", CONTROL_CHAR_CLASS, format!("#x{:02x}", c as u32));
                placeholder.text = Some(" ".to_string());
                placeholders.push(placeholder);
            } else {
                run.push(c);
            }
        }
        flush_run(&mut self.text, &mut placeholders, &mut run);
        self.children.extend(placeholders);
    }

    /// All text in document order, including children and their tails.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(ref text) = self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(ref tail) = child.tail {
                out.push_str(tail);
            }
        }
    }

    /// Iterate over this element and all descendants, depth first.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }

    /// Count descendants (including self) with the given class.
    pub fn count_class(&self, class: &str) -> usize {
        self.descendants()
            .iter()
            .filter(|e| e.class == class)
            .count()
    }
}

fn flush_run(text: &mut Option<String>, placeholders: &mut [Element], run: &mut String) {
    if run.is_empty() {
        return;
    }
    let run = std::mem::take(run);
    match placeholders.last_mut() {
        Some(last) => last.tail = Some(run),
        None => *text = Some(run),
    }
}

/// Title for an element carrying a single bounding box.
pub fn bbox_title(bbox: &BBox) -> String {
    format!("bbox {}", bbox)
}

/// Title for a synthesized token: its box plus every box it was built from.
pub fn bboxes_title(bbox: &BBox, parts: &[BBox]) -> String {
    let parts = parts
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("bbox {}; bboxes {}", bbox, parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_plain_text() {
        let mut e = Element::new("span", "ocrx_word", "bbox 0 0 1 1");
        e.set_text("Hello");
        assert_eq!(e.text.as_deref(), Some("Hello"));
        assert!(e.children.is_empty());
    }

    #[test]
    fn test_set_text_with_control_characters() {
        let mut e = Element::new("span", "ocr_line", "bbox 0 0 1 1");
        e.set_text("ab\u{1}cd\u{1f}");
        assert_eq!(e.text.as_deref(), Some("ab"));
        assert_eq!(e.children.len(), 2);

        let first = &e.children[0];
        assert_eq!(first.class, CONTROL_CHAR_CLASS);
        assert_eq!(first.title, "#x01");
        assert_eq!(first.text.as_deref(), Some(" "));
        assert_eq!(first.tail.as_deref(), Some("cd"));

        let second = &e.children[1];
        assert_eq!(second.title, "#x1f");
        assert_eq!(second.tail, None);

        assert_eq!(e.text_content(), "ab cd ");
    }

    #[test]
    fn test_set_text_leading_control() {
        let mut e = Element::new("span", "ocrx_word", "");
        e.set_text("\u{0b}x");
        assert_eq!(e.text, None);
        assert_eq!(e.children[0].tail.as_deref(), Some("x"));
    }

    #[test]
    fn test_titles() {
        let bbox = BBox::new(0, 0, 10, 5);
        assert_eq!(bbox_title(&bbox), "bbox 0 0 10 5");
        let parts = [BBox::new(0, 0, 4, 5), BBox::new(4, 0, 10, 5)];
        assert_eq!(
            bboxes_title(&bbox, &parts),
            "bbox 0 0 10 5; bboxes 0 0 4 5, 4 0 10 5"
        );
    }

    #[test]
    fn test_count_class() {
        let mut line = Element::new("span", "ocr_line", "");
        line.push(Element::new("span", "ocrx_word", ""));
        line.push(Element::new("span", "ocrx_word", ""));
        assert_eq!(line.count_class("ocrx_word"), 2);
        assert_eq!(line.count_class("ocr_line"), 1);
    }
}
