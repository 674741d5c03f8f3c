//! hOCR vocabulary and document framing.

use super::xml::escape;
use super::RenderOptions;
use crate::model::ZoneType;

/// Tag of word elements, including synthesized ones.
pub const WORD_TAG: &str = "span";

/// Class of word elements, including synthesized ones.
pub const WORD_CLASS: &str = "ocrx_word";

/// Output tag and class for each zone type that has an hOCR counterpart.
///
/// Characters have none: character-level zones are folded into synthesized
/// words by the tree builder.
pub fn zone_to_hocr(zone_type: ZoneType) -> Option<(&'static str, &'static str)> {
    match zone_type {
        ZoneType::Page => Some(("div", "ocr_page")),
        ZoneType::Column => Some(("div", "ocr_carea")),
        ZoneType::Region => Some(("div", "ocrx_block")),
        ZoneType::Paragraph => Some(("p", "ocr_par")),
        ZoneType::Line => Some(("span", "ocr_line")),
        ZoneType::Word => Some((WORD_TAG, WORD_CLASS)),
        ZoneType::Character => None,
    }
}

/// Classes advertised in the `ocr-capabilities` meta tag, sorted.
pub fn capabilities() -> Vec<&'static str> {
    let mut classes: Vec<&'static str> = ZoneType::ALL
        .iter()
        .filter_map(|t| zone_to_hocr(*t))
        .map(|(_, class)| class)
        .collect();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Closing part of the document.
pub const FOOTER: &str = "\n</body>\n</html>\n";

/// Opening part of the document, up to and including `<body>`.
pub fn header(options: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \
         \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">\n",
    );
    out.push_str("<html xmlns=\"http://www.w3.org/1999/xhtml\">\n");
    out.push_str("<head>\n");
    out.push_str(
        "  <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\" />\n",
    );
    out.push_str(&format!(
        "  <meta name=\"ocr-system\" content=\"{}\" />\n",
        escape(&options.ocr_system)
    ));
    out.push_str(&format!(
        "  <meta name=\"ocr-capabilities\" content=\"{}\" />\n",
        capabilities().join(" ")
    ));
    if !options.css.is_empty() {
        out.push_str(&format!(
            "  <style type=\"text/css\">{}</style>\n",
            escape(&options.css)
        ));
    }
    out.push_str(&format!("  <title>{}</title>\n", escape(&options.title)));
    out.push_str("</head>\n");
    out.push_str("<body>\n");
    out
}
