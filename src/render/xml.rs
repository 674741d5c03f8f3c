//! XML serialization of element trees.

use crate::model::Element;

/// Escape text for use in HTML content or attributes, quotes included.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
}

/// Serialize an element tree as an XML fragment.
///
/// The root's own tail is not part of the fragment.
pub fn to_xml(root: &Element) -> String {
    let mut out = String::new();
    write_element(root, &mut out);
    out
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(element.tag);
    out.push_str(" class=\"");
    escape_attr(element.class, out);
    out.push_str("\" title=\"");
    escape_attr(&element.title, out);
    out.push('"');

    if element.text.is_none() && element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(ref text) = element.text {
        escape_text(text, out);
    }
    for child in &element.children {
        write_element(child, out);
        if let Some(ref tail) = child.tail {
            escape_text(tail, out);
        }
    }
    out.push_str("</");
    out.push_str(element.tag);
    out.push('>');
}
