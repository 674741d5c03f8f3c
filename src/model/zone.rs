//! Typed text zones.
//!
//! A zone is a node of the DjVu hidden text hierarchy. On the wire it is a
//! list `(type x0 y0 x1 y1 child...)` whose trailing elements are either
//! nested zones or exactly one string. Coordinates arrive with the origin in
//! the bottom-left corner of the page and are flipped to top-left once, when
//! the zone is built.

use super::BBox;
use crate::error::{Error, Result};
use crate::parser::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of leading elements in a zone list: the type and four coordinates.
const HEADER_LEN: usize = 5;

/// Zone granularity, ordered from the coarsest to the finest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    /// Whole page
    Page,
    /// Text column
    Column,
    /// Block of text
    Region,
    /// Paragraph
    Paragraph,
    /// Line of text
    Line,
    /// Single word
    Word,
    /// Single character
    Character,
}

impl ZoneType {
    /// Every zone type, coarsest first.
    pub const ALL: [ZoneType; 7] = [
        ZoneType::Page,
        ZoneType::Column,
        ZoneType::Region,
        ZoneType::Paragraph,
        ZoneType::Line,
        ZoneType::Word,
        ZoneType::Character,
    ];

    /// The symbol used for this type in the s-expression dump.
    pub fn symbol(&self) -> &'static str {
        match self {
            ZoneType::Page => "page",
            ZoneType::Column => "column",
            ZoneType::Region => "region",
            ZoneType::Paragraph => "para",
            ZoneType::Line => "line",
            ZoneType::Word => "word",
            ZoneType::Character => "char",
        }
    }
}

impl FromStr for ZoneType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ZoneType::ALL
            .iter()
            .copied()
            .find(|t| t.symbol() == s)
            .ok_or_else(|| Error::UnknownZoneType(s.to_string()))
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What a zone holds after its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneContent {
    /// Nested zones (at least one)
    Children(Vec<Zone>),
    /// The zone is a text leaf
    Text(String),
}

/// A validated text zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    zone_type: ZoneType,
    bbox: BBox,
    content: ZoneContent,
}

impl Zone {
    /// Create a zone directly. The bbox must already be top-left-origin.
    pub fn new(zone_type: ZoneType, bbox: BBox, content: ZoneContent) -> Result<Self> {
        match &content {
            ZoneContent::Children(children) if children.is_empty() => {
                return Err(Error::ZoneShape(format!(
                    "{} zone without children or text",
                    zone_type
                )));
            }
            ZoneContent::Children(_) if zone_type == ZoneType::Character => {
                return Err(Error::ZoneShape(
                    "char zone with nested zones".to_string(),
                ));
            }
            _ => {}
        }
        Ok(Self {
            zone_type,
            bbox,
            content,
        })
    }

    /// Build a zone tree from a parsed list, flipping coordinates against
    /// `page_height`.
    ///
    /// The whole tree is validated up front: unknown type symbols,
    /// non-integer coordinates, missing children and strings mixed with
    /// nested zones are rejected here rather than when the zone is visited.
    pub fn from_value(value: Value, page_height: i64) -> Result<Self> {
        let items = match value {
            Value::List(items) => items,
            other => {
                return Err(Error::ZoneShape(format!(
                    "expected a list, found {}",
                    other.kind()
                )))
            }
        };
        if items.len() <= HEADER_LEN {
            return Err(Error::ZoneShape(format!(
                "list of {} (< {}) elements",
                items.len(),
                HEADER_LEN + 1
            )));
        }

        let mut header = items;
        let mut rest = header.split_off(HEADER_LEN);

        let zone_type = match &header[0] {
            Value::Symbol(name) => name.parse::<ZoneType>()?,
            other => {
                return Err(Error::ZoneShape(format!(
                    "zone type must be a symbol, found {}",
                    other.kind()
                )))
            }
        };

        let mut coords = [0i64; 4];
        for (coord, value) in coords.iter_mut().zip(&header[1..]) {
            *coord = value.as_integer().ok_or_else(|| {
                Error::ZoneShape(format!(
                    "{} zone coordinate must be an integer, found {}",
                    zone_type,
                    value.kind()
                ))
            })?;
        }
        let [a, b, c, d] = coords;
        let bbox = BBox::from_bottom_left(a, b, c, d, page_height).ok_or_else(|| {
            Error::ZoneShape(format!(
                "{} zone box ({} {} {} {}) overflows on a page of height {}",
                zone_type, a, b, c, d, page_height
            ))
        })?;

        let content = match rest.as_mut_slice() {
            [Value::String(text)] => ZoneContent::Text(std::mem::take(text)),
            _ => {
                let mut children = Vec::with_capacity(rest.len());
                for child in rest {
                    match child {
                        Value::List(_) => children.push(Zone::from_value(child, page_height)?),
                        Value::String(_) => {
                            return Err(Error::ZoneShape(format!(
                                "{} zone mixes text with nested zones",
                                zone_type
                            )))
                        }
                        other => {
                            return Err(Error::ZoneShape(format!(
                                "{} zone child must be a list or string, found {}",
                                zone_type,
                                other.kind()
                            )))
                        }
                    }
                }
                ZoneContent::Children(children)
            }
        };

        Zone::new(zone_type, bbox, content)
    }

    /// Zone granularity.
    pub fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    /// Bounding box in top-left-origin coordinates.
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Zone content.
    pub fn content(&self) -> &ZoneContent {
        &self.content
    }

    /// Leaf text; fails for zones with nested children.
    pub fn text(&self) -> Result<&str> {
        match &self.content {
            ZoneContent::Text(text) => Ok(text),
            ZoneContent::Children(children) => Err(Error::ZoneShape(format!(
                "{} zone has {} nested zones instead of text",
                self.zone_type,
                children.len()
            ))),
        }
    }

    /// Nested zones; empty for a text leaf.
    pub fn children(&self) -> &[Zone] {
        match &self.content {
            ZoneContent::Children(children) => children,
            ZoneContent::Text(_) => &[],
        }
    }

    /// Number of trailing elements (nested zones, or 1 for the text).
    pub fn child_count(&self) -> usize {
        match &self.content {
            ZoneContent::Children(children) => children.len(),
            ZoneContent::Text(_) => 1,
        }
    }

    /// Check if this zone is a text leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self.content, ZoneContent::Text(_))
    }

    /// Concatenated text of every leaf below this zone.
    pub fn plain_text(&self) -> String {
        match &self.content {
            ZoneContent::Text(text) => text.clone(),
            ZoneContent::Children(children) => children
                .iter()
                .map(Zone::plain_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}
