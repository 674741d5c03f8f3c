//! Rendering module for converting zone trees to hOCR.

pub mod builder;
pub mod hocr;
mod json;
mod options;
mod result;
pub mod segment;
pub mod streaming;
pub mod xml;

pub use builder::{Emission, TreeBuilder, ZoneOutcome};
pub use json::{to_json, JsonFormat};
pub use options::{
    PageSelection, RenderOptions, WordSegmentation, DEFAULT_LANGUAGE, DEFAULT_TITLE,
    MAX_SELECTED_PAGES,
};
pub use result::{ConvertStats, RenderResult};
pub use segment::WordBreaker;
pub use streaming::{collect_content, OutputFormat, PageRenderer, RenderEvent};
pub use xml::to_xml;
