//! Data model for text-layer conversion.
//!
//! Zones are the validated input hierarchy read from the page dump;
//! elements are the output tree handed to the serializers. Both carry
//! [`BBox`]es in top-left-origin page coordinates.

mod bbox;
mod element;
mod zone;

pub use bbox::BBox;
pub use element::{bbox_title, bboxes_title, Element, CONTROL_CHAR_CLASS};
pub use zone::{Zone, ZoneContent, ZoneType};
