//! Input parsing: the s-expression reader and the per-page dump stream.

mod options;
mod page_stream;
pub mod sexpr;

pub use options::{ErrorMode, ParseOptions};
pub use page_stream::{PageDump, PageSize, PageSource, PageStream};
pub use sexpr::{parse_str, Reader, Value};
