//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned rectangle in top-left-origin page coordinates.
///
/// The empty box is the identity of [`BBox::update`]: its corners are
/// inverted to the extremes of `i64`, so taking mins and maxes against any
/// other box yields exactly that box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: i64,
    /// Top edge
    pub y0: i64,
    /// Right edge
    pub x1: i64,
    /// Bottom edge
    pub y1: i64,
}

impl BBox {
    /// The empty box.
    pub const EMPTY: BBox = BBox {
        x0: i64::MAX,
        y0: i64::MAX,
        x1: i64::MIN,
        y1: i64::MIN,
    };

    /// Create a box from its corners.
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create the empty box.
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// Convert a box given in bottom-left-origin coordinates `(a, b, c, d)`
    /// on a page of height `page_height` to top-left origin.
    ///
    /// Returns `None` when a flipped coordinate does not fit in `i64`.
    pub fn from_bottom_left(a: i64, b: i64, c: i64, d: i64, page_height: i64) -> Option<Self> {
        let y0 = page_height.checked_sub(d)?;
        let y1 = page_height.checked_sub(b)?;
        Some(Self::new(a, y0, c, y1))
    }

    /// Check whether nothing has been accumulated into this box.
    pub fn is_empty(&self) -> bool {
        self.x0 > self.x1 || self.y0 > self.y1
    }

    /// Grow this box to the smallest rectangle containing both boxes.
    pub fn update(&mut self, other: &BBox) {
        self.x0 = self.x0.min(other.x0);
        self.y0 = self.y0.min(other.y0);
        self.x1 = self.x1.max(other.x1);
        self.y1 = self.y1.max(other.y1);
    }

    /// Return the smallest rectangle containing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        let mut result = *self;
        result.update(other);
        result
    }

    /// Union of every box yielded by the iterator (empty if there are none).
    pub fn union_all<'a, I>(boxes: I) -> BBox
    where
        I: IntoIterator<Item = &'a BBox>,
    {
        boxes.into_iter().fold(BBox::EMPTY, |acc, b| acc.union(b))
    }

    /// Width of the box (0 when empty).
    pub fn width(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.x1.saturating_sub(self.x0)
        }
    }

    /// Height of the box (0 when empty).
    pub fn height(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.y1.saturating_sub(self.y0)
        }
    }

    /// Horizontal slice covering the code-point span `[start, end)` of a
    /// text run of `len` code points laid out uniformly across this box.
    ///
    /// Edges are rounded to the nearest integer; the vertical range is kept.
    pub fn horizontal_slice(&self, start: usize, end: usize, len: usize) -> BBox {
        if len == 0 {
            return *self;
        }
        // Exact in i128; every edge lies between x0 and x1, so it fits back.
        let x0 = i128::from(self.x0);
        let width = i128::from(self.x1) - x0;
        let len = len as i128;
        let edge = |offset: usize| -> i64 {
            let scaled = width * offset as i128 * 2 + len;
            (x0 + scaled.div_euclid(2 * len)) as i64
        };
        BBox::new(edge(start), self.y0, edge(end), self.y1)
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x0, self.y0, self.x1, self.y1)
    }
}
