//! Integer rectangles in output (stage) coordinates.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle with an integer origin and unsigned size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// A rectangle anchored at the origin, e.g. the visible area of an output.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    // i64 so that large origins plus large sizes cannot overflow.
    fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// True when the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (self.x as i64) < other.right()
            && (other.x as i64) < self.right()
            && (self.y as i64) < other.bottom()
            && (other.y as i64) < self.bottom()
    }

    /// True when `other` lies entirely inside `self`.
    ///
    /// An empty `other` is never considered covered; an empty output has
    /// nothing that could be occluded.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x as i64 <= other.x as i64
            && self.y as i64 <= other.y as i64
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}
