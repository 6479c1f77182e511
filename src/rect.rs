use serde::{Deserialize, Serialize};

/// Half-open screen rectangle: `[left, right) x [top, bottom)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    /// Returns `None` for empty rectangles.
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Option<Self> {
        let rect = Self { left, top, right, bottom };
        (!rect.is_empty()).then_some(rect)
    }

    pub fn from_size(x: u32, y: u32, width: u32, height: u32) -> Option<Self> {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    /// Clip signed bounds to `[0, width] x [0, height]`. Bounds are `i64` so
    /// callers can offset `i32` coordinates without overflowing.
    pub fn clipped(left: i64, top: i64, right: i64, bottom: i64, width: u32, height: u32) -> Option<Self> {
        let clamp = |v: i64, max: u32| v.clamp(0, i64::from(max)) as u32;
        Self::new(
            clamp(left, width),
            clamp(top, height),
            clamp(right, width),
            clamp(bottom, height),
        )
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersect(other).is_some()
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// Bounding box of both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Shift by a signed delta, clipping the result to `width x height`.
    pub fn translated(&self, dx: i32, dy: i32, width: u32, height: u32) -> Option<Rect> {
        let (dx, dy) = (i64::from(dx), i64::from(dy));
        Rect::clipped(
            i64::from(self.left) + dx,
            i64::from(self.top) + dy,
            i64::from(self.right) + dx,
            i64::from(self.bottom) + dy,
            width,
            height,
        )
    }
}
