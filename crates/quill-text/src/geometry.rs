/// An axis-aligned rectangle in layout space (pixels, y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f32,
    /// Vertical position of the top-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Move the rectangle horizontally so its right edge sits at `right`.
    pub fn set_right(&mut self, right: f32) {
        self.x = right - self.width;
    }

    /// True if the point lies inside the rectangle (right and bottom edges
    /// excluded).
    #[must_use]
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// True if the vertical extents of the two rectangles intersect.
    ///
    /// A rectangle whose top sits inside the other's extent overlaps, so a
    /// zero-height rectangle starting inside a float still collides with it.
    #[must_use]
    pub fn vertical_overlap(&self, other: &Self) -> bool {
        (other.y <= self.y && self.y < other.bottom())
            || (self.y <= other.y && other.y < self.bottom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges() {
        let rect = Rect::new(10.0, 5.0, 20.0, 8.0);
        assert!((rect.right() - 30.0).abs() < f32::EPSILON);
        assert!((rect.bottom() - 13.0).abs() < f32::EPSILON);
    }

    #[test]
    fn set_right_keeps_width() {
        let mut rect = Rect::new(0.0, 0.0, 20.0, 8.0);
        rect.set_right(100.0);
        assert!((rect.x - 80.0).abs() < f32::EPSILON);
        assert!((rect.width - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn vertical_overlap_is_symmetric_and_half_open() {
        let float = Rect::new(0.0, 0.0, 50.0, 40.0);
        let inside = Rect::new(60.0, 20.0, 10.0, 10.0);
        let touching = Rect::new(60.0, 40.0, 10.0, 10.0);
        assert!(float.vertical_overlap(&inside));
        assert!(inside.vertical_overlap(&float));
        assert!(!float.vertical_overlap(&touching));
        assert!(!touching.vertical_overlap(&float));
    }

    #[test]
    fn contains_excludes_far_edges() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(0.0, 0.0));
        assert!(rect.contains(9.5, 9.5));
        assert!(!rect.contains(10.0, 5.0));
    }
}
