use super::Vec2;

/// Axis-aligned rectangle in logical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Builds a rectangle from its edges, normalizing inverted edges.
    #[inline]
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Rect::new(left, top, right - left, bottom - top).normalized()
    }

    /// True when nothing fits inside.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Flips negative extents so both sides are non-negative.
    pub fn normalized(self) -> Self {
        let (x, w) = flip_negative(self.origin.x, self.size.x);
        let (y, h) = flip_negative(self.origin.y, self.size.y);
        Rect::new(x, y, w, h)
    }
}

#[inline]
fn flip_negative(start: f32, extent: f32) -> (f32, f32) {
    if extent < 0.0 { (start + extent, -extent) } else { (start, extent) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    #[test]
    fn from_ltrb_matches_edges() {
        let rect = Rect::from_ltrb(100.0, 100.0, 550.0, 380.0);
        assert_eq!(rect, r(100.0, 100.0, 450.0, 280.0));
        assert_eq!(rect.origin, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn from_ltrb_inverted_is_normalized() {
        // A window narrower than the left margin yields right < left.
        let rect = Rect::from_ltrb(10.0, 10.0, 4.0, 500.0);
        assert_eq!(rect, r(4.0, 10.0, 6.0, 490.0));
    }

    #[test]
    fn normalized_positive_is_identity() {
        let rect = r(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.normalized(), rect);
    }

    #[test]
    fn is_empty_zero_size() {
        assert!(r(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(r(0.0, 0.0, 5.0, 0.0).is_empty());
        assert!(!r(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
