//! Integer world geometry shared by the server simulation and the client mirror

use serde::{Deserialize, Serialize};

/// One of the four directions a tank or bullet can face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step along this direction in screen coordinates (y grows downwards)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Axis-aligned rectangle with its origin in the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns true when the two rectangles share interior area.
    ///
    /// Rectangles that only touch along an edge do not intersect, and empty
    /// rectangles never intersect anything.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.width <= 0 || self.height <= 0 || other.width <= 0 || other.height <= 0 {
            return false;
        }

        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Returns true when `other` lies completely inside `self`
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Moves the rectangle so it sits fully inside `bounds`.
    ///
    /// A rectangle larger than `bounds` is pinned to the bounds' origin.
    pub fn clamped_within(&self, bounds: &Rect) -> Rect {
        let mut x = self.x;
        let mut y = self.y;

        if x + self.width > bounds.right() {
            x = bounds.right() - self.width;
        }
        if x < bounds.x {
            x = bounds.x;
        }
        if y + self.height > bounds.bottom() {
            y = bounds.bottom() - self.height;
        }
        if y < bounds.y {
            y = bounds.y;
        }

        Rect::new(x, y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_overlap() {
        let a = Rect::new(0, 0, 50, 50);
        let b = Rect::new(25, 25, 50, 50);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_exact_touch() {
        let a = Rect::new(0, 0, 50, 50);
        let b = Rect::new(50, 0, 50, 50);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_intersects_empty_rect() {
        let a = Rect::new(0, 0, 50, 50);
        let b = Rect::new(10, 10, 0, 10);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_contains() {
        let bounds = Rect::new(2, 25, 796, 571);
        assert!(bounds.contains(&Rect::new(2, 25, 50, 50)));
        assert!(!bounds.contains(&Rect::new(1, 25, 50, 50)));
        assert!(!bounds.contains(&Rect::new(790, 100, 20, 20)));
    }

    #[test]
    fn test_clamped_within() {
        let bounds = Rect::new(2, 25, 796, 571);

        let left = Rect::new(-10, 100, 50, 50).clamped_within(&bounds);
        assert_eq!(left.x, 2);

        let right = Rect::new(790, 100, 50, 50).clamped_within(&bounds);
        assert_eq!(right.right(), bounds.right());

        let bottom = Rect::new(100, 590, 50, 50).clamped_within(&bounds);
        assert_eq!(bottom.bottom(), bounds.bottom());

        let top = Rect::new(100, 0, 50, 50).clamped_within(&bounds);
        assert_eq!(top.y, 25);
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
    }
}
