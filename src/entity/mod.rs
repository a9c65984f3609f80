mod note;
pub mod palette;

pub use note::{
    Note, NoteKind, DEFAULT_CONTENT, DEFAULT_HEIGHT, DEFAULT_LANGUAGE, DEFAULT_WIDTH,
    MIN_HEIGHT, MIN_WIDTH,
};
pub use palette::{ColorPicker, DEFAULT_COLOR, PRESET_COLORS};

use serde::{Deserialize, Serialize};

/// A point in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both axes to be non-negative
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.max(0.0),
            y: self.y.max(0.0),
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Pixel dimensions of a note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp to the minimum note size
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(MIN_WIDTH),
            height: self.height.max(MIN_HEIGHT),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}
