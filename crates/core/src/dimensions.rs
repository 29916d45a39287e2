//! Canvas dimensions and byte-offset arithmetic.

use serde::{Deserialize, Serialize};

/// Bytes per pixel (one RGB triplet).
pub const BYTES_PER_PIXEL: usize = 3;

/// Fixed size of the canvas grid.
///
/// All byte-offset arithmetic for cache lines and the assembled board lives
/// here so the store, cache, and canvas crates agree on the layout: pixel
/// `(x, y)` occupies bytes `[y*width*3 + x*3, y*width*3 + x*3 + 3)` of the
/// concatenated board and `[x*3, x*3 + 3)` within line `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(crate::Error::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Whether `(x, y)` lies inside the canvas.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Length in bytes of one serialized canvas line.
    pub fn line_len(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Length in bytes of the full serialized board.
    pub fn board_len(&self) -> usize {
        self.line_len() * self.height as usize
    }

    /// Byte offset of column `x` within its line.
    pub fn column_offset(&self, x: u32) -> usize {
        x as usize * BYTES_PER_PIXEL
    }

    /// Byte offset of pixel `(x, y)` within the full board.
    pub fn board_offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.line_len() + self.column_offset(x)
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> u32 {
    160
}

fn default_height() -> u32 {
    90
}
