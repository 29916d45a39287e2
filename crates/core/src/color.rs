//! Pixel color type and its hex wire form.
//!
//! Colors travel as 6-character lowercase hex strings in the durable store
//! and as raw 3-byte triplets in cache lines and board buffers.

use std::fmt;

/// A 24-bit RGB color.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb([u8; 3]);

/// Color used for canvas cells that have never been painted.
pub const DEFAULT_COLOR: Rgb = Rgb([0xff, 0xff, 0xff]);

impl Rgb {
    /// Create a color from raw bytes.
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    /// Parse from a 6-character hex string (case-insensitive).
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        if s.len() != 6 || !s.is_ascii() {
            return Err(crate::Error::InvalidColor(format!(
                "expected 6 hex chars, got {:?}",
                s
            )));
        }
        let mut bytes = [0u8; 3];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hex_str = std::str::from_utf8(chunk)
                .map_err(|e| crate::Error::InvalidColor(e.to_string()))?;
            bytes[i] = u8::from_str_radix(hex_str, 16)
                .map_err(|e| crate::Error::InvalidColor(e.to_string()))?;
        }
        Ok(Self(bytes))
    }

    /// Encode as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgb({})", self.to_hex())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}
