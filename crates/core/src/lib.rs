//! Core domain types and shared logic for the mural canvas.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Canvas dimensions and byte-offset arithmetic
//! - RGB color and its hex wire form
//! - Configuration for the history store, line cache, and canvas service

pub mod color;
pub mod config;
pub mod dimensions;
pub mod error;

pub use color::{Rgb, DEFAULT_COLOR};
pub use config::{CacheConfig, CanvasConfig, HistoryConfig, LockOptions};
pub use dimensions::{Dimensions, BYTES_PER_PIXEL};
pub use error::{Error, Result};
