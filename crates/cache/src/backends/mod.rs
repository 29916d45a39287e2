//! Line cache backends.

pub mod redis;
