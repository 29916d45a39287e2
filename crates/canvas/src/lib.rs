//! Cache synchronization and pixel-write core for the mural canvas.
//!
//! Many stateless server processes share one durable history store and one
//! row-oriented line cache. This crate keeps the two consistent:
//! - [`LockCoordinator`]: cross-process mutual exclusion over the shared
//!   `cache_state` record, with deadlock detection and reclaim
//! - [`Canvas::sync`]: full cache rebuild from the durable projection
//! - [`Canvas::set_pixel`] / [`Canvas::get_pixels`]: the write and read paths

pub mod canvas;
pub mod error;
pub mod lock;

pub use canvas::Canvas;
pub use error::{CanvasError, CanvasResult};
pub use lock::{LockCoordinator, LockOutcome};
