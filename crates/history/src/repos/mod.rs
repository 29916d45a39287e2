//! Repository traits for history store operations.

pub mod cache_state;
pub mod pixels;

pub use cache_state::CacheStateRepo;
pub use pixels::PixelRepo;
