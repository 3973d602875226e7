//! Built-in image catalog and level table
//!
//! Both are fixed at compile time and never change while the daemon runs.

mod images;
mod levels;

pub use images::{Image, IMAGES};
pub use levels::{Level, LEVELS};
