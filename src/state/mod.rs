//! Trainer state machine module
//!
//! Holds the current level, the seconds elapsed within the current image
//! and the generated run level. A one-second tick drives it:
//! - show each image of the run level for its drawn duration
//! - show a countdown near the end of each image
//! - move to the next level when the run level is exhausted

mod machine;
mod run_level;

pub use machine::{Command, Trainer};
