//! Level table
//!
//! Each level shows more images for shorter times. The last level
//! repeats forever once reached.

use serde::Serialize;

/// Timing parameters for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    /// Shortest time an image stays up, in seconds
    pub min_time: u32,
    /// Longest time an image stays up, in seconds (inclusive)
    pub max_time: u32,
    /// Countdown is shown once this many seconds or fewer remain
    pub count_down_from: u32,
    /// Number of images in one run through the level
    pub image_count: usize,
}

impl Level {
    const fn new(min_time: u32, max_time: u32, count_down_from: u32, image_count: usize) -> Self {
        Self {
            min_time,
            max_time,
            count_down_from,
            image_count,
        }
    }
}

pub static LEVELS: [Level; 7] = [
    Level::new(15, 30, 10, 3),
    Level::new(10, 20, 5, 5),
    Level::new(8, 15, 5, 8),
    Level::new(5, 10, 3, 10),
    Level::new(4, 8, 3, 15),
    Level::new(3, 5, 2, 15),
    Level::new(1, 4, 0, 30),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_well_formed() {
        for level in LEVELS.iter() {
            assert!(level.min_time >= 1);
            assert!(level.min_time <= level.max_time);
            assert!(level.image_count > 0);
        }
    }

    #[test]
    fn test_first_level_values() {
        assert_eq!(LEVELS[0], Level::new(15, 30, 10, 3));
        assert_eq!(LEVELS[6].count_down_from, 0);
    }
}
