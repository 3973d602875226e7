//! Run-level generation
//!
//! A run level is the randomized plan for one pass through a level:
//! which images are shown, in which order, and for how long.

use rand::Rng;
use serde::Serialize;

use crate::catalog::{Image, Level};

/// One scheduled image and how many seconds it stays up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelImage {
    pub image: Image,
    pub duration: u32,
}

/// The generated plan for the current level
#[derive(Debug, Clone)]
pub struct RunLevel {
    level_images: Vec<LevelImage>,
    current_image_index: usize,
}

impl RunLevel {
    /// Generate a plan with `level.image_count` entries
    ///
    /// Images come from `picker`, so consecutive entries never repeat, even
    /// across the boundary with the previously generated run level.
    /// `images` must hold at least two entries.
    pub fn generate<R: Rng>(
        level: &Level,
        images: &[Image],
        picker: &mut NoRepeatPicker,
        rng: &mut R,
    ) -> Self {
        let level_images = (0..level.image_count)
            .map(|_| LevelImage {
                image: picker.pick(images, &mut *rng),
                duration: rng.random_range(level.min_time..=level.max_time),
            })
            .collect();

        Self {
            level_images,
            current_image_index: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_entries(level_images: Vec<LevelImage>) -> Self {
        Self {
            level_images,
            current_image_index: 0,
        }
    }

    pub fn level_images(&self) -> &[LevelImage] {
        &self.level_images
    }

    pub fn len(&self) -> usize {
        self.level_images.len()
    }

    pub fn current_image_index(&self) -> usize {
        self.current_image_index
    }

    /// The entry being shown, or `None` once the plan is exhausted
    pub fn current(&self) -> Option<&LevelImage> {
        self.level_images.get(self.current_image_index)
    }

    /// Move to the next entry; returns true when the plan is exhausted
    pub fn advance(&mut self) -> bool {
        self.current_image_index += 1;
        self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_image_index >= self.level_images.len()
    }
}

/// Uniform random picker that never returns the same image twice in a row
///
/// The memory of the last pick outlives individual run levels.
#[derive(Debug, Clone, Default)]
pub struct NoRepeatPicker {
    last: Option<Image>,
}

impl NoRepeatPicker {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Image> {
        self.last.as_ref()
    }

    /// Pick a random image different from the previous pick
    ///
    /// Loops forever if `images` has fewer than two entries.
    pub fn pick<R: Rng>(&mut self, images: &[Image], rng: &mut R) -> Image {
        debug_assert!(images.len() >= 2, "no-repeat pick needs two images");

        let item = loop {
            let candidate = images[rng.random_range(0..images.len())];
            if self.last != Some(candidate) {
                break candidate;
            }
        };

        self.last = Some(item);
        item
    }
}
