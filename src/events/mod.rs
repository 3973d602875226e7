//! Events module for trainer transitions
//!
//! Provides structured event types published by the state machine on every
//! tick, image change, level change and reset.

use serde::Serialize;

use crate::catalog::Image;

/// What a renderer needs to draw the current moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    /// Current level index
    pub level: usize,
    /// Seconds elapsed within the current image
    pub sequence: u32,
    /// Position of the current image within the run level
    pub image_index: usize,
    /// Number of images in the run level
    pub image_count: usize,
    /// The image on screen
    pub image: Image,
    /// How long the current image stays up, in seconds
    pub duration: u32,
    /// Seconds left before the next image
    pub countdown: u32,
    /// Whether the countdown should be shown
    pub show_countdown: bool,
}

/// Events emitted by the state machine
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrainerEvent {
    /// A tick was processed; carries the display state it rendered
    Tick(DisplayState),

    /// The next image of the run level is up
    ImageAdvanced {
        level: usize,
        image_index: usize,
    },

    /// A fresh run level was generated
    LevelStarted {
        level: usize,
        image_count: usize,
        /// Sum of all image durations, in seconds
        total_secs: u32,
    },

    /// The trainer was reset to the first level
    Reset(DisplayState),
}

impl TrainerEvent {
    /// Display state carried by the event, if any
    pub fn display(&self) -> Option<&DisplayState> {
        match self {
            TrainerEvent::Tick(display) | TrainerEvent::Reset(display) => Some(display),
            TrainerEvent::ImageAdvanced { .. } | TrainerEvent::LevelStarted { .. } => None,
        }
    }
}

impl std::fmt::Display for TrainerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainerEvent::Tick(d) => {
                write!(f, "TICK (level {}, {}s left)", d.level, d.countdown)
            }
            TrainerEvent::ImageAdvanced { level, image_index } => {
                write!(f, "IMAGE_ADVANCED ({}/{})", level, image_index)
            }
            TrainerEvent::LevelStarted {
                level, image_count, ..
            } => {
                write!(f, "LEVEL_STARTED ({} with {} images)", level, image_count)
            }
            TrainerEvent::Reset(_) => write!(f, "RESET"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IMAGES;

    fn display() -> DisplayState {
        DisplayState {
            level: 1,
            sequence: 4,
            image_index: 2,
            image_count: 5,
            image: IMAGES[0],
            duration: 12,
            countdown: 8,
            show_countdown: false,
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = TrainerEvent::LevelStarted {
            level: 2,
            image_count: 8,
            total_secs: 90,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"level_started\""));
        assert!(json.contains("90"));
    }

    #[test]
    fn test_tick_serialization_flattens_display() {
        let json = serde_json::to_value(TrainerEvent::Tick(display())).unwrap();
        assert_eq!(json["type"], "tick");
        assert_eq!(json["countdown"], 8);
        assert_eq!(json["image"]["url"], "/assets/pattern-1.jpg");
    }

    #[test]
    fn test_display_accessor() {
        assert!(TrainerEvent::Reset(display()).display().is_some());
        let event = TrainerEvent::ImageAdvanced {
            level: 0,
            image_index: 1,
        };
        assert!(event.display().is_none());
        assert_eq!(event.to_string(), "IMAGE_ADVANCED (0/1)");
    }
}
