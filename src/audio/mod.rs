//! Audio gateway for cue and background playback
//!
//! The state machine only sees the [`AudioGateway`] trait. Sounds are
//! resolved from a [`SoundRegistry`] that is preloaded at startup.
//! Playback is fire-and-forget: failures are logged inside the playback
//! task and never reach the caller unless it awaits the [`PendingVoice`].

mod gateway;
mod headless;
mod registry;
#[cfg(feature = "playback")]
mod rodio_backend;

pub use gateway::{AudioGateway, PendingVoice, PlayOptions, Sound, Voice};
pub use headless::HeadlessGateway;
pub use registry::SoundRegistry;
#[cfg(feature = "playback")]
pub use rodio_backend::RodioGateway;
