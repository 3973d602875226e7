//! Gateway that resolves assets but produces no sound
//!
//! Used when the daemon is built without the `playback` feature, or when
//! no output device should be opened. Every play is traced instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::gateway::{AudioGateway, PendingVoice, PlayOptions, Sound, Voice};
use super::registry::SoundRegistry;

/// A traced, silent playback instance
#[derive(Debug, Default)]
pub struct HeadlessVoice {
    sound: Option<Sound>,
    stopped: AtomicBool,
}

impl HeadlessVoice {
    #[cfg(test)]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Voice for HeadlessVoice {
    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            debug!(sound = ?self.sound, "voice stopped");
        }
    }
}

pub struct HeadlessGateway {
    registry: Arc<SoundRegistry>,
}

impl HeadlessGateway {
    pub fn new(registry: Arc<SoundRegistry>) -> Self {
        Self { registry }
    }
}

impl AudioGateway for HeadlessGateway {
    type Voice = HeadlessVoice;

    fn play(&self, sound: Sound, options: PlayOptions) -> PendingVoice<HeadlessVoice> {
        let registry = Arc::clone(&self.registry);

        PendingVoice::spawn(sound, async move {
            let clip = registry.resolve(sound).await?;
            debug!(
                sound = %clip.sound,
                looped = options.looped,
                detune = ?options.detune,
                bytes = clip.bytes.len(),
                "playing sound (headless)"
            );
            Ok(HeadlessVoice {
                sound: Some(clip.sound),
                stopped: AtomicBool::new(false),
            })
        })
    }
}
