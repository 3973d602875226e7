//! Core trainer state machine
//!
//! Advances through the run level one tick at a time, plays cues through
//! the audio gateway and escalates to the next level when a run level is
//! exhausted.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::audio::{AudioGateway, PendingVoice, PlayOptions, Sound, Voice};
use crate::catalog::{Image, Level, IMAGES, LEVELS};
use crate::events::{DisplayState, TrainerEvent};
use crate::scheduler::TickSource;

use super::run_level::{LevelImage, NoRepeatPicker, RunLevel};

/// Detune applied to the background loop per level, in cents
const BACKGROUND_DETUNE_PER_LEVEL: f32 = 100.0;
/// Detune applied to the countdown cue per remaining second, in cents
const COUNTDOWN_DETUNE_PER_SECOND: f32 = 50.0;

/// Commands accepted by a running trainer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Restart from the first level
    Reset,
}

/// Errors for catalogs the trainer cannot run with
#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    #[error("image catalog needs at least 2 images to avoid repeats, got {0}")]
    CatalogTooSmall(usize),

    #[error("level table is empty")]
    NoLevels,

    #[error("level {0} has an invalid time range or no images")]
    InvalidLevel(usize),
}

/// The trainer state machine
pub struct Trainer<A: AudioGateway> {
    images: &'static [Image],
    levels: &'static [Level],
    /// Current level index, never past the last level
    level: usize,
    /// Seconds elapsed within the current image
    sequence: u32,
    run_level: RunLevel,
    display: DisplayState,
    picker: NoRepeatPicker,
    rng: StdRng,
    audio: Arc<A>,
    /// Background loop that was last started, possibly still resolving
    background: Option<PendingVoice<A::Voice>>,
    event_tx: broadcast::Sender<TrainerEvent>,
}

impl<A: AudioGateway> Trainer<A> {
    /// Create a trainer over the built-in catalog and level table
    pub fn new(audio: Arc<A>, event_tx: broadcast::Sender<TrainerEvent>) -> Result<Self, TrainerError> {
        Self::with_catalog(&IMAGES, &LEVELS, audio, event_tx, StdRng::from_os_rng())
    }

    pub fn with_catalog(
        images: &'static [Image],
        levels: &'static [Level],
        audio: Arc<A>,
        event_tx: broadcast::Sender<TrainerEvent>,
        mut rng: StdRng,
    ) -> Result<Self, TrainerError> {
        if images.len() < 2 {
            return Err(TrainerError::CatalogTooSmall(images.len()));
        }
        let first = levels.first().ok_or(TrainerError::NoLevels)?;
        if let Some(index) = levels
            .iter()
            .position(|l| l.min_time == 0 || l.min_time > l.max_time || l.image_count == 0)
        {
            return Err(TrainerError::InvalidLevel(index));
        }

        let mut picker = NoRepeatPicker::new();
        let run_level = RunLevel::generate(first, images, &mut picker, &mut rng);
        let display = compute_display(first, 0, 0, &run_level, &run_level.level_images()[0]);

        Ok(Self {
            images,
            levels,
            level: 0,
            sequence: 0,
            run_level,
            display,
            picker,
            rng,
            audio,
            background: None,
            event_tx,
        })
    }

    #[cfg(test)]
    pub fn level(&self) -> usize {
        self.level
    }

    #[cfg(test)]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    #[cfg(test)]
    pub fn run_level(&self) -> &RunLevel {
        &self.run_level
    }

    /// Derived display state as of the last update
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Run the trainer until the command channel closes
    pub async fn run<T: TickSource>(&mut self, mut ticks: T, mut command_rx: mpsc::Receiver<Command>) {
        info!(level = self.level, "trainer started");
        self.start();

        loop {
            tokio::select! {
                _ = ticks.next_tick() => {
                    self.tick().await;
                }
                command = command_rx.recv() => match command {
                    Some(Command::Reset) => self.reset(),
                    None => break,
                },
            }
        }

        info!("trainer stopped");
    }

    /// Start the untuned background loop if none is playing yet
    pub fn start(&mut self) {
        if self.background.is_none() {
            self.background = Some(self.audio.play(Sound::Background, PlayOptions::looped()));
        }
    }

    /// Advance one second
    pub async fn tick(&mut self) {
        let Some(current) = self.run_level.current().copied() else {
            warn!(level = self.level, "run level exhausted before tick, regenerating");
            self.start_level();
            return;
        };
        self.update(&current);

        if self.sequence == 0 {
            self.cue(Sound::Long, PlayOptions::default());

            if self.run_level.current_image_index() == 0 {
                self.replace_background().await;
            }
        }

        if self.display.show_countdown {
            let detune = self.display.countdown as f32 * COUNTDOWN_DETUNE_PER_SECOND;
            self.cue(Sound::Short, PlayOptions::default().with_detune(detune));
        }

        let _ = self.event_tx.send(TrainerEvent::Tick(self.display));

        self.sequence += 1;

        if self.sequence == current.duration {
            self.sequence = 0;

            if self.run_level.advance() {
                let next = (self.level + 1).min(self.levels.len() - 1);
                info!(from = self.level, to = next, "run level complete");
                self.level = next;
                self.start_level();
            } else {
                debug!(
                    level = self.level,
                    image_index = self.run_level.current_image_index(),
                    "next image"
                );
                let _ = self.event_tx.send(TrainerEvent::ImageAdvanced {
                    level: self.level,
                    image_index: self.run_level.current_image_index(),
                });
            }
        }
    }

    /// Restart from the first level
    ///
    /// The background loop keeps playing; the next tick replaces it because
    /// it lands on the first image of a level.
    pub fn reset(&mut self) {
        info!(from = self.level, "trainer reset");

        self.level = 0;
        self.sequence = 0;
        self.start_level();
        if let Some(current) = self.run_level.current().copied() {
            self.update(&current);
        }

        let _ = self.event_tx.send(TrainerEvent::Reset(self.display));
    }

    /// Stop the background loop, waiting for it to start if needed
    pub async fn stop_background(&mut self) {
        if let Some(pending) = self.background.take() {
            let sound = pending.sound();
            match pending.resolve().await {
                Ok(voice) => {
                    debug!(%sound, "stopping background loop");
                    voice.stop();
                }
                Err(e) => debug!(%sound, error = %e, "background loop never started"),
            }
        }
    }

    /// Recompute the derived display state for `current`
    fn update(&mut self, current: &LevelImage) {
        self.display = compute_display(
            &self.levels[self.level],
            self.level,
            self.sequence,
            &self.run_level,
            current,
        );
    }

    /// Generate a fresh run level for the current level
    fn start_level(&mut self) {
        let level = &self.levels[self.level];
        self.run_level = RunLevel::generate(level, self.images, &mut self.picker, &mut self.rng);

        let total_secs = self.run_level.level_images().iter().map(|e| e.duration).sum();
        info!(
            level = self.level,
            images = self.run_level.len(),
            total_secs,
            "level started"
        );
        let _ = self.event_tx.send(TrainerEvent::LevelStarted {
            level: self.level,
            image_count: self.run_level.len(),
            total_secs,
        });
    }

    /// Swap the background loop for one tuned to the current level
    async fn replace_background(&mut self) {
        self.stop_background().await;

        let detune = self.level as f32 * BACKGROUND_DETUNE_PER_LEVEL;
        debug!(level = self.level, detune, "starting background loop");
        self.background = Some(
            self.audio
                .play(Sound::Background, PlayOptions::looped().with_detune(detune)),
        );
    }

    fn cue(&self, sound: Sound, options: PlayOptions) {
        let _ = self.audio.play(sound, options);
    }
}

fn compute_display(
    level: &Level,
    level_index: usize,
    sequence: u32,
    run_level: &RunLevel,
    current: &LevelImage,
) -> DisplayState {
    let countdown = current.duration.saturating_sub(sequence);

    DisplayState {
        level: level_index,
        sequence,
        image_index: run_level.current_image_index(),
        image_count: run_level.len(),
        image: current.image,
        duration: current.duration,
        countdown,
        show_countdown: countdown <= level.count_down_from,
    }
}
