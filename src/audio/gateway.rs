//! Audio gateway contract shared by all backends

use std::future::Future;
use std::path::PathBuf;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::warn;

/// The named sound assets the trainer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    /// Countdown tick
    Short,
    /// New image cue
    Long,
    /// Looping level backdrop
    Background,
}

impl Sound {
    pub const ALL: [Sound; 3] = [Sound::Short, Sound::Long, Sound::Background];

    /// Asset file name relative to the assets directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Sound::Short => "short.aac",
            Sound::Long => "long.aac",
            Sound::Background => "background.aac",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Sound::Short => 0,
            Sound::Long => 1,
            Sound::Background => 2,
        }
    }
}

impl std::fmt::Display for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sound::Short => write!(f, "short"),
            Sound::Long => write!(f, "long"),
            Sound::Background => write!(f, "background"),
        }
    }
}

/// Per-call playback parameters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayOptions {
    /// Repeat until stopped
    pub looped: bool,
    /// Pitch offset in cents
    pub detune: Option<f32>,
}

impl PlayOptions {
    pub fn looped() -> Self {
        Self {
            looped: true,
            detune: None,
        }
    }

    pub fn with_detune(mut self, cents: f32) -> Self {
        // Zero detune is the same as none
        self.detune = (cents != 0.0).then_some(cents);
        self
    }

    /// Playback speed factor equivalent to the detune
    #[cfg(any(feature = "playback", test))]
    pub fn speed(&self) -> f32 {
        self.detune.map_or(1.0, |cents| 2f32.powf(cents / 1200.0))
    }
}

/// Errors that can occur while loading or playing a sound
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to read sound asset {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sound asset {path} is empty")]
    EmptyAsset { path: PathBuf },

    #[cfg(feature = "playback")]
    #[error("failed to decode sound {sound}: {message}")]
    Decode { sound: Sound, message: String },

    #[cfg(feature = "playback")]
    #[error("audio output unavailable: {0}")]
    Device(String),

    #[error("playback task failed: {0}")]
    Task(String),
}

/// A playing sound instance
pub trait Voice: Send + Sync + 'static {
    /// Stop playback; stopping twice is a no-op
    fn stop(&self);
}

/// A voice that is still being resolved
///
/// Dropping it detaches the playback task, which keeps playing.
#[must_use = "drop explicitly to fire and forget"]
pub struct PendingVoice<V> {
    sound: Sound,
    task: JoinHandle<Result<V, AudioError>>,
}

impl<V: Send + 'static> PendingVoice<V> {
    /// Spawn the playback future, logging any failure it produces
    pub fn spawn<F>(sound: Sound, playback: F) -> Self
    where
        F: Future<Output = Result<V, AudioError>> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let result = playback.await;
            if let Err(e) = &result {
                warn!(%sound, error = %e, "sound playback failed");
            }
            result
        });

        Self { sound, task }
    }

    pub fn sound(&self) -> Sound {
        self.sound
    }

    /// Wait for playback to start
    pub async fn resolve(self) -> Result<V, AudioError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(AudioError::Task(e.to_string())),
        }
    }
}

/// Fire-and-forget playback of named sounds
pub trait AudioGateway: Send + Sync + 'static {
    type Voice: Voice;

    /// Start an independent playback instance of `sound`
    ///
    /// Must be called from within a tokio runtime.
    fn play(&self, sound: Sound, options: PlayOptions) -> PendingVoice<Self::Voice>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready_err, assert_ready_ok, task};

    #[derive(Debug)]
    struct Noop;

    impl Voice for Noop {
        fn stop(&self) {}
    }

    /// Yield until the playback task has woken the resolver
    async fn until_woken<F: Future>(resolving: &task::Spawn<F>) {
        while !resolving.is_woken() {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_zero_detune_is_none() {
        assert_eq!(PlayOptions::default().with_detune(0.0).detune, None);
        assert_eq!(PlayOptions::looped().with_detune(200.0).detune, Some(200.0));
    }

    #[test]
    fn test_detune_speed() {
        assert_eq!(PlayOptions::default().speed(), 1.0);
        let octave = PlayOptions::default().with_detune(1200.0);
        assert!((octave.speed() - 2.0).abs() < 1e-6);
        let down = PlayOptions::default().with_detune(-1200.0);
        assert!((down.speed() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sound_files() {
        assert_eq!(Sound::Short.file_name(), "short.aac");
        assert_eq!(Sound::Background.to_string(), "background");
        let json = serde_json::to_string(&Sound::Long).unwrap();
        assert_eq!(json, "\"long\"");
    }

    #[tokio::test]
    async fn test_pending_voice_waits_for_playback() {
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let pending = PendingVoice::spawn(Sound::Long, async move {
            match started_rx.await {
                Ok(()) => Ok(Noop),
                Err(e) => Err(AudioError::Task(e.to_string())),
            }
        });
        assert_eq!(pending.sound(), Sound::Long);

        let mut resolving = task::spawn(pending.resolve());
        assert_pending!(resolving.poll());

        started_tx.send(()).unwrap();
        until_woken(&resolving).await;
        assert_ready_ok!(resolving.poll());
    }

    #[tokio::test]
    async fn test_pending_voice_reports_failure() {
        let pending: PendingVoice<Noop> = PendingVoice::spawn(Sound::Short, async {
            Err(AudioError::EmptyAsset {
                path: PathBuf::from("short.aac"),
            })
        });

        let mut resolving = task::spawn(pending.resolve());
        assert_pending!(resolving.poll());
        until_woken(&resolving).await;
        let err = assert_ready_err!(resolving.poll());
        assert!(err.to_string().contains("is empty"));
    }

    #[tokio::test]
    async fn test_aborted_playback_is_a_task_error() {
        let pending: PendingVoice<Noop> =
            PendingVoice::spawn(Sound::Background, std::future::pending());
        pending.task.abort();

        let err = pending.resolve().await.unwrap_err();
        assert!(matches!(err, AudioError::Task(_)));
    }
}
