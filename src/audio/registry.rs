//! Preloaded sound assets
//!
//! Every sound has a lazily resolving slot. `preload` kicks off all loads
//! at startup; `resolve` waits for the slot and retries a failed load.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::gateway::{AudioError, Sound};

/// Raw bytes of a loaded sound asset, cheap to clone
#[derive(Debug, Clone)]
pub struct Clip {
    pub sound: Sound,
    pub bytes: Arc<[u8]>,
}

/// Mapping from sound name to its loaded clip
#[derive(Debug)]
pub struct SoundRegistry {
    assets_dir: PathBuf,
    slots: [OnceCell<Clip>; 3],
}

impl SoundRegistry {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            slots: [OnceCell::new(), OnceCell::new(), OnceCell::new()],
        }
    }

    pub fn path_of(&self, sound: Sound) -> PathBuf {
        self.assets_dir.join(sound.file_name())
    }

    /// Start loading every sound in the background
    pub fn preload(self: &Arc<Self>) {
        for sound in Sound::ALL {
            let registry = Arc::clone(self);
            tokio::spawn(async move {
                match registry.resolve(sound).await {
                    Ok(clip) => {
                        info!(%sound, bytes = clip.bytes.len(), "sound preloaded");
                    }
                    Err(e) => {
                        warn!(%sound, error = %e, "sound preload failed");
                    }
                }
            });
        }
    }

    #[cfg(test)]
    pub fn is_loaded(&self, sound: Sound) -> bool {
        self.slots[sound.index()].initialized()
    }

    /// Wait for `sound` to be loaded and return its clip
    pub async fn resolve(&self, sound: Sound) -> Result<Clip, AudioError> {
        let slot = &self.slots[sound.index()];
        let clip = slot.get_or_try_init(|| self.load(sound)).await?;
        Ok(clip.clone())
    }

    async fn load(&self, sound: Sound) -> Result<Clip, AudioError> {
        let path = self.path_of(sound);
        debug!(?path, "loading sound asset");

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| AudioError::Load {
                path: path.clone(),
                source,
            })?;

        if bytes.is_empty() {
            return Err(AudioError::EmptyAsset { path });
        }

        Ok(Clip {
            sound,
            bytes: bytes.into(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create an assets directory holding a small file per sound
    pub(crate) fn fake_assets() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for sound in Sound::ALL {
            std::fs::write(dir.path().join(sound.file_name()), sound.to_string()).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_resolve_reads_asset() {
        let dir = fake_assets();
        let registry = SoundRegistry::new(dir.path());

        assert!(!registry.is_loaded(Sound::Long));
        let clip = registry.resolve(Sound::Long).await.unwrap();
        assert_eq!(clip.sound, Sound::Long);
        assert_eq!(&*clip.bytes, b"long");
        assert!(registry.is_loaded(Sound::Long));
    }

    #[tokio::test]
    async fn test_missing_asset_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SoundRegistry::new(dir.path());

        let err = registry.resolve(Sound::Short).await.unwrap_err();
        assert!(matches!(err, AudioError::Load { .. }));
        assert!(!registry.is_loaded(Sound::Short));

        std::fs::write(dir.path().join("short.aac"), b"beep").unwrap();
        let clip = registry.resolve(Sound::Short).await.unwrap();
        assert_eq!(&*clip.bytes, b"beep");
    }

    #[tokio::test]
    async fn test_preload_fills_every_slot() {
        let dir = fake_assets();
        let registry = Arc::new(SoundRegistry::new(dir.path()));

        registry.preload();
        for sound in Sound::ALL {
            registry.resolve(sound).await.unwrap();
            assert!(registry.is_loaded(sound));
        }
    }
}
