//! Audio output through rodio
//!
//! The `OutputStream` must stay alive on the thread that created it; the
//! gateway only holds the cloneable handle.

use std::io::Cursor;
use std::sync::Arc;

use rodio::{Decoder, OutputStreamHandle, Sink, Source};
use tracing::debug;

use super::gateway::{AudioError, AudioGateway, PendingVoice, PlayOptions, Sound, Voice};
use super::registry::{Clip, SoundRegistry};

pub struct RodioVoice {
    sink: Arc<Sink>,
}

impl Voice for RodioVoice {
    fn stop(&self) {
        self.sink.stop();
    }
}

pub struct RodioGateway {
    registry: Arc<SoundRegistry>,
    output: OutputStreamHandle,
}

impl RodioGateway {
    pub fn new(registry: Arc<SoundRegistry>, output: OutputStreamHandle) -> Self {
        Self { registry, output }
    }
}

type BoxedSource = Box<dyn Source<Item = i16> + Send>;

/// Decode a clip and apply detune and looping
fn build_source(clip: Clip, options: PlayOptions) -> Result<BoxedSource, AudioError> {
    let sound = clip.sound;
    let source = Decoder::new(Cursor::new(clip.bytes)).map_err(|e| AudioError::Decode {
        sound,
        message: e.to_string(),
    })?;

    let source = source.speed(options.speed());
    if options.looped {
        Ok(Box::new(source.repeat_infinite()))
    } else {
        Ok(Box::new(source))
    }
}

fn start(clip: Clip, output: &OutputStreamHandle, options: PlayOptions) -> Result<Arc<Sink>, AudioError> {
    let source = build_source(clip, options)?;
    let sink = Sink::try_new(output).map_err(|e| AudioError::Device(e.to_string()))?;
    sink.append(source);

    Ok(Arc::new(sink))
}

impl AudioGateway for RodioGateway {
    type Voice = RodioVoice;

    fn play(&self, sound: Sound, options: PlayOptions) -> PendingVoice<RodioVoice> {
        let registry = Arc::clone(&self.registry);
        let output = self.output.clone();

        PendingVoice::spawn(sound, async move {
            let clip = registry.resolve(sound).await?;
            let sink = start(clip, &output, options)?;
            debug!(%sound, looped = options.looped, detune = ?options.detune, "playing sound");

            if !options.looped {
                // Hold the sink until the clip ends, then release the output
                let finished = Arc::clone(&sink);
                tokio::task::spawn_blocking(move || finished.sleep_until_end());
            }

            Ok(RodioVoice { sink })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 8000;

    /// A tenth of a second of 16-bit mono PCM in a WAV container
    fn wav_clip(sound: Sound) -> Clip {
        let samples: Vec<i16> = (0..SAMPLE_RATE / 10)
            .map(|i| if i % 20 < 10 { 4000 } else { -4000 })
            .collect();
        let data_len = (samples.len() * 2) as u32;

        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        bytes.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        Clip {
            sound,
            bytes: bytes.into(),
        }
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let clip = Clip {
            sound: Sound::Short,
            bytes: Arc::from(&b"definitely not audio"[..]),
        };

        match build_source(clip, PlayOptions::default()) {
            Err(AudioError::Decode { sound, .. }) => assert_eq!(sound, Sound::Short),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("garbage decoded"),
        }
    }

    #[test]
    fn test_one_shot_has_finite_duration() {
        let source = build_source(wav_clip(Sound::Long), PlayOptions::default()).unwrap();
        assert!(source.total_duration().is_some());
        assert_eq!(source.sample_rate(), SAMPLE_RATE);
    }

    #[test]
    fn test_looped_source_never_ends() {
        let mut source = build_source(wav_clip(Sound::Background), PlayOptions::looped()).unwrap();
        assert_eq!(source.total_duration(), None);

        // Well past the clip's own length
        let played = source.by_ref().take(SAMPLE_RATE as usize).count();
        assert_eq!(played, SAMPLE_RATE as usize);
    }

    #[test]
    fn test_detune_shifts_sample_rate() {
        let up = build_source(wav_clip(Sound::Background), PlayOptions::looped().with_detune(1200.0)).unwrap();
        assert!(up.sample_rate().abs_diff(SAMPLE_RATE * 2) <= 1);

        let down = build_source(wav_clip(Sound::Short), PlayOptions::default().with_detune(-1200.0)).unwrap();
        assert!(down.sample_rate().abs_diff(SAMPLE_RATE / 2) <= 1);
    }
}
