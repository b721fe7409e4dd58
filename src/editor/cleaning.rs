use crate::analysis::{
    detect_leading_microphone_error, detect_leading_silence, detect_trailing_silence,
    microphone_error, silence_detection, Threshold,
};
use serde::Serialize;

use crate::error::Result;
use crate::media::AudioBuffer;
use crate::timeline::{Clip, Podcast};

/// Leading cuts shorter than this are reported as suspicious
pub const NEGLIGIBLE_CUT_MS: u64 = 100;

/// Where the cleaner would cut a buffer, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleaningCuts {
    /// Start of the kept region
    pub head_ms: u64,
    /// End of the kept region
    pub tail_ms: u64,
    /// Extra cut from the start of the kept region
    pub microphone_error_ms: u64,
}

impl CleaningCuts {
    /// Finds the head, tail and microphone-error cuts of an already faded buffer
    pub fn detect(faded: &AudioBuffer, fade_in_ms: u64) -> Self {
        let head_ms = detect_leading_silence(
            faded,
            Threshold::Auto,
            silence_detection::DEFAULT_CHUNK_MS,
        );
        let tail_ms = detect_trailing_silence(faded, silence_detection::DEFAULT_CHUNK_MS)
            .resolve(faded.duration_ms());
        let microphone_error_ms = detect_leading_microphone_error(
            &faded.slice(head_ms, tail_ms),
            fade_in_ms,
            microphone_error::DEFAULT_CHUNK_MS,
            microphone_error::DEFAULT_SAMPLE_WINDOW_MS,
        );
        CleaningCuts {
            head_ms,
            tail_ms,
            microphone_error_ms,
        }
    }

    /// The region left after every cut
    pub fn apply(&self, faded: &AudioBuffer) -> AudioBuffer {
        faded
            .slice(self.head_ms, self.tail_ms)
            .slice_from(self.microphone_error_ms)
    }
}

/// Cuts head and tail silence and a leading microphone error from a clip,
/// then pads it with `silence_around_ms` of silence on both sides.
///
/// Always starts from the raw buffer, so cleaning twice gives the same result.
pub fn clean_clip(clip: &Clip, index: usize, silence_around_ms: u64) -> Result<AudioBuffer> {
    let settings = &clip.settings;
    let format = clip.raw_buffer().format();
    let faded = clip
        .raw_buffer()
        .clone()
        .fade_in(settings.before_cleaning_fade_ms)
        .fade_out(settings.before_cleaning_fade_ms);

    let cuts = CleaningCuts::detect(&faded, settings.fade_in_ms);
    log::debug!("Cutting with {}..{}", cuts.head_ms, cuts.tail_ms);

    if cuts.head_ms < NEGLIGIBLE_CUT_MS {
        log::warn!(
            "The leading silence cut is negligible ({} ms) it is probably a mistake. \
             index in schedule: {}, file: {:?}",
            cuts.head_ms,
            index,
            settings.filename
        );
    }
    if cuts.microphone_error_ms > 0 {
        log::debug!(
            "Cleaning fallback - Detected leading microphone error ({} ms) for file: {:?}",
            cuts.microphone_error_ms,
            settings.filename
        );
    }

    let silence = AudioBuffer::silent(silence_around_ms, format);
    let voice = cuts
        .apply(&faded)
        .fade_in(settings.fade_in_ms)
        .fade_out(settings.fade_out_ms);

    let mut cleaned = silence.clone();
    cleaned.append(&voice)?;
    cleaned.append(&silence)?;
    Ok(cleaned)
}

impl Podcast {
    /// Runs the cleaner over every clip marked for cleaning
    pub fn clean(&mut self, silence_around_ms: u64) -> Result<&mut Self> {
        for (index, clip) in self.clips_mut().iter_mut().enumerate() {
            if clip.should_clean() {
                log::debug!("Cleaning sound {:?}", clip.filename());
                let cleaned = clean_clip(clip, index, silence_around_ms)?;
                clip.set_cleaned_buffer(cleaned);
            } else {
                log::debug!(
                    "Cleaning sound {:?} WAS SKIPPED due to should_clean=false option",
                    clip.filename()
                );
            }
            clip.mark_cleaning_performed();
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DirConfig};
    use crate::media::AudioFormat;
    use crate::timeline::ClipSettings;

    fn format() -> AudioFormat {
        AudioFormat::new(1000, 1)
    }

    /// 1000 ms of silence, 2000 ms of steady speech-level tone, 1000 ms of silence
    fn recording() -> AudioBuffer {
        let mut samples = vec![0.0f32; 1000];
        samples.extend(vec![0.5f32; 2000]);
        samples.extend(vec![0.0f32; 1000]);
        AudioBuffer::new(samples, format())
    }

    fn voice_clip(fade_ms: u64) -> Clip {
        let mut settings = ClipSettings::new("voice1.wav");
        settings.is_voice = true;
        settings.should_clean = true;
        settings.before_cleaning_fade_ms = 100;
        settings.fade_in_ms = fade_ms;
        settings.fade_out_ms = fade_ms;
        Clip::with_buffer(settings, recording())
    }

    #[test]
    fn test_clean_clip_trims_and_pads() {
        let cleaned = clean_clip(&voice_clip(200), 0, 500).unwrap();
        // Head and tail cut 300 ms short of the tone, plus 2 x 500 ms padding
        assert_eq!(cleaned.duration_ms(), 500 + 2600 + 500);
        assert_eq!(cleaned.slice(0, 500).dbfs(), f64::NEG_INFINITY);
        assert_eq!(cleaned.tail(500).dbfs(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_clean_clip_applies_microphone_cut() {
        // With a short fade the onset jump at 295 ms is past 2 x fade_in,
        // so 295 - 10 ms more are cut from the front
        let cleaned = clean_clip(&voice_clip(10), 0, 500).unwrap();
        assert_eq!(cleaned.duration_ms(), 500 + 2600 - 285 + 500);
    }

    #[test]
    fn test_cuts_of_recording() {
        let faded = recording().fade_in(100).fade_out(100);
        let cuts = CleaningCuts::detect(&faded, 10);
        assert_eq!(
            cuts,
            CleaningCuts {
                head_ms: 700,
                tail_ms: 3300,
                microphone_error_ms: 285,
            }
        );
        assert_eq!(cuts.apply(&faded).duration_ms(), 2600 - 285);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let config = Config {
            output_format: format(),
            ..Config::default()
        };
        let mut podcast = Podcast::new("ep", DirConfig::default(), &config);
        podcast.push_clip(voice_clip(10));

        podcast.clean(500).unwrap();
        let first = podcast.clips()[0].current_buffer().clone();
        podcast.clean(500).unwrap();
        let second = podcast.clips()[0].current_buffer().clone();

        assert_eq!(first, second);
        assert_eq!(podcast.clips()[0].raw_buffer(), &recording());
    }

    #[test]
    fn test_uncleaned_clips_are_marked() {
        let config = Config::default();
        let mut podcast = Podcast::new("ep", DirConfig::default(), &config);
        podcast.push_clip(Clip::with_buffer(
            ClipSettings::new("intro.wav"),
            AudioBuffer::new(vec![0.2; 400], format()),
        ));

        podcast.clean(500).unwrap();
        let clip = &podcast.clips()[0];
        assert!(clip.cleaning_performed());
        assert!(clip.cleaned_buffer().is_none());
        assert_eq!(clip.duration_ms(), 400);
    }

    #[test]
    fn test_clean_with_huge_fades() {
        let mut clip = voice_clip(u64::MAX);
        clip.settings.before_cleaning_fade_ms = u64::MAX;
        let cleaned = clean_clip(&clip, 0, 100).unwrap();
        assert!(cleaned.duration_ms() >= 200);
    }

    #[test]
    fn test_clean_empty_clip_does_not_panic() {
        let mut settings = ClipSettings::new("broken.wav");
        settings.should_clean = true;
        let clip = Clip::with_buffer(settings, AudioBuffer::empty(format()));
        let cleaned = clean_clip(&clip, 3, 200).unwrap();
        assert_eq!(cleaned.duration_ms(), 400);
    }
}
