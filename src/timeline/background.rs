use crate::error::Result;
use crate::media::{AudioBuffer, AudioFormat};

/// Fade applied to both ends of every background segment under voice
pub const BACKGROUND_FADE_MS: u64 = 300;

/// Duration and voice flag of one clip, or of a run of clips once collapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub duration_ms: u64,
    pub is_voice: bool,
}

impl ScheduleEntry {
    pub fn new(duration_ms: u64, is_voice: bool) -> Self {
        ScheduleEntry {
            duration_ms,
            is_voice,
        }
    }
}

/// Merges neighbouring entries that share the same voice flag
pub fn collapse_schedule(schedule: &[ScheduleEntry]) -> Vec<ScheduleEntry> {
    let mut runs: Vec<ScheduleEntry> = Vec::new();
    for entry in schedule {
        match runs.last_mut() {
            Some(last) if last.is_voice == entry.is_voice => {
                last.duration_ms += entry.duration_ms;
            }
            _ => runs.push(*entry),
        }
    }
    runs
}

/// Builds the background track for a schedule.
///
/// The source is looped past the schedule's total length. Voice runs take
/// the looped source at a running cursor, faded by 300 ms at both ends;
/// non-voice runs are silent. The cursor moves by each run's duration plus
/// one millisecond. A final voice run is taken from the tail of the looped
/// source and a final non-voice run is left out.
pub fn build_background(
    source: &AudioBuffer,
    schedule: &[ScheduleEntry],
    format: AudioFormat,
) -> Result<AudioBuffer> {
    let mut background = AudioBuffer::empty(format);

    let runs = collapse_schedule(schedule);
    let Some((last, body)) = runs.split_last() else {
        return Ok(background);
    };

    let source_len = source.duration_ms();
    if source_len == 0 {
        log::error!("Background source is empty, background will be left out");
        return Ok(background);
    }

    let total_len: u64 = schedule.iter().map(|e| e.duration_ms).sum();
    let repetitions = (total_len / source_len + 1) as usize;
    let looped = source.clone().conform(format)?.repeat(repetitions);
    log::debug!(
        "Background: {} runs over {} ms, source {} ms looped {} times",
        runs.len(),
        total_len,
        source_len,
        repetitions
    );

    let mut pos = 0;
    for run in body {
        if run.is_voice {
            let segment = looped
                .slice(pos, pos + run.duration_ms)
                .fade_in(BACKGROUND_FADE_MS)
                .fade_out(BACKGROUND_FADE_MS);
            background.append(&segment)?;
        } else {
            background.append(&AudioBuffer::silent(run.duration_ms, format))?;
        }
        pos += run.duration_ms + 1;
    }

    if last.is_voice {
        background.append(&looped.tail(last.duration_ms))?;
    }

    Ok(background)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format() -> AudioFormat {
        AudioFormat::new(1000, 1)
    }

    fn bed(ms: usize) -> AudioBuffer {
        // Ramp so positions inside the source can be told apart
        let samples = (0..ms).map(|i| (i as f32 + 1.0) / ms as f32).collect();
        AudioBuffer::new(samples, format())
    }

    #[test]
    fn test_collapse_schedule() {
        let schedule = [
            ScheduleEntry::new(100, true),
            ScheduleEntry::new(200, true),
            ScheduleEntry::new(50, false),
            ScheduleEntry::new(70, false),
            ScheduleEntry::new(30, true),
        ];
        assert_eq!(
            collapse_schedule(&schedule),
            vec![
                ScheduleEntry::new(300, true),
                ScheduleEntry::new(120, false),
                ScheduleEntry::new(30, true),
            ]
        );
        assert!(collapse_schedule(&[]).is_empty());
    }

    #[test]
    fn test_background_length_voice_silence_voice() {
        let schedule = [
            ScheduleEntry::new(1000, true),
            ScheduleEntry::new(400, false),
            ScheduleEntry::new(800, true),
        ];
        let source = bed(700);
        let background = build_background(&source, &schedule, format()).unwrap();
        assert_eq!(background.duration_ms(), 1000 + 400 + 800);

        // Silence sits exactly under the non-voice run
        let gap = background.slice(1000, 1400);
        assert_eq!(gap.dbfs(), f64::NEG_INFINITY);

        // The final voice run is the tail of the looped source
        let looped = source.repeat((2200 / 700 + 1) as usize);
        assert_eq!(background.slice(1400, 2200), looped.tail(800));
    }

    #[test]
    fn test_trailing_non_voice_run_is_left_out() {
        let schedule = [
            ScheduleEntry::new(500, true),
            ScheduleEntry::new(300, false),
        ];
        let background = build_background(&bed(1000), &schedule, format()).unwrap();
        assert_eq!(background.duration_ms(), 500);
    }

    #[test]
    fn test_voice_segments_are_faded() {
        let schedule = [
            ScheduleEntry::new(1000, true),
            ScheduleEntry::new(100, false),
        ];
        let background = build_background(&bed(3000), &schedule, format()).unwrap();
        assert_eq!(background.samples()[0], 0.0);
        assert_eq!(background.samples()[999], 0.0);
        assert!(background.samples()[500] > 0.0);
    }

    #[test]
    fn test_cursor_skips_one_ms_between_runs() {
        let schedule = [
            ScheduleEntry::new(400, false),
            ScheduleEntry::new(1000, true),
            ScheduleEntry::new(10, false),
        ];
        let source = bed(5000);
        let background = build_background(&source, &schedule, format()).unwrap();
        // The voice run starts at 401 ms of the source
        let expected = source
            .slice(401, 1401)
            .fade_in(BACKGROUND_FADE_MS)
            .fade_out(BACKGROUND_FADE_MS);
        assert_eq!(background.slice(400, 1400), expected);
    }

    #[test]
    fn test_empty_inputs() {
        let empty = build_background(&bed(100), &[], format()).unwrap();
        assert!(empty.is_empty());

        let schedule = [ScheduleEntry::new(500, true)];
        let silent_source = AudioBuffer::empty(format());
        assert!(build_background(&silent_source, &schedule, format())
            .unwrap()
            .is_empty());
    }
}
