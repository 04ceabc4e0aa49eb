use serde::{Deserialize, Serialize};

use crate::SoundCategory;

/// Classification of a single fixed-length window of audio.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WindowClassification {
    /// Window start in seconds (`index * window length`).
    #[serde(rename = "time")]
    pub offset_seconds: f64,
    #[serde(rename = "class")]
    pub top_label: String,
    pub confidence: f32,
    pub category: SoundCategory,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryDurations {
    #[serde(rename = "instrument_time")]
    pub instrument: f64,
    #[serde(rename = "voice_time")]
    pub voice: f64,
    #[serde(rename = "silence_time")]
    pub silence: f64,
    #[serde(rename = "noise_time")]
    pub noise: f64,
    #[serde(rename = "metronome_time")]
    pub metronome: f64,
}

impl CategoryDurations {
    pub fn get(&self, category: SoundCategory) -> f64 {
        match category {
            SoundCategory::Instrument => self.instrument,
            SoundCategory::Voice => self.voice,
            SoundCategory::Silence => self.silence,
            SoundCategory::Noise => self.noise,
            SoundCategory::Metronome => self.metronome,
        }
    }

    pub fn sum(&self) -> f64 {
        SoundCategory::ALL.iter().map(|category| self.get(*category)).sum()
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryPercentages {
    #[serde(rename = "instrument_percent")]
    pub instrument: f64,
    #[serde(rename = "voice_percent")]
    pub voice: f64,
    #[serde(rename = "silence_percent")]
    pub silence: f64,
    #[serde(rename = "noise_percent")]
    pub noise: f64,
    #[serde(rename = "metronome_percent")]
    pub metronome: f64,
}

impl CategoryPercentages {
    pub fn get(&self, category: SoundCategory) -> f64 {
        match category {
            SoundCategory::Instrument => self.instrument,
            SoundCategory::Voice => self.voice,
            SoundCategory::Silence => self.silence,
            SoundCategory::Noise => self.noise,
            SoundCategory::Metronome => self.metronome,
        }
    }

    pub fn sum(&self) -> f64 {
        SoundCategory::ALL.iter().map(|category| self.get(*category)).sum()
    }
}

/// Number of windows assigned to each category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowCounts {
    pub instrument: usize,
    pub voice: usize,
    pub silence: usize,
    pub noise: usize,
    pub metronome: usize,
}

impl WindowCounts {
    pub fn record(&mut self, category: SoundCategory) {
        match category {
            SoundCategory::Instrument => self.instrument += 1,
            SoundCategory::Voice => self.voice += 1,
            SoundCategory::Silence => self.silence += 1,
            SoundCategory::Noise => self.noise += 1,
            SoundCategory::Metronome => self.metronome += 1,
        }
    }

    pub fn get(&self, category: SoundCategory) -> usize {
        match category {
            SoundCategory::Instrument => self.instrument,
            SoundCategory::Voice => self.voice,
            SoundCategory::Silence => self.silence,
            SoundCategory::Noise => self.noise,
            SoundCategory::Metronome => self.metronome,
        }
    }

    pub fn total(&self) -> usize {
        self.instrument + self.voice + self.silence + self.noise + self.metronome
    }

    pub fn durations(&self, window_seconds: f64) -> CategoryDurations {
        CategoryDurations {
            instrument: self.instrument as f64 * window_seconds,
            voice: self.voice as f64 * window_seconds,
            silence: self.silence as f64 * window_seconds,
            noise: self.noise as f64 * window_seconds,
            metronome: self.metronome as f64 * window_seconds,
        }
    }
}

/// Time-based summary of a practice recording.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PracticeReport {
    #[serde(flatten)]
    pub durations: CategoryDurations,
    #[serde(rename = "total_time")]
    pub total_duration: f64,
    /// Absent when the recording produced no windows.
    #[serde(flatten)]
    pub percentages: Option<CategoryPercentages>,
    /// Instrument time only; metronome windows never count as practice.
    #[serde(rename = "net_practice_time")]
    pub net_practice_duration: f64,
    pub segments: Vec<WindowClassification>,
    #[serde(skip)]
    pub window_counts: WindowCounts,
}

impl PracticeReport {
    pub fn from_segments(segments: Vec<WindowClassification>, window_seconds: f64) -> Self {
        let mut counts = WindowCounts::default();
        for segment in &segments {
            counts.record(segment.category);
        }
        Self::from_counts(counts, segments, window_seconds)
    }

    pub fn from_counts(
        counts: WindowCounts,
        segments: Vec<WindowClassification>,
        window_seconds: f64,
    ) -> Self {
        let durations = counts.durations(window_seconds);
        let total_duration = counts.total() as f64 * window_seconds;
        let percentages = (total_duration > 0.0).then(|| CategoryPercentages {
            instrument: percent_of(durations.instrument, total_duration),
            voice: percent_of(durations.voice, total_duration),
            silence: percent_of(durations.silence, total_duration),
            noise: percent_of(durations.noise, total_duration),
            metronome: percent_of(durations.metronome, total_duration),
        });
        Self {
            durations,
            total_duration,
            percentages,
            net_practice_duration: durations.instrument,
            segments,
            window_counts: counts,
        }
    }

    pub fn window_count(&self) -> usize {
        self.window_counts.total()
    }
}

/// Share of `total` in percent, rounded half-to-even to one decimal place.
pub fn percent_of(part: f64, total: f64) -> f64 {
    (part / total * 1000.0).round_ties_even() / 10.0
}
