//! Window labelling and time bookkeeping over classifier scores.

use std::sync::Arc;

use etude_audio::ScoreMatrix;
use etude_domain::{KeywordTable, PracticeReport, WindowClassification, WindowCounts, WINDOW_SECONDS};
use ndarray::ArrayView1;
use tracing::debug;

/// Index and score of the best class; ties keep the lowest index.
pub fn top_class(scores: ArrayView1<'_, f32>) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, current)) if current.is_nan() && !score.is_nan() => best = Some((index, score)),
            Some((_, current)) if score > current => best = Some((index, score)),
            Some(_) => {}
            None => best = Some((index, score)),
        }
    }
    best
}

pub struct SegmentAggregator {
    keywords: Arc<KeywordTable>,
    window_seconds: f64,
}

impl SegmentAggregator {
    pub fn new(keywords: Arc<KeywordTable>) -> Self {
        Self {
            keywords,
            window_seconds: WINDOW_SECONDS,
        }
    }

    pub fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    /// Label every window and total the time spent in each category.
    pub fn aggregate(&self, matrix: &ScoreMatrix, metronome_enabled: bool) -> PracticeReport {
        let class_names = matrix.class_names();
        let mut counts = WindowCounts::default();
        let mut segments = Vec::with_capacity(matrix.window_count());

        for (index, window) in matrix.windows().enumerate() {
            let (top_label, confidence) = match top_class(window) {
                Some((class, score)) => (class_names[class].clone(), score),
                None => (String::new(), 0.0),
            };
            let category = self.keywords.classify(&top_label, metronome_enabled);
            counts.record(category);
            segments.push(WindowClassification {
                offset_seconds: index as f64 * self.window_seconds,
                top_label,
                confidence,
                category,
            });
        }

        debug!(
            windows = segments.len(),
            instrument = counts.instrument,
            voice = counts.voice,
            silence = counts.silence,
            noise = counts.noise,
            metronome = counts.metronome,
            "aggregated windows"
        );
        PracticeReport::from_counts(counts, segments, self.window_seconds)
    }
}
