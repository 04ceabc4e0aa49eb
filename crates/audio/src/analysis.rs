use std::sync::Arc;

use anyhow::{bail, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::debug;

/// Per-window class scores produced by a [`SoundClassifier`].
///
/// Row `i` holds the scores of window `i`; column `j` belongs to
/// `class_names[j]`. Construction checks that both agree.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    class_names: Arc<[String]>,
    scores: Array2<f32>,
}

impl ScoreMatrix {
    pub fn new(class_names: Arc<[String]>, scores: Array2<f32>) -> Result<Self> {
        if class_names.is_empty() {
            bail!("score matrix needs at least one class");
        }
        if scores.ncols() != class_names.len() {
            bail!(
                "classifier produced {} scores per window for {} classes",
                scores.ncols(),
                class_names.len()
            );
        }
        Ok(Self {
            class_names,
            scores,
        })
    }

    pub fn empty(class_names: Arc<[String]>) -> Result<Self> {
        let width = class_names.len();
        Self::new(class_names, Array2::zeros((0, width)))
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn window_count(&self) -> usize {
        self.scores.nrows()
    }

    pub fn scores(&self) -> ArrayView2<'_, f32> {
        self.scores.view()
    }

    pub fn windows(&self) -> impl Iterator<Item = ArrayView1<'_, f32>> + '_ {
        self.scores.rows().into_iter()
    }
}

/// A pre-trained audio event classifier.
///
/// Implementations are loaded once and shared read-only between requests.
pub trait SoundClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Sample rate the waveform passed to [`SoundClassifier::infer`] must use.
    fn sample_rate(&self) -> u32;

    fn class_names(&self) -> Arc<[String]>;

    /// Score a mono waveform, one row per analysis window.
    fn infer(&self, waveform: &Array1<f32>) -> Result<ScoreMatrix>;
}

/// Classifier returning a fixed score matrix regardless of input.
pub struct StaticClassifier {
    name: String,
    sample_rate: u32,
    matrix: ScoreMatrix,
}

impl StaticClassifier {
    pub fn new(matrix: ScoreMatrix) -> Self {
        Self {
            name: "static".to_string(),
            sample_rate: 16_000,
            matrix,
        }
    }

    /// One window per label; each window scores its label 0.9 and every
    /// other class 0.1 / (classes - 1).
    pub fn from_top_labels(labels: &[&str]) -> Result<Self> {
        let mut vocabulary: Vec<String> = Vec::new();
        for label in labels {
            if !vocabulary.iter().any(|known| known == label) {
                vocabulary.push(label.to_string());
            }
        }
        if vocabulary.is_empty() {
            vocabulary.push("Silence".to_string());
        }
        let width = vocabulary.len();
        let rest = if width > 1 { 0.1 / (width - 1) as f32 } else { 0.0 };
        let mut scores = Array2::from_elem((labels.len(), width), rest);
        for (row, label) in labels.iter().enumerate() {
            if let Some(column) = vocabulary.iter().position(|known| known == label) {
                scores[[row, column]] = 0.9;
            }
        }
        let matrix = ScoreMatrix::new(vocabulary.into(), scores)?;
        Ok(Self::new(matrix))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl SoundClassifier for StaticClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn class_names(&self) -> Arc<[String]> {
        self.matrix.class_names.clone()
    }

    fn infer(&self, waveform: &Array1<f32>) -> Result<ScoreMatrix> {
        debug!(samples = waveform.len(), "static classifier ignoring waveform");
        Ok(self.matrix.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(labels: &[&str]) -> Arc<[String]> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    #[test]
    fn matrix_rejects_width_mismatch() {
        let result = ScoreMatrix::new(names(&["Piano", "Speech"]), array![[0.1, 0.2, 0.7]]);
        assert!(result.is_err());
    }

    #[test]
    fn matrix_rejects_empty_vocabulary() {
        assert!(ScoreMatrix::new(names(&[]), Array2::zeros((1, 0))).is_err());
    }

    #[test]
    fn empty_matrix_has_no_windows() {
        let matrix = ScoreMatrix::empty(names(&["Piano"])).unwrap();
        assert_eq!(matrix.window_count(), 0);
        assert_eq!(matrix.windows().count(), 0);
    }

    #[test]
    fn static_classifier_builds_one_row_per_label() {
        let classifier = StaticClassifier::from_top_labels(&["Piano", "Click", "Piano"]).unwrap();
        let matrix = classifier.infer(&Array1::zeros(10)).unwrap();
        assert_eq!(matrix.window_count(), 3);
        assert_eq!(matrix.class_names(), &["Piano".to_string(), "Click".to_string()]);
        assert_eq!(matrix.scores()[[1, 1]], 0.9);
        assert_eq!(classifier.class_names().len(), 2);
    }
}
