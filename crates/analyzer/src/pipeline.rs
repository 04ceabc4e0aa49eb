use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ndarray::Array1;
use tracing::{info, instrument, warn};

use etude_audio::{resample, AudioDecoder, AudioReader, FfmpegTranscoder, SoundClassifier};
use etude_domain::{KeywordTable, PracticeReport};

use crate::aggregate::SegmentAggregator;

#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub audio: Arc<[u8]>,
    /// File extension of the upload, used as a decoding hint.
    pub extension: Option<String>,
    pub metronome_enabled: bool,
}

impl AnalysisJob {
    pub fn new(
        audio: impl Into<Arc<[u8]>>,
        extension: Option<String>,
        metronome_enabled: bool,
    ) -> Self {
        Self {
            audio: audio.into(),
            extension,
            metronome_enabled,
        }
    }
}

pub struct AnalysisPipeline {
    classifier: Arc<dyn SoundClassifier>,
    aggregator: SegmentAggregator,
    transcoder: Option<FfmpegTranscoder>,
}

impl AnalysisPipeline {
    pub fn new(classifier: Arc<dyn SoundClassifier>, keywords: Arc<KeywordTable>) -> Self {
        Self {
            classifier,
            aggregator: SegmentAggregator::new(keywords),
            transcoder: None,
        }
    }

    /// Fall back to ffmpeg for containers the built-in decoders reject.
    pub fn with_transcoder(mut self, transcoder: FfmpegTranscoder) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn classifier(&self) -> &dyn SoundClassifier {
        self.classifier.as_ref()
    }

    #[instrument(skip(self, job), fields(bytes = job.audio.len(), metronome = job.metronome_enabled))]
    pub fn analyze(&self, job: &AnalysisJob) -> Result<PracticeReport> {
        let audio = self.decode(&job.audio, job.extension.as_deref())?;
        info!(
            sample_rate = audio.sample_rate,
            channels = audio.channels,
            seconds = audio.duration_seconds(),
            "decoded upload"
        );

        let mono = audio.to_mono();
        let waveform = resample(&mono, audio.sample_rate, self.classifier.sample_rate())
            .context("resample audio for the classifier")?;
        let scores = self
            .classifier
            .infer(&Array1::from(waveform))
            .with_context(|| format!("{} inference", self.classifier.name()))?;
        let report = self.aggregator.aggregate(&scores, job.metronome_enabled);

        info!(
            windows = report.window_count(),
            total_seconds = report.total_duration,
            net_practice_seconds = report.net_practice_duration,
            "analysis finished"
        );
        Ok(report)
    }

    pub fn analyze_file<P: AsRef<Path>>(
        &self,
        path: P,
        metronome_enabled: bool,
    ) -> Result<PracticeReport> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("read audio file {:?}", path))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string);
        self.analyze(&AnalysisJob::new(bytes, extension, metronome_enabled))
    }

    fn decode(&self, bytes: &Arc<[u8]>, extension: Option<&str>) -> Result<AudioReader> {
        match AudioDecoder::decode_bytes(bytes.clone(), extension) {
            Ok(audio) => Ok(audio),
            Err(err) => {
                let Some(transcoder) = &self.transcoder else {
                    return Err(err.context("decode audio upload"));
                };
                warn!(error = %err, "built-in decoders rejected upload, trying ffmpeg");
                let wav = transcoder.transcode_to_wav(bytes, extension)?;
                AudioDecoder::decode_bytes(wav, Some("wav")).context("decode transcoded audio")
            }
        }
    }
}
