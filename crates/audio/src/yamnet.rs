//! YAMNet audio event classifier running on ONNX Runtime.
//!
//! The model is an ONNX export of YAMNet taking a 1-D 16 kHz waveform and
//! returning `[frames, 521]` scores, one frame per 0.48 s hop.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ndarray::{Array1, CowArray, Ix2};
use ort::tensor::OrtOwnedTensor;
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
use tracing::{debug, info};

use crate::analysis::{ScoreMatrix, SoundClassifier};
use crate::class_map::ClassMap;

pub const YAMNET_SAMPLE_RATE: u32 = 16_000;

pub struct YamnetClassifier {
    session: Session,
    scores_output: usize,
    class_names: Arc<[String]>,
}

impl YamnetClassifier {
    pub fn load<P: AsRef<Path>>(model_path: P, class_map: &ClassMap) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!(model = ?model_path, classes = class_map.len(), "loading YAMNet model");
        let environment = Environment::builder()
            .with_name("yamnet")
            .build()
            .context("create ONNX Runtime environment")?
            .into_arc();
        let session = SessionBuilder::new(&environment)?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)
            .with_context(|| format!("load ONNX model {:?}", model_path))?;

        let scores_output = session
            .outputs
            .iter()
            .position(|output| output.name.contains("scores"))
            .unwrap_or(0);
        debug!(
            inputs = session.inputs.len(),
            outputs = session.outputs.len(),
            scores_output,
            "YAMNet session ready"
        );

        Ok(Self {
            session,
            scores_output,
            class_names: class_map.names(),
        })
    }
}

impl SoundClassifier for YamnetClassifier {
    fn name(&self) -> &str {
        "YAMNet"
    }

    fn sample_rate(&self) -> u32 {
        YAMNET_SAMPLE_RATE
    }

    fn class_names(&self) -> Arc<[String]> {
        self.class_names.clone()
    }

    fn infer(&self, waveform: &Array1<f32>) -> Result<ScoreMatrix> {
        if waveform.is_empty() {
            return ScoreMatrix::empty(self.class_names.clone());
        }

        let input = CowArray::from(waveform.view()).into_dyn();
        let inputs = vec![Value::from_array(self.session.allocator(), &input)?];
        let outputs = self.session.run(inputs).context("YAMNet inference")?;
        let output = outputs
            .get(self.scores_output)
            .ok_or_else(|| anyhow!("YAMNet produced no score output"))?;
        let tensor: OrtOwnedTensor<f32, _> = output.try_extract()?;
        let scores = tensor
            .view()
            .clone()
            .into_dimensionality::<Ix2>()
            .context("YAMNet scores are not two-dimensional")?
            .to_owned();
        debug!(windows = scores.nrows(), "YAMNet inference finished");
        ScoreMatrix::new(self.class_names.clone(), scores)
    }
}
