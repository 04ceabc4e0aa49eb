//! Routes of the practice analysis service.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use etude_analyzer::{AnalysisJob, AnalysisPipeline};
use etude_domain::PracticeReport;

use crate::error::ApiError;
use crate::upload::UploadForm;

/// Shared, immutable model and keyword table for every request.
#[derive(Clone)]
pub struct AnalysisState {
    pipeline: Arc<AnalysisPipeline>,
}

impl AnalysisState {
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelHealth {
    pub status: &'static str,
    pub model: String,
}

pub fn analysis_router(state: AnalysisState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AnalysisState>) -> Json<ModelHealth> {
    Json(ModelHealth {
        status: "ok",
        model: format!("{} loaded", state.pipeline.classifier().name()),
    })
}

/// `true` in any letter case enables the metronome category.
fn metronome_flag(value: Option<&str>) -> bool {
    value.is_some_and(|raw| raw.eq_ignore_ascii_case("true"))
}

async fn analyze(
    State(state): State<AnalysisState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PracticeReport>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let audio = form
        .take_file("audio")
        .ok_or_else(|| ApiError::bad_request("No audio file provided"))?;
    let metronome_enabled = metronome_flag(form.field("metronome"));
    info!(filename = %audio.filename, bytes = audio.bytes.len(), metronome_enabled, "analyzing upload");

    let job = AnalysisJob::new(audio.bytes.to_vec(), audio.extension(), metronome_enabled);
    let pipeline = state.pipeline.clone();
    let report = tokio::task::spawn_blocking(move || pipeline.analyze(&job))
        .await
        .map_err(|err| ApiError::internal(format!("analysis task failed: {err}")))?
        .map_err(|err| ApiError::internal(format!("{err:#}")))?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{multipart_request, response_json, Part};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use etude_audio::StaticClassifier;
    use etude_domain::KeywordTable;
    use tower::ServiceExt;

    fn router(labels: &[&str]) -> Router {
        let classifier = StaticClassifier::from_top_labels(labels)
            .unwrap()
            .with_name("YAMNet");
        let pipeline = AnalysisPipeline::new(Arc::new(classifier), Arc::new(KeywordTable::default()));
        analysis_router(AnalysisState::new(Arc::new(pipeline)))
    }

    fn silent_wav() -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..16_000 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn metronome_flag_is_case_insensitive() {
        assert!(metronome_flag(Some("TRUE")));
        assert!(metronome_flag(Some("true")));
        assert!(!metronome_flag(Some("yes")));
        assert!(!metronome_flag(None));
    }

    #[tokio::test]
    async fn health_names_the_model() {
        let response = router(&["Piano"])
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model"], "YAMNet loaded");
    }

    #[tokio::test]
    async fn missing_audio_is_bad_request() {
        let response = router(&["Piano"])
            .oneshot(multipart_request("/analyze", &[Part::text("metronome", "true")]))
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No audio file provided");
    }

    #[tokio::test]
    async fn report_counts_metronome_when_enabled() {
        let wav = silent_wav();
        let response = router(&["Piano", "Click", "Speech"])
            .oneshot(multipart_request(
                "/analyze",
                &[
                    Part::file("audio", "take.wav", &wav),
                    Part::text("metronome", "True"),
                ],
            ))
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["instrument_time"], 0.48);
        assert_eq!(json["metronome_time"], 0.48);
        assert_eq!(json["voice_time"], 0.48);
        assert_eq!(json["net_practice_time"], 0.48);
        assert_eq!(json["segments"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["segments"][1]["category"], "metronome");
    }

    #[tokio::test]
    async fn metronome_defaults_to_off() {
        let wav = silent_wav();
        let response = router(&["Piano", "Click", "Speech"])
            .oneshot(multipart_request("/analyze", &[Part::file("audio", "take.wav", &wav)]))
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["metronome_time"], 0.0);
        assert_eq!(json["noise_time"], 0.48);
    }

    #[tokio::test]
    async fn undecodable_audio_is_internal_error() {
        let response = router(&["Piano"])
            .oneshot(multipart_request(
                "/analyze",
                &[Part::file("audio", "take.wav", b"definitely not audio")],
            ))
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].is_string());
    }
}
