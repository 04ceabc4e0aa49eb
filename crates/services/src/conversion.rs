//! Routes of the PDF score conversion service.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tracing::info;

use etude_convert::raster::{DEFAULT_DPI, DEFAULT_MAX_PAGES};
use etude_convert::{OmrRunner, PdfRasterizer, RasterOptions};

use crate::error::ApiError;
use crate::upload::UploadForm;

pub const SERVICE_NAME: &str = "pdf-to-image-and-musicxml";

#[derive(Clone)]
pub struct ConversionState {
    rasterizer: Arc<PdfRasterizer>,
    omr: Arc<OmrRunner>,
}

impl ConversionState {
    pub fn new(rasterizer: PdfRasterizer, omr: OmrRunner) -> Self {
        Self {
            rasterizer: Arc::new(rasterizer),
            omr: Arc::new(omr),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub images: Vec<String>,
    pub page_count: usize,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct MusicXmlResponse {
    pub musicxml: String,
    pub filename: String,
}

pub fn conversion_router(state: ConversionState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/convert-to-images", post(convert_to_images))
        .route("/convert-to-musicxml", post(convert_to_musicxml))
        .with_state(state)
}

async fn root() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "ok",
        service: Some(SERVICE_NAME),
    })
}

async fn health() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "ok",
        service: None,
    })
}

async fn convert_to_images(
    State(state): State<ConversionState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImagesResponse>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_named_file("file")?;
    let options = RasterOptions {
        dpi: form.parse_field("dpi", DEFAULT_DPI)?,
        max_pages: form.parse_field("max_pages", DEFAULT_MAX_PAGES)?,
    };
    info!(filename = %file.filename, bytes = file.bytes.len(), ?options, "converting pdf to images");

    let pages = state
        .rasterizer
        .rasterize(&file.bytes, options)
        .await
        .map_err(ApiError::from_raster)?;
    let images: Vec<String> = pages.iter().map(|page| page.to_data_url()).collect();
    Ok(Json(ImagesResponse {
        page_count: images.len(),
        images,
        filename: file.filename,
    }))
}

async fn convert_to_musicxml(
    State(state): State<ConversionState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MusicXmlResponse>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_named_file("file")?;
    info!(filename = %file.filename, bytes = file.bytes.len(), "converting pdf to musicxml");

    let musicxml = state
        .omr
        .recognize(&file.bytes)
        .await
        .map_err(ApiError::from_omr)?;
    Ok(Json(MusicXmlResponse {
        musicxml,
        filename: file.filename,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{multipart_request, response_json, Part};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use etude_convert::{ScratchSpace, ToolCommand};
    use std::path::Path;
    use std::time::Duration;
    use tower::ServiceExt;

    fn router_with(
        raster: ToolCommand,
        omr: ToolCommand,
        scratch: &Path,
        deadline: Duration,
    ) -> Router {
        let scratch = ScratchSpace::new(Some(scratch.to_path_buf()));
        let rasterizer = PdfRasterizer::new(raster, scratch.clone()).with_deadline(deadline);
        let omr = OmrRunner::new(omr, scratch).with_deadline(deadline);
        conversion_router(ConversionState::new(rasterizer, omr))
    }

    fn unused_tools(scratch: &Path) -> Router {
        router_with(
            ToolCommand::new("/nonexistent/pdftoppm"),
            ToolCommand::new("/nonexistent/audiveris"),
            scratch,
            Duration::from_secs(10),
        )
    }

    fn scratch_is_empty(scratch: &Path) -> bool {
        std::fs::read_dir(scratch).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn root_and_health_report_ok() {
        let scratch = tempfile::tempdir().unwrap();
        let router = unused_tools(scratch.path());

        let root = router
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, json) = response_json(root).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["service"], SERVICE_NAME);

        let health = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, json) = response_json(health).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn missing_file_is_bad_request_on_both_routes() {
        let scratch = tempfile::tempdir().unwrap();
        for uri in ["/convert-to-images", "/convert-to-musicxml"] {
            let response = unused_tools(scratch.path())
                .oneshot(multipart_request(uri, &[Part::text("dpi", "100")]))
                .await
                .unwrap();
            let (status, json) = response_json(response).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(json["error"].is_string());
        }
        assert!(scratch_is_empty(scratch.path()));
    }

    #[tokio::test]
    async fn non_multipart_body_is_bad_request() {
        let scratch = tempfile::tempdir().unwrap();
        let response = unused_tools(scratch.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/convert-to-musicxml")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn unnamed_file_is_bad_request() {
        let scratch = tempfile::tempdir().unwrap();
        let response = unused_tools(scratch.path())
            .oneshot(multipart_request(
                "/convert-to-images",
                &[Part::file("file", "", b"%PDF")],
            ))
            .await
            .unwrap();
        let (status, _) = response_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(scratch_is_empty(scratch.path()));
    }

    #[tokio::test]
    async fn invalid_dpi_is_bad_request() {
        let scratch = tempfile::tempdir().unwrap();
        for dpi in ["abc", "0"] {
            let response = unused_tools(scratch.path())
                .oneshot(multipart_request(
                    "/convert-to-images",
                    &[Part::file("file", "score.pdf", b"%PDF"), Part::text("dpi", dpi)],
                ))
                .await
                .unwrap();
            let (status, _) = response_json(response).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "dpi={dpi}");
        }
    }

    #[cfg(unix)]
    mod with_fake_tools {
        use super::*;

        fn script(dir: &Path, name: &str, body: &str) -> ToolCommand {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            ToolCommand::new("sh").with_prefix_args([path])
        }

        #[tokio::test]
        async fn images_are_data_urls_in_page_order() {
            let tools = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let raster = script(
                tools.path(),
                "pdftoppm.sh",
                "for last; do :; done\nprintf b > \"$last-2.png\"\nprintf a > \"$last-1.png\"\n",
            );
            let router = router_with(
                raster,
                ToolCommand::new("/nonexistent"),
                scratch.path(),
                Duration::from_secs(10),
            );

            let response = router
                .oneshot(multipart_request(
                    "/convert-to-images",
                    &[Part::file("file", "etude.pdf", b"%PDF-1.4")],
                ))
                .await
                .unwrap();
            let (status, json) = response_json(response).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["page_count"], 2);
            assert_eq!(json["filename"], "etude.pdf");
            assert_eq!(json["images"][0], "data:image/png;base64,YQ==");
            assert_eq!(json["images"][1], "data:image/png;base64,Yg==");
            assert!(scratch_is_empty(scratch.path()));
        }

        #[tokio::test]
        async fn rasterizer_timeout_is_gateway_timeout() {
            let tools = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let raster = script(tools.path(), "pdftoppm.sh", "exec sleep 30\n");
            let router = router_with(
                raster,
                ToolCommand::new("/nonexistent"),
                scratch.path(),
                Duration::from_millis(300),
            );

            let response = router
                .oneshot(multipart_request(
                    "/convert-to-images",
                    &[Part::file("file", "etude.pdf", b"%PDF")],
                ))
                .await
                .unwrap();
            let (status, json) = response_json(response).await;
            assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
            assert!(json["error"].is_string());
            assert!(scratch_is_empty(scratch.path()));
        }

        #[tokio::test]
        async fn omr_timeout_is_gateway_timeout() {
            let tools = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let omr = script(tools.path(), "audiveris.sh", "exec sleep 30\n");
            let router = router_with(
                ToolCommand::new("/nonexistent"),
                omr,
                scratch.path(),
                Duration::from_millis(300),
            );

            let response = router
                .oneshot(multipart_request(
                    "/convert-to-musicxml",
                    &[Part::file("file", "etude.pdf", b"%PDF")],
                ))
                .await
                .unwrap();
            let (status, _) = response_json(response).await;
            assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
            assert!(scratch_is_empty(scratch.path()));
        }

        #[tokio::test]
        async fn omr_without_output_returns_stderr() {
            let tools = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let omr = script(tools.path(), "audiveris.sh", "echo 'bad sheet' >&2\n");
            let router = router_with(
                ToolCommand::new("/nonexistent"),
                omr,
                scratch.path(),
                Duration::from_secs(10),
            );

            let response = router
                .oneshot(multipart_request(
                    "/convert-to-musicxml",
                    &[Part::file("file", "etude.pdf", b"%PDF")],
                ))
                .await
                .unwrap();
            let (status, json) = response_json(response).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(json["stderr"], "bad sheet\n");
        }

        #[tokio::test]
        async fn omr_returns_plain_musicxml() {
            let tools = tempfile::tempdir().unwrap();
            let scratch = tempfile::tempdir().unwrap();
            let omr = script(
                tools.path(),
                "audiveris.sh",
                "printf '<score-partwise/>' > \"$4/etude.xml\"\n",
            );
            let router = router_with(
                ToolCommand::new("/nonexistent"),
                omr,
                scratch.path(),
                Duration::from_secs(10),
            );

            let response = router
                .oneshot(multipart_request(
                    "/convert-to-musicxml",
                    &[Part::file("file", "etude.pdf", b"%PDF")],
                ))
                .await
                .unwrap();
            let (status, json) = response_json(response).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["musicxml"], "<score-partwise/>");
            assert_eq!(json["filename"], "etude.pdf");
        }
    }
}
