use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use etude_analyzer::{load_keywords, load_yamnet, AnalysisPipeline};
use etude_audio::FfmpegTranscoder;
use etude_services::{analysis_router, init_tracing, serve, AnalysisState, ServerConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Measure practice time in uploaded recordings", long_about = None)]
struct Cli {
    #[arg(long, env = "PORT", default_value_t = 5001)]
    port: u16,
    #[arg(long, env = "ETUDE_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,
    /// YAMNet ONNX model
    #[arg(long, env = "YAMNET_MODEL")]
    model: PathBuf,
    /// YAMNet class map CSV (index,mid,display_name)
    #[arg(long, env = "YAMNET_CLASS_MAP")]
    class_map: PathBuf,
    /// Keyword rules YAML; the built-in rules apply when omitted
    #[arg(long, env = "ETUDE_KEYWORDS")]
    keywords: Option<PathBuf>,
    /// ffmpeg binary for WebM, Opus and other containers
    #[arg(long, env = "FFMPEG_BIN", default_value = "ffmpeg")]
    ffmpeg: PathBuf,
    #[arg(long, env = "ETUDE_MAX_UPLOAD_MB", default_value_t = etude_services::DEFAULT_MAX_UPLOAD_MB)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let keywords = load_keywords(cli.keywords.as_deref())?;
    let classifier = load_yamnet(&cli.model, &cli.class_map)?;
    info!(model = classifier.name(), classes = classifier.class_names().len(), "model loaded");
    let transcoder = FfmpegTranscoder::new(cli.ffmpeg, classifier.sample_rate());
    let pipeline = AnalysisPipeline::new(classifier, Arc::new(keywords)).with_transcoder(transcoder);

    let config = ServerConfig::new(cli.bind, cli.port, cli.max_upload_mb);
    serve(analysis_router(AnalysisState::new(Arc::new(pipeline))), &config).await
}
