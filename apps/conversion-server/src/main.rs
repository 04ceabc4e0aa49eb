use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use etude_convert::{OmrRunner, PdfRasterizer, ScratchSpace, ToolCommand};
use etude_services::{conversion_router, init_tracing, serve, ConversionState, ServerConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert PDF scores to page images and MusicXML", long_about = None)]
struct Cli {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "ETUDE_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,
    /// OMR command line; may carry leading arguments such as `java -jar audiveris.jar`
    #[arg(long, env = "AUDIVERIS_BIN", default_value = "Audiveris")]
    audiveris: String,
    #[arg(long, env = "PDFTOPPM_BIN", default_value = "pdftoppm")]
    pdftoppm: String,
    #[arg(long, env = "OMR_TIMEOUT_SECS", default_value_t = 600)]
    omr_timeout_secs: u64,
    /// Deadline for rasterizing one PDF
    #[arg(long, env = "RASTER_TIMEOUT_SECS", default_value_t = 120)]
    raster_timeout_secs: u64,
    /// Parent directory for per-request working directories
    #[arg(long, env = "ETUDE_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,
    #[arg(long, env = "ETUDE_MAX_UPLOAD_MB", default_value_t = etude_services::DEFAULT_MAX_UPLOAD_MB)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let scratch = ScratchSpace::new(cli.scratch_dir.clone());
    let pdftoppm = ToolCommand::parse(&cli.pdftoppm).context("PDFTOPPM_BIN is empty")?;
    let audiveris = ToolCommand::parse(&cli.audiveris).context("AUDIVERIS_BIN is empty")?;
    let rasterizer = PdfRasterizer::new(pdftoppm, scratch.clone())
        .with_deadline(Duration::from_secs(cli.raster_timeout_secs));
    let omr = OmrRunner::new(audiveris, scratch)
        .with_deadline(Duration::from_secs(cli.omr_timeout_secs));
    info!(
        pdftoppm = %cli.pdftoppm,
        audiveris = %cli.audiveris,
        omr_timeout_secs = cli.omr_timeout_secs,
        scratch_dir = ?cli.scratch_dir,
        "starting conversion service"
    );

    let config = ServerConfig::new(cli.bind, cli.port, cli.max_upload_mb);
    serve(conversion_router(ConversionState::new(rasterizer, omr)), &config).await
}
