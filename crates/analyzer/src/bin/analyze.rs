use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use etude_analyzer::{load_keywords, load_yamnet, AnalysisPipeline};
use etude_audio::FfmpegTranscoder;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Measure practice time in an audio recording", long_about = None)]
struct Cli {
    /// Path to the recording to analyze
    input: PathBuf,
    /// YAMNet ONNX model
    #[arg(long, env = "YAMNET_MODEL")]
    model: PathBuf,
    /// YAMNet class map CSV (index,mid,display_name)
    #[arg(long, env = "YAMNET_CLASS_MAP")]
    class_map: PathBuf,
    /// Keyword rules YAML; the built-in rules apply when omitted
    #[arg(long, env = "ETUDE_KEYWORDS")]
    keywords: Option<PathBuf>,
    /// Count click and tick sounds as a running metronome
    #[arg(long)]
    metronome: bool,
    /// ffmpeg binary for containers the built-in decoders cannot read
    #[arg(long, env = "FFMPEG_BIN")]
    ffmpeg: Option<PathBuf>,
    /// Print a short summary instead of the JSON report
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let keywords = load_keywords(cli.keywords.as_deref())?;
    let classifier = load_yamnet(&cli.model, &cli.class_map)?;
    let sample_rate = classifier.sample_rate();
    let mut pipeline = AnalysisPipeline::new(classifier, Arc::new(keywords));
    if let Some(ffmpeg) = cli.ffmpeg {
        pipeline = pipeline.with_transcoder(FfmpegTranscoder::new(ffmpeg, sample_rate));
    }

    let report = pipeline.analyze_file(&cli.input, cli.metronome)?;
    if cli.summary {
        println!("instrument practice: {:.2}s", report.net_practice_duration);
        println!("voice:               {:.2}s", report.durations.voice);
        println!("silence:             {:.2}s", report.durations.silence);
        println!("noise:               {:.2}s", report.durations.noise);
        println!("metronome:           {:.2}s", report.durations.metronome);
        println!("total:               {:.2}s", report.total_duration);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
