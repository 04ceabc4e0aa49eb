use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use etude_audio::ClassMap;
use etude_domain::{KeywordTable, SoundCategory};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "List the practice category every class of a class map resolves to"
)]
struct Args {
    /// YAMNet class map CSV (index,mid,display_name)
    class_map: PathBuf,
    /// Keyword rules YAML; the built-in rules apply when omitted
    #[arg(long, env = "ETUDE_KEYWORDS")]
    keywords: Option<PathBuf>,
    /// Only list classes resolving to this category (with the metronome on)
    #[arg(long)]
    category: Option<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ClassResolution<'a> {
    index: usize,
    class: &'a str,
    with_metronome: SoundCategory,
    without_metronome: SoundCategory,
}

fn parse_category(raw: &str) -> Result<SoundCategory> {
    SoundCategory::ALL
        .into_iter()
        .find(|category| category.as_str().eq_ignore_ascii_case(raw))
        .with_context(|| format!("unknown category {raw:?}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let table = match &args.keywords {
        Some(path) => KeywordTable::from_path(path)
            .with_context(|| format!("load keyword rules {:?}", path))?,
        None => KeywordTable::default(),
    };
    let class_map = ClassMap::from_path(&args.class_map)?;
    let filter = args.category.as_deref().map(parse_category).transpose()?;
    info!(classes = class_map.len(), rules = table.rules().len(), "auditing class map");

    let names = class_map.names();
    let resolutions: Vec<ClassResolution<'_>> = names
        .iter()
        .enumerate()
        .map(|(index, class)| ClassResolution {
            index,
            class,
            with_metronome: table.classify(class, true),
            without_metronome: table.classify(class, false),
        })
        .filter(|row| filter.map_or(true, |wanted| row.with_metronome == wanted))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolutions)?);
        return Ok(());
    }

    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for row in &resolutions {
        println!(
            "{:>4}  {:<48} {:<10} {}",
            row.index,
            row.class,
            row.with_metronome.as_str(),
            row.without_metronome.as_str()
        );
        *totals.entry(row.with_metronome.as_str()).or_default() += 1;
    }
    println!();
    for (category, count) in totals {
        println!("{category:<10} {count}");
    }
    Ok(())
}
