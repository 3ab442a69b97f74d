//! Runs one weekly analysis over seeded sample posts (or a JSON dump) and
//! prints the summary.
//!
//! ```text
//! weekly_demo [--seed-config] [--input posts.json] [--out summary.json] [--metrics]
//! ```
//! Without `--seed-config` the config is resolved like the library does
//! ($SUBREDDIT_ANALYSIS_CONFIG, then config/analysis.{toml,json}).

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use subreddit_pulse::export::{JsonFileSink, MemorySink};
use subreddit_pulse::ingest::{JsonFileSource, PostSource, StaticSource};
use subreddit_pulse::logging::init_tracing;
use subreddit_pulse::metrics::Metrics;
use subreddit_pulse::sample::SampleGenerator;
use subreddit_pulse::{load_config_default, run_weekly, AnalysisConfig, ReportSummarizer};

#[derive(Default)]
struct Args {
    seed_config: bool,
    input: Option<String>,
    out: Option<String>,
    metrics: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--seed-config" => args.seed_config = true,
            "--metrics" => args.metrics = true,
            "--input" => args.input = Some(it.next().context("--input needs a path")?),
            "--out" => args.out = Some(it.next().context("--out needs a path")?),
            other => bail!("unknown argument `{other}`"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; PULSE_LOG / RUST_LOG / SUBREDDIT_ANALYSIS_CONFIG may live there.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = parse_args()?;
    let metrics = if args.metrics {
        Some(Metrics::init()?)
    } else {
        None
    };

    let config = if args.seed_config {
        AnalysisConfig::seed()
    } else {
        load_config_default()?
    };
    let mut summarizer = ReportSummarizer::new(config)?;

    let source: Box<dyn PostSource> = match &args.input {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => {
            let end = Utc
                .with_ymd_and_hms(2025, 10, 12, 20, 0, 0)
                .single()
                .context("anchor date")?;
            Box::new(StaticSource::new(SampleGenerator::new(326).weekly_posts(end)))
        }
    };

    let summary = match &args.out {
        Some(path) => {
            let sink = JsonFileSink::new(path);
            run_weekly(&mut summarizer, source.as_ref(), &sink).await?
        }
        None => run_weekly(&mut summarizer, source.as_ref(), &MemorySink::new()).await?,
    };

    println!("{}", summary.to_json()?);
    if let Some(m) = metrics {
        println!("\n{}", m.render());
    }
    Ok(())
}
