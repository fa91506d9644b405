use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signal_engine::{
    generate_seeded_candles, generate_synthetic_candles, load_file, AggregationMethod, Analysis,
    Candle, ClassificationMode, EngineConfig, IndicatorSnapshot, SignalEngine, WeightMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Aggregation {
    Weighted,
    Majority,
}

#[derive(Parser, Debug)]
#[command(name = "signal-engine")]
#[command(version)]
#[command(about = "Technical indicator and weighted signal engine", long_about = None)]
struct Args {
    /// Candle file (CSV/JSON). If not provided, uses synthetic data.
    #[arg(short = 'f', long)]
    data_file: Option<PathBuf>,

    /// Symbol label for the report
    #[arg(short, long, default_value = "SYNTH")]
    symbol: String,

    /// Number of synthetic daily candles
    #[arg(short, long, default_value = "120")]
    days: usize,

    /// Initial price for synthetic data
    #[arg(long, default_value = "100.0")]
    initial_price: f64,

    /// Seed for reproducible synthetic data
    #[arg(long)]
    seed: Option<u64>,

    /// Engine configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Indicator weights (JSON object of name -> weight). Defaults to equal weights.
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Signal classification mode
    #[arg(short, long, value_enum, default_value = "current")]
    mode: ClassificationMode,

    /// Override the configured aggregation method
    #[arg(long, value_enum)]
    aggregation: Option<Aggregation>,

    /// RSI period override
    #[arg(long)]
    rsi_period: Option<usize>,

    /// RSI oversold threshold override
    #[arg(long)]
    rsi_oversold: Option<f64>,

    /// RSI overbought threshold override
    #[arg(long)]
    rsi_overbought: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    symbol: &'a str,
    weights: &'a WeightMap,
    analysis: &'a Analysis,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

fn build_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => read_json::<EngineConfig>(path)?,
        None => EngineConfig::default(),
    };

    if let Some(period) = args.rsi_period {
        config.indicators = config.indicators.with_rsi_period(period);
    }
    let oversold = args.rsi_oversold.unwrap_or(config.thresholds.rsi_oversold);
    let overbought = args.rsi_overbought.unwrap_or(config.thresholds.rsi_overbought);
    config = config.with_rsi_thresholds(oversold, overbought);

    if let Some(aggregation) = args.aggregation {
        config = config.with_aggregation(match aggregation {
            Aggregation::Weighted => AggregationMethod::WeightedScore,
            Aggregation::Majority => AggregationMethod::MajorityVote,
        });
    }

    Ok(config)
}

fn load_candles(args: &Args) -> Result<Vec<Candle>> {
    if let Some(path) = &args.data_file {
        info!(path = %path.display(), "loading candles");
        return Ok(load_file(path)?);
    }

    info!(
        days = args.days,
        initial_price = args.initial_price,
        seed = ?args.seed,
        "generating synthetic candles"
    );
    Ok(match args.seed {
        Some(seed) => generate_seeded_candles(args.days, args.initial_price, seed),
        None => generate_synthetic_candles(args.days, args.initial_price),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signal_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = build_config(&args)?;
    let engine = SignalEngine::new(config).context("invalid engine configuration")?;
    let weights = match &args.weights {
        Some(path) => read_json::<WeightMap>(path)?,
        None => WeightMap::equal(),
    };

    let candles = load_candles(&args)?;
    info!(bars = candles.len(), mode = args.mode.name(), "running analysis");

    let analysis = engine.analyze(&candles, Some(&weights), args.mode)?;

    match args.output {
        OutputFormat::Json => {
            let report = Report {
                symbol: &args.symbol,
                weights: &weights,
                analysis: &analysis,
            };
            let json = if args.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", json);
        }
        OutputFormat::Text => print_text_report(&args.symbol, &candles, &weights, &analysis),
    }

    Ok(())
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

fn describe(snapshot: &IndicatorSnapshot) -> String {
    match snapshot {
        IndicatorSnapshot::Sma { value }
        | IndicatorSnapshot::Ema { value }
        | IndicatorSnapshot::Rsi { value }
        | IndicatorSnapshot::Psar { value } => fmt_value(*value),
        IndicatorSnapshot::Stochastic { k, d } | IndicatorSnapshot::StochRsi { k, d } => {
            format!("%K {}  %D {}", fmt_value(*k), fmt_value(*d))
        }
        IndicatorSnapshot::Macd {
            macd,
            signal,
            histogram,
        } => format!(
            "macd {}  signal {}  hist {}",
            fmt_value(*macd),
            fmt_value(*signal),
            fmt_value(*histogram)
        ),
        IndicatorSnapshot::Bollinger {
            upper,
            middle,
            lower,
            percent_b,
            ..
        } => format!(
            "{} / {} / {}  %B {}",
            fmt_value(*upper),
            fmt_value(*middle),
            fmt_value(*lower),
            fmt_value(*percent_b)
        ),
    }
}

fn print_text_report(symbol: &str, candles: &[Candle], weights: &WeightMap, analysis: &Analysis) {
    let rule = "----------------------------------------------------------------";
    let first = candles.first().and_then(|c| c.datetime());
    let last = candles.last().and_then(|c| c.datetime());
    let period = match (first, last) {
        (Some(start), Some(end)) => format!(
            "{} to {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        ),
        _ => "-".to_string(),
    };

    println!();
    println!("================================================================");
    println!("  SIGNAL REPORT - {}", symbol);
    println!("================================================================");
    println!();
    println!("  Period: {}", period);
    println!("  Bars:   {}", analysis.bars);
    println!("  Mode:   {}", analysis.mode.name());
    println!();
    println!("{}", rule);
    println!("  INDICATORS (latest bar)");
    println!("{}", rule);
    for (id, snapshot) in &analysis.breakdown.values {
        println!("  {:<12} {}", id, describe(snapshot));
    }
    println!();
    println!("{}", rule);
    println!("  SIGNALS");
    println!("{}", rule);
    for (kind, signal) in &analysis.signals {
        let weight = weights
            .get(*kind)
            .map_or_else(|| "excluded".to_string(), |w| format!("w={:.2}", w));
        println!("  {:<12} {:<6} {}", kind.name(), format!("{:?}", signal).to_uppercase(), weight);
    }
    println!();
    println!("{}", rule);
    println!("  VERDICT");
    println!("{}", rule);
    println!("  Overall:     {:>12}", analysis.aggregate.overall_signal);
    println!("  Strength:    {:>12.3}", analysis.aggregate.strength);
    println!("  Final Score: {:>12.2}", analysis.aggregate.final_score);
    println!();
    println!("================================================================");
}
