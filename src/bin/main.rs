//! CLI tool for device year class (devyear)

use clap::Parser;
use colored::Colorize;

use yearclass::{classify, CombinationStrategy, RawMetrics, SysfsProbe, YearClass};

#[derive(Parser)]
#[command(name = "devyear")]
#[command(about = "Estimate this machine's performance year class from CPU and RAM signals", long_about = None)]
#[command(version)]
struct Cli {
    /// Combination strategy (median, average, or ram-primary)
    #[arg(short, long, default_value = "ram-primary")]
    strategy: CombinationStrategy,

    /// Output format (json or text)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Print the raw probed signals alongside the result
    #[arg(short, long)]
    raw: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let probe = SysfsProbe::new();
    let metrics = RawMetrics::capture(&probe);
    let year = classify(&metrics, cli.strategy);

    match cli.format.as_str() {
        "json" => print_json(&metrics, cli.strategy, year),
        _ => print_text(&metrics, cli.strategy, year, cli.raw),
    }
}

fn print_json(metrics: &RawMetrics, strategy: CombinationStrategy, year: YearClass) {
    let out = serde_json::json!({
        "strategy": strategy.to_string(),
        "year_class": year.year(),
        "metrics": metrics,
    });
    println!("{}", serde_json::to_string_pretty(&out).unwrap());
}

fn print_text(metrics: &RawMetrics, strategy: CombinationStrategy, year: YearClass, raw: bool) {
    let rendered = match year.year() {
        Some(y) => y.to_string().green().bold(),
        None => "unknown".yellow().bold(),
    };
    println!("Year class: {} (strategy: {})", rendered, strategy);

    if raw {
        println!("  cores:     {}", render(metrics.cores, ""));
        println!("  max clock: {}", render(metrics.max_clock_khz, " kHz"));
        println!("  total RAM: {}", render(metrics.total_ram_bytes, " bytes"));
    }
}

fn render<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, unit),
        None => "unknown".to_string(),
    }
}
