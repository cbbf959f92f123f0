use analytics::RiskMetricsSnapshot;
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{AlignmentMode, Config, load_config_from};
use core_types::{DateWindow, RiskProfile};
use engine::{AnalyticsService, RiskEngine};
use monte_carlo::{SimulationMode, SimulationResult};
use optimizer::{AllocationScenario, OptimizationResult, SelectedScenario};
use position_store::PositionStore;
use std::path::PathBuf;
use std::sync::Arc;

mod fixture;

use fixture::PortfolioFixture;

/// The main entry point for the Vantage portfolio analytics application.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config_from(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };
    // The guard flushes file logs on drop, so it lives as long as `main`.
    let _log_guard = match configuration::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = ?e, "Command failed.");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Risk metrics, correlation, Monte Carlo projection and allocation optimization
/// for an investment portfolio.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the engine configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Path to the JSON portfolio file (holdings, price history, benchmark, rates).
    #[arg(long, default_value = "demos/portfolio.json")]
    portfolio: PathBuf,

    /// Valuation date. Defaults to the last benchmark observation.
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// First date of history to use (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date of history to use (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the portfolio's risk and performance metrics.
    Metrics,
    /// Compute the return correlation matrix of the held instruments.
    Correlation(CorrelationArgs),
    /// Project the portfolio value with a Monte Carlo simulation.
    Simulate(SimulateArgs),
    /// Rank candidate allocations for a risk profile.
    Optimize(OptimizeArgs),
}

#[derive(Parser)]
struct CorrelationArgs {
    /// Symbols to correlate. Defaults to every holding.
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Overrides the configured alignment of the return series.
    #[arg(long, value_enum)]
    alignment: Option<AlignmentMode>,
}

#[derive(Parser)]
struct SimulateArgs {
    /// Projection horizon in years.
    #[arg(long, default_value_t = 10)]
    horizon: u32,

    #[arg(long)]
    iterations: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Compound the expected return and the return one volatility either side instead of sampling paths.
    #[arg(long)]
    deterministic: bool,
}

#[derive(Parser)]
struct OptimizeArgs {
    /// "conservative", "moderate", "aggressive" or a maximum volatility such as 0.12.
    #[arg(long, default_value = "moderate")]
    profile: RiskProfile,

    /// JSON file with candidate allocations. Defaults to a grid over the held asset classes.
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// Also project the best allocation over this many years.
    #[arg(long)]
    project_years: Option<u32>,

    /// Number of ranked scenarios to print.
    #[arg(long, default_value_t = 10)]
    top: usize,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    if let Commands::Correlation(CorrelationArgs { alignment: Some(alignment), .. }) = &cli.command {
        config.correlation.alignment = *alignment;
    }

    let sources = PortfolioFixture::load(&cli.portfolio)?.into_sources()?;
    let as_of = cli
        .as_of
        .or(sources.last_date)
        .context("No --as-of date given and the benchmark series is empty")?;
    let window = DateWindow::new(cli.from, cli.to)?;
    tracing::info!(%as_of, ?window, "Portfolio loaded.");

    let engine = Arc::new(RiskEngine::new(
        config,
        sources.store.clone(),
        sources.benchmark,
        sources.rates,
    ));
    let service = AnalyticsService::new(engine.clone());

    match cli.command {
        Commands::Metrics => {
            let metrics = service.compute_metrics(as_of, window).await?;
            print_metrics(&metrics);
        }
        Commands::Correlation(args) => {
            let symbols = if args.symbols.is_empty() {
                sources.store.symbols()?
            } else {
                args.symbols
            };
            let matrix = service.compute_correlation(symbols, window).await?;

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            let mut header = vec![String::new()];
            header.extend(matrix.symbols().iter().cloned());
            table.set_header(header);
            for (i, symbol) in matrix.symbols().iter().enumerate() {
                let mut row = vec![symbol.clone()];
                row.extend(matrix.cells()[i].iter().map(|c| fmt_opt(*c, 3)));
                table.add_row(row);
            }
            println!("{table}");
            for (a, b) in matrix.undefined_pairs() {
                println!("Correlation of {a} and {b} is undefined (flat or too little overlapping history).");
            }
        }
        Commands::Simulate(args) => {
            let metrics = service.compute_metrics(as_of, window).await?;
            let mut sim = engine.simulation_from_metrics(&metrics, args.horizon);
            if let Some(iterations) = args.iterations {
                sim = sim.with_iterations(iterations);
            }
            if let Some(seed) = args.seed {
                sim = sim.with_seed(seed);
            }
            if args.deterministic {
                sim = sim.with_mode(SimulationMode::Deterministic);
            }
            let result = service.run_simulation(sim).await?;
            print_simulation(&result);
        }
        Commands::Optimize(args) => {
            let candidates: Option<Vec<AllocationScenario>> = match &args.candidates {
                Some(path) => {
                    let raw = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read candidates file {}", path.display()))?;
                    let parsed = serde_json::from_str(&raw)
                        .with_context(|| format!("Failed to parse candidates file {}", path.display()))?;
                    Some(parsed)
                }
                None => None,
            };

            let run = service
                .optimize_portfolio(candidates, args.profile, as_of, window)
                .await?;
            print_optimization(&run.result, args.top);

            if let (Some(best), Some(report)) = (run.result.best(), &run.improvement) {
                println!(
                    "Against the current allocation ({}): return {:+.2}%, volatility {:+.2}%, Sharpe {}",
                    AllocationScenario::label(&run.current.scenario.weights),
                    report.return_change * 100.0,
                    report.volatility_change * 100.0,
                    fmt_opt(report.sharpe_change, 3),
                );

                if let Some(years) = args.project_years {
                    let metrics = service.compute_metrics(as_of, window).await?;
                    let selected = SelectedScenario::from(best);
                    let sim = engine.simulation_from_scenario(&selected, metrics.portfolio_value, years);
                    let projection = service.run_simulation(sim).await?;
                    println!("Projection of {}:", selected.name);
                    print_simulation(&projection);
                }
            }
        }
    }
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.decimals$}"))
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn print_metrics(m: &RiskMetricsSnapshot) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    let rows = [
        ("As of", m.as_of.to_string()),
        ("Portfolio value", format!("{:.2}", m.portfolio_value)),
        ("Frequency / periods", format!("{:?} / {}", m.frequency, m.periods)),
        ("Total return", pct(m.total_return)),
        ("Annualized return", pct(m.annualized_return)),
        ("Benchmark annualized return", pct(m.benchmark_annualized_return)),
        ("Volatility", pct(m.volatility)),
        ("Downside deviation", pct(m.downside_deviation)),
        ("Sharpe ratio", fmt_opt(m.sharpe_ratio, 3)),
        ("Sortino ratio", fmt_opt(m.sortino_ratio, 3)),
        ("Beta", fmt_opt(m.beta, 3)),
        ("Alpha", fmt_opt(m.alpha.map(|a| a * 100.0), 2)),
        ("Tracking error", pct(m.tracking_error)),
        ("Information ratio", fmt_opt(m.information_ratio, 3)),
        ("VaR 95%", format!("{:.2} ({})", m.var_95, pct(m.var_95_pct))),
        ("CVaR 95%", format!("{:.2} ({})", m.cvar_95, pct(m.cvar_95_pct))),
        ("Max drawdown", pct(m.max_drawdown)),
        ("Calmar ratio", fmt_opt(m.calmar_ratio, 3)),
    ];
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    println!("{table}");
}

fn print_simulation(result: &SimulationResult) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut header = vec!["Year".to_string()];
    header.extend(result.paths.iter().map(|p| format!("P{}", p.percentile)));
    table.set_header(header);
    for year in result.years() {
        let mut row = vec![year.to_string()];
        row.extend(result.paths.iter().map(|p| format!("{:.2}", p.values[year as usize])));
        table.add_row(row);
    }
    println!("{table}");
    println!(
        "Expected terminal value {:.2}, median {:.2}, probability of loss {}",
        result.summary.expected_terminal_value,
        result.summary.median_terminal_value,
        result.summary.probability_of_loss.map_or_else(|| "n/a".to_string(), pct),
    );
}

fn print_optimization(result: &OptimizationResult, top: usize) {
    println!(
        "Risk profile {} (max volatility {})",
        result.risk_profile,
        pct(result.max_volatility)
    );
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Rank", "Scenario", "Return", "Volatility", "Sharpe", "Max DD"]);
    for r in result.ranked.iter().take(top) {
        let e = &r.evaluated;
        table.add_row(vec![
            r.rank.to_string(),
            e.name().to_string(),
            pct(e.expected_return),
            pct(e.volatility),
            fmt_opt(e.sharpe_ratio, 3),
            e.max_drawdown.map_or_else(|| "n/a".to_string(), pct),
        ]);
    }
    println!("{table}");
    println!("{} candidates excluded by the risk profile.", result.excluded.len());

    if let Some(o) = &result.optimized {
        println!(
            "Local search from {} reached {} (Sharpe {}) in {} iterations{}.",
            o.started_from,
            o.scenario.name(),
            fmt_opt(o.scenario.sharpe_ratio, 3),
            o.iterations,
            if o.converged { "" } else { ", without converging" }
        );
    }
    for warning in &result.warnings {
        println!("Warning: {warning:?}");
    }
}
