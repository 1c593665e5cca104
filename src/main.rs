use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pricebook::config::{default_config_path, DisplayConfig, ResolvedConfig};
use pricebook::credentials::LayeredCredentialStore;
use pricebook::duration::{format_duration, parse_duration};
use pricebook::format::{format_amount, format_currency};
use pricebook::market_data::{PortfolioValuator, PriceResolverBuilder, ValuationReport, USD};
use pricebook::portfolio::Portfolio;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pricebook")]
#[command(about = "Value a portfolio from live price feeds")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Per-request timeout, overriding `[http] timeout` (e.g. "3s")
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg, global = true)]
    timeout: Option<Duration>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Value the whole portfolio (default)
    Value,
    /// Resolve a single symbol
    Price {
        symbol: String,
        /// crypto, us-stock, us-etf, tw-stock or tw-etf
        #[arg(short = 't', long)]
        category: String,
    },
    /// Show current configuration
    Config,
}

fn parse_duration_arg(s: &str) -> std::result::Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let mut config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load pricebook config: {}", cli.config.display()))?;

    if let Some(timeout) = cli.timeout {
        config.http.timeout = timeout;
    }

    match cli.command.unwrap_or(Command::Value) {
        Command::Config => print_config(&cli.config, &config),
        Command::Price { symbol, category } => {
            let resolver = build_resolver(&config).await?;
            let quote = resolver.resolve_named(&symbol, &category).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                let display = usd_display(&config.display);
                let symbol = symbol.trim().to_uppercase();
                match quote {
                    Some(quote) => println!(
                        "{symbol}: {} ({})",
                        format_currency(quote.price, &display),
                        quote.source
                    ),
                    None => println!("{symbol}: (no price)"),
                }
            }
        }
        Command::Value => {
            let portfolio = Portfolio::load(&config.portfolio_path)?;
            let resolver = build_resolver(&config).await?;
            let report = PortfolioValuator::new(resolver.into())
                .with_reporting_currency(&config.reporting_currency)
                .value(&portfolio)
                .await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, &config.display);
            }
        }
    }

    Ok(())
}

async fn build_resolver(config: &ResolvedConfig) -> Result<pricebook::market_data::PriceResolver> {
    let credentials = LayeredCredentialStore::for_data_dir(&config.data_dir)?;
    Ok(PriceResolverBuilder::from_config(config)
        .build(&credentials)
        .await)
}

/// USD amounts get a "$" unless another symbol is configured.
fn usd_display(display: &DisplayConfig) -> DisplayConfig {
    let mut display = display.clone();
    display.currency_symbol.get_or_insert_with(|| "$".to_string());
    display
}

fn print_report(report: &ValuationReport, display: &DisplayConfig) {
    let usd = usd_display(display);

    for line in &report.holdings {
        let amount = format_amount(line.amount);
        match line.price {
            Some(price) => println!(
                "{}: {amount} x {}",
                line.symbol,
                format_currency(price, &usd)
            ),
            None => println!("{}: {amount} x (no price)", line.symbol),
        }
    }

    for line in &report.cash {
        let amount = format_amount(line.amount);
        match line.value {
            Some(value) => println!(
                "{}: {amount} = {}",
                line.currency,
                format_currency(value, &usd)
            ),
            None => println!("{}: {amount} (no exchange rate)", line.currency),
        }
    }

    println!("Total: {}", format_currency(report.total_usd, &usd));
    if report.reporting_currency != USD {
        let mut local = display.clone();
        local.currency_symbol = None;
        match report.reporting_total {
            Some(total) => println!(
                "Total ({}): {}",
                report.reporting_currency,
                format_currency(total, &local)
            ),
            None => println!("Total ({}): (no exchange rate)", report.reporting_currency),
        }
    }
    if report.missing > 0 {
        println!("({} line(s) without a price are excluded)", report.missing);
    }
}

fn print_config(config_path: &std::path::Path, config: &ResolvedConfig) {
    println!("Config file: {}", config_path.display());
    println!("Data directory: {}", config.data_dir.display());
    println!("Portfolio: {}", config.portfolio_path.display());
    println!("API keys: {}", config.api_key_path.display());
    println!("Reporting currency: {}", config.reporting_currency);
    println!("HTTP timeout: {}", format_duration(config.http.timeout));
    match config.feed_cache.ttl {
        Some(ttl) => println!("Feed cache TTL: {}", format_duration(ttl)),
        None => println!("Feed cache TTL: none"),
    }
}
