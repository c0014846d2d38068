use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use funding_matcher::catalog::{self, source_for_location, CatalogHandle, CatalogSource};
use funding_matcher::config::Config;
use funding_matcher::domain::FundingQuery;
use funding_matcher::engine::{self, CollectingObserver};
use funding_matcher::error::MatchError;
use funding_matcher::observability::{self, metrics};
use funding_matcher::server::{self, AppState};

#[derive(Parser)]
#[command(name = "funding_matcher")]
#[command(about = "Match applicants to government funding programs")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog file path or http(s) URL
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Maximum ranked results per query, 0 for no cap
    #[arg(long, global = true)]
    max_results: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        /// Prometheus exporter address, e.g. 127.0.0.1:9464
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
        /// Log the predicate breakdown of every query at debug level
        #[arg(long)]
        diagnostics: bool,
    },
    /// Load the catalog and report what was loaded, skipped and recovered
    Check,
    /// Run one query against the catalog and print the ranked programs as JSON
    Find(FindArgs),
}

#[derive(Args)]
struct FindArgs {
    /// Applicant state, or "bundesweit" for any
    #[arg(long)]
    state: String,
    #[arg(long)]
    company_size: String,
    /// Desired funding areas (repeat or comma-separate)
    #[arg(long = "area", required = true, value_delimiter = ',')]
    areas: Vec<String>,
    #[arg(long)]
    grant: i64,
    #[arg(long)]
    revenue: i64,
    /// Print the per-program predicate breakdown to stderr
    #[arg(long)]
    explain: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_env().context("invalid environment override")?;
    if let Some(location) = cli.catalog {
        config.catalog.location = location;
    }
    if let Some(max) = cli.max_results {
        config.matching.max_results = max;
    }

    match cli.command {
        Commands::Serve {
            host,
            port,
            metrics_addr,
            diagnostics,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if metrics_addr.is_some() {
                config.metrics.addr = metrics_addr;
            }
            config.matching.diagnostics |= diagnostics;
            serve(config).await
        }
        Commands::Check => {
            let _guard = observability::init_logging(None, false);
            check(&config).await
        }
        Commands::Find(args) => {
            let _guard = observability::init_logging(None, false);
            find(&config, args).await
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    let _guard = observability::init_logging(config.logging.dir.as_deref(), config.matching.diagnostics);

    if let Some(addr) = config.metrics.addr {
        if let Err(e) = metrics::init(addr) {
            warn!(error = %e, "Metrics exporter disabled");
        }
    }

    let source: Arc<dyn CatalogSource> = Arc::from(source_for_location(&config.catalog.location)?);
    let (catalog, _report) = catalog::load_catalog(source.as_ref())
        .await
        .with_context(|| format!("catalog unavailable at {}", config.catalog.location))?;
    info!(programs = catalog.len(), fingerprint = %catalog.fingerprint(), "Catalog ready");

    let state = AppState {
        catalog: CatalogHandle::new(catalog),
        source,
        options: config.matching.match_options(),
        diagnostics: config.matching.diagnostics,
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;

    server::start_server(state, addr, &config.server.cors_origins)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}

async fn check(config: &Config) -> Result<()> {
    let source = source_for_location(&config.catalog.location)?;
    let (catalog, report) = catalog::load_catalog(source.as_ref())
        .await
        .with_context(|| format!("catalog unavailable at {}", config.catalog.location))?;

    println!("📚 Catalog: {}", catalog.source());
    println!("   Fingerprint: {}", catalog.fingerprint());
    println!("   Records: {}", report.total_records);
    println!("   Loaded: {}", report.loaded);
    println!("   Recovered fields: {}", report.recovered_fields);
    println!("   Skipped: {}", report.skipped.len());
    for skipped in &report.skipped {
        let name = skipped.name.as_deref().unwrap_or("<unnamed>");
        println!("   - #{} {}: {}", skipped.index, name, skipped.reason);
    }
    Ok(())
}

async fn find(config: &Config, args: FindArgs) -> Result<()> {
    let source = source_for_location(&config.catalog.location)?;
    let (catalog, _report) = catalog::load_catalog(source.as_ref())
        .await
        .with_context(|| format!("catalog unavailable at {}", config.catalog.location))?;

    let query = FundingQuery::new(args.state, args.company_size, args.areas, args.grant, args.revenue)?;
    let options = config.matching.match_options();

    let observer = CollectingObserver::new();
    let outcome = engine::find_best_funding_observed(&catalog, &query, &options, &observer);

    if args.explain {
        for (name, breakdown) in observer.into_entries() {
            eprintln!(
                "{:<40} state={} size={} areas={} grant={} revenue={}",
                name,
                breakdown.region_match,
                breakdown.size_match,
                breakdown.area_match,
                breakdown.grant_match,
                breakdown.revenue_match
            );
        }
    }

    match outcome {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome.programs)?);
            Ok(())
        }
        Err(MatchError::NoMatchFound) => {
            eprintln!("No matching funding options found.");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
