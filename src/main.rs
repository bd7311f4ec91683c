mod commands;

use anyhow::Context;
use beercellar::beer::{self, BeerSize};
use beercellar::{BeerCellar, CellarError, Interval, NameCache, UntappdClient, config};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cellar")]
#[command(author, version, about = "Keep the beer cellar in drink-by order", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Cellar directory (default: $BEERCELLAR_DIR or ~/.beer)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Cellar name (default: $BEERCELLAR_NAME or "prod")
    #[arg(long, global = true)]
    name: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add bottles to the cellar
    Add {
        /// Untappd beer id
        #[arg(long, allow_hyphen_values = true)]
        id: i64,

        /// Date to be drunk by, DD/MM/YY (default: today)
        #[arg(long, value_parser = parse_drink_date)]
        date: Option<NaiveDate>,

        /// Size of bottle (bomber or small)
        #[arg(long)]
        size: BeerSize,

        /// Days between bottles of a series
        #[arg(long, conflicts_with = "years")]
        days: Option<u32>,

        /// Years between bottles of a series
        #[arg(long)]
        years: Option<u32>,

        /// Number of bottles in the series
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// List the beers that are due
    List {
        /// Number of bombers to list
        #[arg(long, default_value_t = 2)]
        bombers: usize,

        /// Number of small beers to list
        #[arg(long, default_value_t = 4)]
        small: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print every box of the cellar
    Print,

    /// Remove one bottle of a beer
    Remove {
        /// Untappd beer id
        #[arg(long)]
        id: u32,
    },

    /// Remove beers checked in on Untappd since the last sync
    Sync {
        /// Untappd user name (default: $UNTAPPD_USER)
        #[arg(long)]
        user: Option<String>,
    },

    /// Store Untappd credentials with the cellar
    Untappd {
        #[arg(long)]
        key: String,

        #[arg(long)]
        secret: String,
    },

    /// Show the cellar version and location
    Version,

    /// Show free slots per bottle size
    Slots,
}

fn parse_drink_date(s: &str) -> Result<NaiveDate, String> {
    beer::parse_date(s).ok_or_else(|| format!("'{}' is not a DD/MM/YY date", s))
}

/// Load the cellar, warning when its metadata could not be trusted
fn open_cellar(name: &str, dir: &Path) -> anyhow::Result<BeerCellar> {
    let (cellar, issue) = BeerCellar::load_lenient(name, dir)
        .with_context(|| format!("Failed to load cellar '{}' from {}", name, dir.display()))?;

    match issue {
        None | Some(CellarError::MissingMetadata(_)) => {}
        Some(e) => eprintln!("{} {}", "⚠".yellow(), e),
    }

    Ok(cellar)
}

async fn run(
    command: Option<Commands>,
    cellar: &mut BeerCellar,
    client: &mut UntappdClient,
) -> anyhow::Result<()> {
    match command {
        Some(Commands::Add {
            id,
            date,
            size,
            days,
            years,
            count,
        }) => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let interval = days.map(Interval::Days).or(years.map(Interval::Years));
            commands::add(cellar, client, id, date, size, interval, count).await?;
        }
        Some(Commands::List {
            bombers,
            small,
            json,
        }) => {
            commands::list(cellar, client, bombers, small, json).await?;
        }
        Some(Commands::Print) => {
            commands::print_cellar(cellar, client).await;
        }
        Some(Commands::Remove { id }) => {
            commands::remove(cellar, client, id).await;
        }
        Some(Commands::Sync { .. }) => {
            commands::sync(cellar, client).await?;
        }
        Some(Commands::Untappd { .. }) => {}
        Some(Commands::Version) => {
            commands::version(cellar);
        }
        Some(Commands::Slots) | None => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let dir = cli.dir.unwrap_or_else(config::cellar_dir);
    let name = cli.name.unwrap_or_else(config::cellar_name);

    let mut cellar = open_cellar(&name, &dir)?;

    let cache_dir = config::name_cache_dir(&dir, &name);
    let cache = NameCache::load(&cache_dir).unwrap_or_else(|e| {
        tracing::warn!("Starting with an empty name cache: {}", e);
        NameCache::new()
    });

    if let Some(Commands::Untappd { key, secret }) = &cli.command {
        commands::untappd(&mut cellar, key, secret);
    }

    let credentials = config::resolve_credentials(cellar.credentials());
    let user = match &cli.command {
        Some(Commands::Sync { user: Some(user) }) => Some(user.clone()),
        _ => config::untappd_user(),
    };
    let mut client = UntappdClient::with_base_url(credentials, cache, config::api_base())?
        .with_user(user)
        .with_access_token(config::access_token());

    // Save even when the command fails so partial work is kept
    let outcome = run(cli.command, &mut cellar, &mut client).await;

    let saved = cellar.save();
    if let Err(e) = client.cache().save(&cache_dir) {
        tracing::warn!("Failed to save name cache: {}", e);
    }
    outcome?;
    saved.with_context(|| format!("Failed to save cellar to {}", dir.display()))?;

    commands::slots(&cellar);

    Ok(())
}
