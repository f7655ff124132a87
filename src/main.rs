use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use dealwatch::gateway::{HttpGateway, MemoryWatchStore};
use dealwatch::models::{NewWatchEntry, Source, WatchlistEntry};
use dealwatch::price_stats::compute_stats;
use dealwatch::search::search_sources;
use dealwatch::{AppConfig, LoadMore, SearchEngine, SessionSnapshot, WatchlistManager};

#[derive(Parser)]
#[command(name = "dealwatch", version, about = "Marketplace search aggregation and price watchlist engine")]
struct Cli {
    /// Session file owned by this CLI (search state + watchlist entries)
    #[arg(long, global = true, default_value = "dealwatch-session.json")]
    session: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a marketplace and print the merged, deduplicated results
    Search {
        keyword: String,
        #[arg(long, default_value = "NAVER")]
        source: String,
        /// Continue the previous session with the next page instead of
        /// starting over
        #[arg(long)]
        more: bool,
    },
    /// Fetch a comparison batch with the backend's price aggregate
    Compare {
        keyword: String,
        #[arg(long, default_value = "NAVER")]
        source: String,
    },
    /// Manage the watchlist
    Watch {
        #[command(subcommand)]
        action: WatchAction,
    },
    /// Print price history and trend statistics for a tracked product
    History {
        product_id: String,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Trigger the backend's price check job
    Check,
}

#[derive(Subcommand)]
enum WatchAction {
    /// Stage a product as a temporary watch entry
    Add {
        name: String,
        #[arg(long, default_value = "#")]
        url: String,
        #[arg(long)]
        price: i64,
        #[arg(long, default_value = "NAVER")]
        source: String,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        target: Option<i64>,
    },
    /// List temporary entries, or activated entries for an email
    List {
        #[arg(long)]
        email: Option<String>,
    },
    /// Bind every temporary entry to an email and start tracking
    Activate { email: String },
    /// Remove an entry (activated entries require --email)
    Remove {
        id: String,
        #[arg(long)]
        email: Option<String>,
    },
}

/// Everything the CLI persists between invocations. The engine treats
/// session state as caller-owned; this file is the CLI's ownership.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    search: Option<SessionSnapshot>,
    watchlist: Vec<WatchlistEntry>,
}

fn load_session(path: &Path) -> Result<SessionFile> {
    if !path.exists() {
        return Ok(SessionFile::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading session file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing session file {}", path.display()))
}

fn save_session(path: &Path, session: &SessionFile) -> Result<()> {
    let raw = serde_json::to_string_pretty(session)?;
    std::fs::write(path, raw)
        .with_context(|| format!("writing session file {}", path.display()))
}

fn parse_source(raw: &str) -> Result<Source> {
    raw.parse::<Source>().map_err(|e| anyhow::anyhow!(e))
}

fn print_records(snapshot: &SessionSnapshot) {
    println!(
        "{} results for \"{}\" on {} (page {}/{}, more: {})",
        snapshot.records.len(),
        snapshot.keyword,
        snapshot.source,
        snapshot.cursor.current_page,
        snapshot.cursor.total_pages,
        snapshot.cursor.has_next
    );
    for record in &snapshot.records {
        println!(
            "  {:>10}  {}  [{}]",
            record.price,
            record.name,
            record.brand.as_deref().unwrap_or("-")
        );
    }
}

fn print_entries(entries: &[WatchlistEntry]) {
    for entry in entries {
        println!(
            "  {}  {:>10}  {}  ({}, target {})",
            entry.id,
            entry.current_price,
            entry.product_name,
            entry.source,
            entry
                .target_price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dealwatch=info".parse()?),
        )
        .init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let gateway = HttpGateway::new(
        Url::parse(&config.gateway.base_url)?,
        Duration::from_secs(config.gateway.request_timeout),
    )?;

    let mut session = load_session(&cli.session)?;

    match cli.command {
        Command::Search { keyword, source, more } => {
            if source.eq_ignore_ascii_case("all") && !more {
                let sources = [Source::Ssg, Source::Naver, Source::EleventhStreet];
                let results =
                    search_sources(&gateway, &sources, &keyword, config.search.page_size).await;
                for (source, result) in results {
                    match result {
                        Ok(snapshot) => print_records(&snapshot),
                        Err(err) => println!("{}: {}", source, err),
                    }
                }
                return Ok(());
            }

            let engine = SearchEngine::new(gateway, config.search.page_size);
            let snapshot = if more {
                let previous = session
                    .search
                    .take()
                    .context("no previous search session to continue; run `search` first")?;
                engine.restore(previous).await;
                match engine.load_more().await? {
                    LoadMore::Appended { appended, snapshot } => {
                        info!(appended, "loaded next page");
                        snapshot
                    }
                    LoadMore::Coalesced { snapshot } | LoadMore::Exhausted { snapshot } => snapshot,
                    LoadMore::Superseded => anyhow::bail!("session changed mid-fetch"),
                }
            } else {
                engine.search(parse_source(&source)?, &keyword).await?
            };

            print_records(&snapshot);
            session.search = Some(snapshot);
            save_session(&cli.session, &session)?;
        }

        Command::Compare { keyword, source } => {
            let engine = SearchEngine::new(gateway, config.search.page_size);
            let summary = engine
                .compare(parse_source(&source)?, &keyword, config.search.compare_limit)
                .await?;

            println!("{} comparable listings for \"{}\"", summary.records.len(), keyword);
            if let Some(stats) = summary.price_stats {
                println!(
                    "  min {}  max {}  avg {}",
                    stats.min_price, stats.max_price, stats.avg_price
                );
            }
        }

        Command::Watch { action } => {
            let store = MemoryWatchStore::with_entries(std::mem::take(&mut session.watchlist));
            let manager = WatchlistManager::new(
                store.clone(),
                config.watchlist.max_activated,
                config.watchlist.target_price_percent,
            );

            match action {
                WatchAction::Add { name, url, price, source, image, target } => {
                    let entry = manager
                        .add_temporary(NewWatchEntry {
                            product_name: name,
                            product_url: url,
                            image_url: image,
                            source: parse_source(&source)?,
                            current_price: price,
                            target_price: target,
                        })
                        .await?;
                    println!("staged {} ({})", entry.product_name, entry.id);
                }
                WatchAction::List { email } => match email {
                    Some(email) => {
                        let entries = manager.list_activated(&email).await?;
                        println!("{} activated entries for {}", entries.len(), email);
                        print_entries(&entries);
                    }
                    None => {
                        let entries = manager.list_temporary().await?;
                        println!("{} temporary entries", entries.len());
                        print_entries(&entries);
                    }
                },
                WatchAction::Activate { email } => {
                    let report = manager.activate_all(&email).await?;
                    println!("activated {} entries for {}", report.activated_count, email);
                    for rejection in &report.rejected {
                        println!("  rejected {}: {}", rejection.entry_id, rejection.error);
                    }
                }
                WatchAction::Remove { id, email } => {
                    manager.remove(&id, email.as_deref()).await?;
                    println!("removed {}", id);
                }
            }

            session.watchlist = store.dump().await;
            save_session(&cli.session, &session)?;
        }

        Command::History { product_id, days } => {
            use dealwatch::gateway::MarketplaceGateway;

            let series = gateway.price_history(&product_id, days).await?;
            match compute_stats(&series) {
                Some(stats) => {
                    println!(
                        "{} observations over {} days: first {}, current {}, min {}, max {}",
                        stats.sample_count, days, stats.first, stats.current, stats.min, stats.max
                    );
                    println!("  change {} ({:.1}%)", stats.delta, stats.delta_percent);
                }
                None => println!("no price observations recorded yet"),
            }
        }

        Command::Check => {
            use dealwatch::gateway::MarketplaceGateway;

            gateway.trigger_price_check().await?;
            println!("price check triggered");
        }
    }

    Ok(())
}
