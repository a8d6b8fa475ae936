use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use feed_versions::config::{FeedConfig, config_path, load_config, log_path};
use feed_versions::search::catalog::primary_record;
use feed_versions::search::error::SearchError;
use feed_versions::search::feed::FeedQuery;
use feed_versions::search::feeds::HttpFeed;
use feed_versions::search::metadata::PackageSearchMetadata;

#[derive(Parser)]
#[command(name = "feed-versions")]
#[command(version, about = "Query the versions a package feed offers for a package")]
struct Cli {
    /// Write logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the versions of a package, newest first
    Versions {
        package_id: String,
        #[arg(long)]
        feed_url: Option<String>,
        /// Include prerelease versions
        #[arg(long)]
        prerelease: bool,
        /// Include delisted versions
        #[arg(long)]
        delisted: bool,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = feed_versions::logging::init(&log_path(), cli.json_logs)
        .context("failed to initialize logging")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Versions {
            package_id,
            feed_url,
            prerelease,
            delisted,
            config,
            json,
        } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => {
                    let default_path = config_path();
                    if default_path.exists() {
                        load_config(&default_path)?
                    } else {
                        FeedConfig::default()
                    }
                }
            };
            if let Some(url) = feed_url {
                config.feed_url = url;
            }
            config.filter.include_prerelease |= prerelease;
            config.filter.include_delisted |= delisted;
            config.validate()?;

            runtime.block_on(list_versions(config, &package_id, json))
        }
    }
}

async fn list_versions(config: FeedConfig, package_id: &str, json: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    let filter = config.filter;
    let feed = HttpFeed::new(&config)?;

    let records = match feed
        .find_packages_by_id(
            package_id,
            filter.include_delisted,
            filter.include_prerelease,
            &cancel,
        )
        .await
    {
        Ok(records) => records,
        Err(e) => {
            let e = SearchError::from(e);
            if e.is_cancelled() {
                println!("cancelled");
                return Ok(());
            }
            error!("Failed to query {}: {}", package_id, e);
            bail!("failed to query {}: {}", package_id, e);
        }
    };

    let Some(primary) = primary_record(&records, package_id, &filter).cloned() else {
        println!("No versions of {} match the filter", package_id);
        return Ok(());
    };

    // The records already fetched back the version list; the feed is not asked twice
    let metadata = PackageSearchMetadata::from_snapshot(primary, records.into(), filter, cancel);
    let versions = match metadata.versions().await {
        Ok(versions) => versions,
        Err(e) if e.is_cancelled() => {
            println!("cancelled");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        let entries: Vec<_> = versions
            .iter()
            .map(|v| {
                json!({
                    "version": v.version.to_string(),
                    "downloadCount": v.download_count,
                    "listed": v.metadata.is_listed(),
                })
            })
            .collect();
        let output = json!({ "id": metadata.id(), "versions": entries });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", metadata.id());
        for v in versions {
            let marker = if v.metadata.is_listed() { "" } else { " (delisted)" };
            println!(
                "  {:<24} {:>12}{}",
                v.version.to_string(),
                v.download_count,
                marker
            );
        }
    }

    Ok(())
}
