//! Pipeline orchestrator binary (spec §4.8 / C8).

mod phases;
mod run_log;

use chrono::Utc;
use clap::Parser;
use podcast_blobstore::LocalBlobStore;
use podcast_common::{EnvConfig, SiteRegistry};
use tracing_subscriber::EnvFilter;

use phases::SiteRunConfig;

#[derive(Parser)]
#[command(name = "podcast-orchestrator", about = "Podcast transcription and indexing pipeline")]
struct Cli {
    /// Path to the site registry TOML file.
    #[arg(long, default_value = "./config/sites.toml")]
    sites_config: std::path::PathBuf,

    /// Restrict processing to a comma-separated subset of site IDs.
    #[arg(long)]
    sites: Option<String>,

    /// Log planned work without mutating anything.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Re-read existing transcripts and re-apply the current spelling
    /// corrections table, rewriting them (SPEC_FULL §8 open question 2).
    #[arg(long, default_value_t = false)]
    reapply_corrections: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = EnvConfig::from_env()?;

    let is_json = env.storage_env.is_remote();
    let filter = EnvFilter::try_new(&env.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if is_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!("starting podcast-orchestrator");

    let cli = Cli::parse();
    let registry = SiteRegistry::load_from_file(&cli.sites_config)?;

    let selected: Vec<String> = match &cli.sites {
        Some(csv) => csv.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        None => registry.site_ids(),
    };

    let started_at = Utc::now();
    let run_started = std::time::Instant::now();
    let mut outcomes = Vec::new();
    let mut any_hard_failure = false;

    for site_id in &selected {
        let site = match registry.get(site_id) {
            Ok(site) => site,
            Err(e) => {
                tracing::warn!(site_id, error = %e, "unknown site id, skipping");
                continue;
            }
        };

        let outcome = phases::run_site(SiteRunConfig {
            env: &env,
            site,
            dry_run: cli.dry_run,
            reapply_corrections: cli.reapply_corrections,
        })
        .await;

        if !outcome.succeeded {
            any_hard_failure = true;
        }
        outcomes.push(outcome);
    }

    if !cli.dry_run {
        let duration_ms = run_started.elapsed().as_millis() as i64;
        let is_remote = env.storage_env.is_remote();
        let run_log_result = if is_remote {
            match podcast_blobstore::open(&env, "_orchestrator").await {
                Ok(store) => run_log::append_run(store.as_ref(), is_remote, started_at, duration_ms, &outcomes).await,
                Err(e) => Err(e),
            }
        } else {
            let store = LocalBlobStore::new(&env.local_storage_root, "_orchestrator");
            run_log::append_run(&store, is_remote, started_at, duration_ms, &outcomes).await
        };
        if let Err(e) = run_log_result {
            tracing::warn!(error = %e, "failed to write pipeline run log");
        }
    }

    if any_hard_failure {
        std::process::exit(1);
    }
    Ok(())
}
