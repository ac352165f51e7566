//! One-shot command line front end: run an enrichment inline, re-score a
//! saved profile, or search repositories for new subjects. No database
//! or queue involved — results go to stdout as JSON.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};

use leadscope_core::{LeadProfile, Subject};
use leadscope_enrich::{score_lead, EnrichmentService, ProgressReporter, ServiceConfig};
use leadscope_github::GithubClient;
use leadscope_webscan::PageClient;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Parser)]
#[command(name = "leadscope-cli")]
#[command(about = "Lead enrichment and scoring from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full enrichment pipeline for one subject and print the lead.
    Analyze {
        /// GitHub repository as owner/name.
        #[arg(long)]
        github: Option<String>,
        /// Website domain or URL.
        #[arg(long)]
        website: Option<String>,
    },
    /// Re-score a saved lead profile JSON file without fetching anything.
    Score {
        /// Path to a LeadProfile JSON document.
        file: PathBuf,
    },
    /// Search GitHub repositories to discover analysis subjects.
    Search {
        /// Search query, e.g. "topic:ecommerce language:typescript".
        query: String,
        /// Maximum results.
        #[arg(long, default_value_t = 30)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { github, website } => analyze(github, website).await,
        Commands::Score { file } => score(&file),
        Commands::Search { query, limit } => search(&query, limit).await,
    }
}

async fn analyze(github: Option<String>, website: Option<String>) -> anyhow::Result<()> {
    let subject = Subject::new(github.as_deref(), website.as_deref())?;
    let service = build_service()?;

    let (reporter, mut rx) = ProgressReporter::channel();
    let progress_printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            tracing::info!(progress = *rx.borrow(), "analysis progress");
        }
    });

    let lead = service.enrich(&subject, &reporter).await?;
    drop(reporter);
    let _ = progress_printer.await;

    println!("{}", serde_json::to_string_pretty(&lead)?);
    Ok(())
}

fn score(file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let profile: LeadProfile = serde_json::from_str(&raw)?;
    let scoring = score_lead(&profile, Utc::now());
    println!("{}", serde_json::to_string_pretty(&scoring)?);
    Ok(())
}

async fn search(query: &str, limit: u32) -> anyhow::Result<()> {
    let github = github_client()?;
    let items = github
        .search_repositories(query, "stars", "desc", limit)
        .await?;

    for item in items {
        let language = item.language.as_deref().unwrap_or("-");
        println!("{:>7}  {:<12}  {}", item.stars, language, item.full_name);
        if let Some(description) = item.description {
            println!("         {description}");
        }
    }
    Ok(())
}

fn build_service() -> anyhow::Result<EnrichmentService> {
    let github = github_client()?;
    let pages = PageClient::new(DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT)?;
    Ok(EnrichmentService::new(
        github,
        pages,
        ServiceConfig::default(),
    ))
}

fn github_client() -> anyhow::Result<GithubClient> {
    let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
    Ok(GithubClient::new(
        token.as_deref(),
        DEFAULT_TIMEOUT_SECS,
        DEFAULT_USER_AGENT,
    )?)
}
