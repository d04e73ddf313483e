use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod chronicle;
mod config;
mod error;
mod github;
mod store;

use chronicle::commit::CommitRecord;
use chronicle::project::{ProjectCategory, ProjectStatus};
use chronicle::renderer::{ChronicleRenderer, OutputFormat};
use chronicle::sync::{ChronicleSync, SyncConfig};
use chronicle::Chronicler;
use config::Config;

#[derive(Parser)]
#[command(name = "repo-chronicle")]
#[command(about = "Turn GitHub commit history into seasons and episodes")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "REPO_CHRONICLE_CONFIG")]
    config: Option<PathBuf>,

    /// GitHub token (can also be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub user whose repositories are chronicled
    #[arg(short, long, env = "GITHUB_OWNER")]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch repositories, build their seasons and store them
    Sync {
        /// Comma-separated list of repository names (default: all)
        #[arg(short, long, value_delimiter = ',')]
        repos: Vec<String>,

        /// Directory holding the stored projects
        #[arg(long)]
        store: Option<PathBuf>,

        /// Keep stored projects whose repository is no longer listed
        #[arg(long)]
        no_prune: bool,
    },

    /// Build seasons from a JSON file of commits, without touching GitHub
    Build {
        /// JSON array of commit records
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long)]
        format: Option<OutputFormat>,

        /// Custom handlebars template for markdown output
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// List repositories with their derived status and category
    List {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let chronicler = Chronicler::new(config.episode_rules(), config.season_rules());

    match cli.command {
        Commands::Sync {
            repos,
            store,
            no_prune,
        } => {
            let client = github_client(cli.token, cli.owner, &config)?;
            let store_path = store.unwrap_or_else(|| config.store.path.clone());
            let store = store::JsonFileStore::open(&store_path)
                .with_context(|| format!("failed to open store at {}", store_path.display()))?;

            let sync_config = SyncConfig {
                max_commits: config.github.max_commits,
                prune: !no_prune,
            };
            let sync = ChronicleSync::new(client, store, chronicler, sync_config);
            let report = sync
                .sync_all(|name| {
                    (repos.is_empty() || repos.iter().any(|r| r == name)) && config.wants_repo(name)
                })
                .await?;

            println!(
                "Synced {}/{} repositories into {}",
                report.synced.len(),
                report.total,
                store_path.display()
            );
            for (repo, reason) in &report.failed {
                println!("✗ {}: {}", repo, reason);
            }
            for slug in &report.pruned {
                println!("- removed {}", slug);
            }

            if !report.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Build {
            input,
            output,
            format,
            template,
        } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let commits: Vec<CommitRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of commit records", input.display()))?;

            let seasons = chronicler.chronicle(&commits);

            let format = match format {
                Some(format) => format,
                None => config
                    .output
                    .format
                    .parse::<OutputFormat>()
                    .map_err(anyhow::Error::msg)?,
            };
            let template = template.or_else(|| config.output.template.clone());
            let renderer = ChronicleRenderer::new(format, template.as_deref())?;

            let name = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("repository");
            let content = renderer.generate(name, &seasons)?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content)?;
                println!("Chronicle written to {}", output_path.display());
            } else {
                println!("{}", content);
            }
        }
        Commands::List { limit } => {
            let client = github_client(cli.token, cli.owner, &config)?;
            let repos = client.list_repositories().await?;
            let now = chrono::Utc::now();

            if repos.is_empty() {
                println!("No repositories found");
            }
            for repo in repos.iter().filter(|r| config.wants_repo(&r.name)).take(limit) {
                let status = ProjectStatus::determine(repo.is_archived, repo.last_activity(), now);
                let category = ProjectCategory::categorize(&repo.topics, repo.primary_language.as_deref());
                println!(
                    "  - {} [{} / {}] {}",
                    repo.name,
                    status,
                    category,
                    repo.last_activity().format("%Y-%m-%d")
                );
            }
        }
    }

    Ok(())
}

fn github_client(token: Option<String>, owner: Option<String>, config: &Config) -> Result<github::GitHubClient> {
    let Some(token) = token else {
        bail!("a GitHub token is required (--token or GITHUB_TOKEN)");
    };
    let Some(owner) = owner.or_else(|| config.github.owner.clone()) else {
        bail!("a GitHub owner is required (--owner, GITHUB_OWNER or [github] owner)");
    };
    Ok(github::GitHubClient::new(token, owner)?)
}
