//! Terminal client for tally.

mod api_client;
mod backend;
mod catalog;

use anyhow::{Context, Result};
use backend::{Backend, ClientConfig};
use catalog::Catalog;
use clap::{Args, Parser, Subcommand, ValueEnum};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::io::Write;
use std::path::{Path, PathBuf};
use tally_core::{ItemIdentity, ItemKey, ItemStats, RatingIntent, RatingSummary, Vote};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Show random items, reveal answers and vote on them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ClientConfigArgs {
    /// Client config file path
    #[arg(long, env = "TALLY_CLIENT_CONFIG")]
    client_config: Option<String>,

    /// Server API URL (overrides client config; selects the remote backend)
    #[arg(long)]
    server: Option<String>,
}

#[derive(Args, Clone)]
struct ItemsArgs {
    /// JSON file with an array of {question, answer} items (default: built-in)
    #[arg(long)]
    items: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive loop: question, Enter to reveal, then vote
    Play {
        #[command(flatten)]
        items: ItemsArgs,
        #[command(flatten)]
        client: ClientConfigArgs,
    },
    /// Cast, toggle or clear a vote on one item
    Vote {
        #[command(flatten)]
        items: ItemsArgs,
        /// Item position in the catalog (0-based)
        #[arg(long)]
        index: usize,
        /// Vote to cast; repeating the held vote retracts it
        choice: VoteChoice,
        #[command(flatten)]
        client: ClientConfigArgs,
    },
    /// Show the current rating of one item
    Show {
        #[command(flatten)]
        items: ItemsArgs,
        /// Item position in the catalog (0-based)
        #[arg(long)]
        index: usize,
        #[command(flatten)]
        client: ClientConfigArgs,
    },
    /// Check that the configured backend is reachable
    Health {
        #[command(flatten)]
        client: ClientConfigArgs,
    },
    /// Show the most-voted items
    Stats {
        /// Maximum rows (1-100)
        #[arg(long)]
        limit: Option<u32>,
        #[command(flatten)]
        client: ClientConfigArgs,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VoteChoice {
    Up,
    Down,
    Clear,
}

impl From<VoteChoice> for RatingIntent {
    fn from(choice: VoteChoice) -> Self {
        match choice {
            VoteChoice::Up => RatingIntent::Set(Vote::Up),
            VoteChoice::Down => RatingIntent::Set(Vote::Down),
            VoteChoice::Clear => RatingIntent::Clear,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with prompts
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Cli { command } = Cli::parse();

    match command {
        Commands::Play { items, client } => {
            let catalog = Catalog::load_or_builtin(items.items.as_deref())?;
            let backend = open_backend(&client).await?;
            handle_play_command(&catalog, &backend).await
        }
        Commands::Vote {
            items,
            index,
            choice,
            client,
        } => {
            let catalog = Catalog::load_or_builtin(items.items.as_deref())?;
            let item = catalog.get(index)?;
            let backend = open_backend(&client).await?;
            let summary = backend.set_rating(&item.key(), choice.into()).await?;
            print_item(item);
            println!("{}", format_summary(&summary));
            Ok(())
        }
        Commands::Show {
            items,
            index,
            client,
        } => {
            let catalog = Catalog::load_or_builtin(items.items.as_deref())?;
            let item = catalog.get(index)?;
            let backend = open_backend(&client).await?;
            let summary = backend.get_rating(&item.key()).await?;
            print_item(item);
            println!("{}", format_summary(&summary));
            Ok(())
        }
        Commands::Health { client } => {
            let backend = open_backend(&client).await?;
            println!("{}", backend.health().await?);
            Ok(())
        }
        Commands::Stats { limit, client } => {
            let backend = open_backend(&client).await?;
            let stats = backend.stats(limit).await?;
            print_stats(&stats);
            Ok(())
        }
    }
}

async fn open_backend(args: &ClientConfigArgs) -> Result<Backend> {
    let config = match &args.server {
        Some(url) => ClientConfig::Remote { url: url.clone() },
        None => {
            let path = client_config_path(args.client_config.as_deref())?;
            load_client_config(&path)?
        }
    };
    Backend::open(&config).await
}

fn client_config_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }

    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(path) => PathBuf::from(path),
        None => {
            let home = std::env::var_os("HOME")
                .ok_or_else(|| anyhow::anyhow!("HOME not set; set TALLY_CLIENT_CONFIG"))?;
            PathBuf::from(home).join(".config")
        }
    };

    Ok(base.join("tally").join("client.toml"))
}

/// Prefix of environment variables that override the client config file.
const CLIENT_ENV_PREFIX: &str = "TALLY_CLIENT__";

fn load_client_config(path: &Path) -> Result<ClientConfig> {
    let has_file = path.exists();
    let has_env = std::env::vars_os()
        .any(|(key, _)| key.to_string_lossy().starts_with(CLIENT_ENV_PREFIX));

    if !has_file && !has_env {
        return Ok(ClientConfig::default());
    }

    let mut figment = Figment::new();
    if has_file {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed(CLIENT_ENV_PREFIX));

    figment
        .extract()
        .map_err(|err| anyhow::anyhow!(err))
        .context("failed to load client configuration")
}

async fn handle_play_command(catalog: &Catalog, backend: &Backend) -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut previous = None;

    println!("{} items. Enter reveals the answer, q quits.", catalog.len());

    loop {
        let (index, item) = catalog.pick(&mut rng, previous);
        previous = Some(index);

        println!("\n{}", item.question);
        let Some(input) = prompt("[Enter] reveal, [q] quit: ")? else {
            return Ok(());
        };
        if input == "q" {
            return Ok(());
        }

        println!("{}", item.answer);
        let key = item.key();
        println!("{}", rating_line(backend, &key).await);

        loop {
            let Some(input) = prompt("[u]p [d]own [c]lear [n]ext [q]uit: ")? else {
                return Ok(());
            };
            let intent = match input.as_str() {
                "u" => RatingIntent::Set(Vote::Up),
                "d" => RatingIntent::Set(Vote::Down),
                "c" => RatingIntent::Clear,
                "n" | "" => break,
                "q" => return Ok(()),
                other => {
                    println!("unknown command: {other}");
                    continue;
                }
            };
            println!("{}", vote_line(backend, &key, intent).await);
        }
    }
}

/// Current rating of `key`, or a placeholder when the backend fails.
async fn rating_line(backend: &Backend, key: &ItemKey) -> String {
    match backend.get_rating(key).await {
        Ok(summary) => format_summary(&summary),
        Err(err) => {
            tracing::warn!(item_key = %key, error = %err, "Failed to load rating");
            "(rating unavailable)".to_string()
        }
    }
}

/// Apply a vote and describe the result. A failed write leaves the session running.
async fn vote_line(backend: &Backend, key: &ItemKey, intent: RatingIntent) -> String {
    match backend.set_rating(key, intent).await {
        Ok(summary) => format_summary(&summary),
        Err(err) => {
            tracing::warn!(item_key = %key, error = %err, "Failed to record vote");
            "(vote not recorded)".to_string()
        }
    }
}

/// Print `message` and read one trimmed line; `None` on end of input.
fn prompt(message: &str) -> Result<Option<String>> {
    print!("{message}");
    std::io::stdout().flush()?;

    let mut input = String::new();
    if std::io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_lowercase()))
}

fn print_item(item: &ItemIdentity) {
    println!("{}", item.question);
    println!("{}", item.answer);
}

fn format_summary(summary: &RatingSummary) -> String {
    let mine = match summary.user_rating {
        Some(vote) => vote.as_str(),
        None => "none",
    };
    format!(
        "up: {}  down: {}  your vote: {}",
        summary.thumbs_up, summary.thumbs_down, mine
    )
}

fn print_stats(stats: &[ItemStats]) {
    if stats.is_empty() {
        println!("No ratings yet.");
        return;
    }

    println!("{:<66} {:>6} {:>6} {:>6}", "ITEM", "UP", "DOWN", "TOTAL");
    println!("{}", "-".repeat(87));
    for row in stats {
        println!(
            "{:<66} {:>6} {:>6} {:>6}",
            row.item_key,
            row.thumbs_up,
            row.thumbs_down,
            row.total()
        );
    }
}
