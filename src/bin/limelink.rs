//! Operator CLI for LimeLink links.
//!
//! Classifies links, digs link URLs out of install referrers, resolves links
//! against the lookup service and inspects the persisted first-launch flag.
//!
//! # Usage
//!
//! ```bash
//! # Which variant is this link?
//! cargo run --bin limelink -- classify "https://abc.limelink.org/link/abc123"
//!
//! # Find the link inside a referrer string
//! cargo run --bin limelink -- extract "utm_source=x&https%3A%2F%2Fabc.limelink.org%2Flink%2Fabc123"
//!
//! # Resolve a link to its in-app target
//! cargo run --bin limelink -- resolve "https://abc.limelink.org/link/abc123"
//!
//! # Replay the first-launch deferred check with a given referrer
//! cargo run --bin limelink -- deferred --referrer "utm_source=x&https%3A%2F%2Fabc.limelink.org%2Flink%2Fabc123"
//!
//! # Look up the deferred link registered under a referrer token
//! cargo run --bin limelink -- token --referrer "utm_source=x&token=spring-token"
//! cargo run --bin limelink -- token spring-token --check
//!
//! # Inspect or reset the first-launch flag
//! cargo run --bin limelink -- flag show
//! cargo run --bin limelink -- flag reset --yes
//! ```
//!
//! # Environment Variables
//!
//! - `LIMELINK_API_KEY` (required for `resolve`, `deferred`, `token` and `config`)
//! - `LIMELINK_BASE_URL`, `LIMELINK_ROOT_DOMAIN`, `LIMELINK_LEGACY_HOST`, ...
//!   (see [`limelink::config::Config::from_env`])

use limelink::config::{Config, load_from_env, mask_api_key};
use limelink::domain::entities::{ClassifiedLink, LinkUri, ResolutionResult, TokenLink};
use limelink::domain::repositories::{FIRST_LAUNCH_KEY, FlagStore};
use limelink::infrastructure::referrer::StaticReferrerProvider;
use limelink::infrastructure::storage::FileFlagStore;
use limelink::telemetry::init_tracing;
use limelink::utils::link_classifier::{DEFAULT_LEGACY_HOST, DEFAULT_ROOT_DOMAIN, LinkClassifier};
use limelink::utils::referrer_extractor::{DEFAULT_TOKEN_KEY, ReferrerExtractor, extract_token};
use limelink::{Orchestrator, ResolveError};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI tool for LimeLink deep links.
#[derive(Parser)]
#[command(name = "limelink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the first-launch flag file
    #[arg(long, global = true, default_value = ".limelink")]
    dir: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Classify a URI as a subdomain link, a legacy link or neither
    Classify {
        /// URI to classify
        uri: String,
    },

    /// Extract a link URL from an install referrer
    Extract {
        /// Raw referrer string
        referrer: String,

        /// Also look up this token key (e.g. "code")
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Resolve a link against the lookup service
    Resolve {
        /// Link URI to resolve
        uri: String,
    },

    /// Run the first-launch deferred deep link check
    Deferred {
        /// Install referrer to attribute the launch to
        #[arg(short, long)]
        referrer: String,
    },

    /// Look up the deferred link registered under a token
    Token {
        /// Token to look up (omit to take it from --referrer)
        token: Option<String>,

        /// Install referrer carrying a `token` parameter
        #[arg(short, long, conflicts_with = "token")]
        referrer: Option<String>,

        /// Only check whether the token is registered
        #[arg(long)]
        check: bool,
    },

    /// Inspect or reset the first-launch flag
    Flag {
        #[command(subcommand)]
        action: FlagAction,
    },

    /// Show the effective configuration
    Config,
}

/// First-launch flag subcommands.
#[derive(Subcommand)]
enum FlagAction {
    /// Show the flag state
    Show,

    /// Mark the next launch as a first launch again
    Reset {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { uri } => classify(&uri, cli.json)?,
        Commands::Extract { referrer, token } => extract(&referrer, token.as_deref(), cli.json)?,
        Commands::Resolve { uri } => resolve(&uri, &cli.dir, cli.json).await?,
        Commands::Deferred { referrer } => deferred(referrer, &cli.dir, cli.json).await?,
        Commands::Token {
            token,
            referrer,
            check,
        } => token_link(token, referrer, check, &cli.dir, cli.json).await?,
        Commands::Flag { action } => handle_flag_action(action, &cli.dir)?,
        Commands::Config => show_config()?,
    }

    Ok(())
}

/// Classifier for offline commands: environment overrides when a full
/// configuration is available, the production hosts otherwise.
fn offline_classifier() -> LinkClassifier {
    match Config::from_env() {
        Ok(config) => LinkClassifier::new(config.root_domain, config.legacy_host),
        Err(_) => LinkClassifier::new(DEFAULT_ROOT_DOMAIN, DEFAULT_LEGACY_HOST),
    }
}

/// Loads configuration and installs the log subscriber for online commands.
fn online_config() -> Result<Config> {
    let config = load_from_env()?;
    init_tracing(&config);
    Ok(config)
}

fn classify(raw: &str, json: bool) -> Result<()> {
    let uri = LinkUri::parse(raw).context("Not a valid URI")?;
    let classifier = offline_classifier();
    let link = classifier.classify(&uri);

    if json {
        let value = match &link {
            ClassifiedLink::Subdomain {
                suffix,
                link_suffix,
            } => serde_json::json!({
                "kind": "subdomain",
                "suffix": suffix,
                "link_suffix": link_suffix,
            }),
            ClassifiedLink::Legacy { subdomain, path } => serde_json::json!({
                "kind": "legacy",
                "subdomain": subdomain,
                "path": path,
            }),
            ClassifiedLink::NotALink => serde_json::json!({ "kind": "not_a_link" }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "🔍 Classify".bright_blue().bold());
    println!();
    println!("  URI:       {}", uri.as_str().cyan());

    match link {
        ClassifiedLink::Subdomain {
            suffix,
            link_suffix,
        } => {
            println!("  Kind:      {}", "SUBDOMAIN".green().bold());
            println!("  Suffix:    {}", suffix.bright_white());
            println!("  Link:      {}", link_suffix.bright_yellow());
        }
        ClassifiedLink::Legacy { subdomain, path } => {
            println!("  Kind:      {}", "LEGACY".green().bold());
            println!("  Subdomain: {}", subdomain.bright_white());
            println!("  Path:      {}", path.bright_yellow());
        }
        ClassifiedLink::NotALink => {
            println!("  Kind:      {}", "NOT A LINK".red().bold());
        }
    }

    println!(
        "  Universal: {}",
        classifier.is_universal_link(&uri).to_string().bright_black()
    );
    println!();

    Ok(())
}

fn extract(referrer: &str, token_key: Option<&str>, json: bool) -> Result<()> {
    let classifier = offline_classifier();
    let extractor = ReferrerExtractor::new(classifier.root_domain());
    let candidate = extractor.extract(referrer);
    let token = extract_token(referrer, token_key.unwrap_or(DEFAULT_TOKEN_KEY));

    if json {
        let value = serde_json::json!({
            "candidate": candidate,
            "token": token,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "🧭 Extract".bright_blue().bold());
    println!();

    match candidate {
        Some(candidate) => {
            println!("  Link:   {}", candidate.full_url.bright_yellow().bold());
            println!("  URL:    {}", candidate.url.cyan());
            if let Some(query) = &candidate.query_string {
                println!("  Query:  {}", query.bright_black());
            }
            for (key, value) in sorted(&candidate.query_params) {
                println!("    {} = {}", key.bright_white(), value);
            }
            println!(
                "  Source: {}",
                format!("{:?}", candidate.source).to_lowercase().bright_black()
            );
        }
        None => println!("{}", "  No link found in referrer".yellow()),
    }

    if let Some(key) = token_key {
        match token {
            Some(value) => println!("  {}: {}", key.bright_white(), value.bright_yellow()),
            None => println!("  {}: {}", key.bright_white(), "not present".bright_black()),
        }
    }
    println!();

    Ok(())
}

/// Resolves a link without dispatching, deduplicating or reporting stats.
async fn resolve(raw: &str, dir: &Path, json: bool) -> Result<()> {
    let config = online_config()?;
    let uri = LinkUri::parse(raw).context("Not a valid URI")?;

    let sdk = Orchestrator::connect(
        config,
        Arc::new(FileFlagStore::new(dir)),
        Arc::new(StaticReferrerProvider::unsupported()),
    )?;

    match sdk.resolve_link(&uri).await {
        Ok(result) => print_result(&result, json),
        Err(ResolveError::NotALink) => {
            println!("{}", "⚠️  Not a LimeLink link".yellow());
            Ok(())
        }
        Err(e) => {
            println!(
                "{} {}",
                format!("❌ Resolution failed ({})", e.code()).red().bold(),
                e
            );
            Err(e.into())
        }
    }
}

/// Replays the deferred check with a fixed referrer.
///
/// Consumes the persisted first-launch flag, exactly as an app launch would.
async fn deferred(referrer: String, dir: &Path, json: bool) -> Result<()> {
    let config = online_config()?;

    let sdk = Orchestrator::connect(
        config,
        Arc::new(FileFlagStore::new(dir)),
        Arc::new(StaticReferrerProvider::from_referrer(referrer)),
    )?;

    let Some(task) = sdk.check_deferred() else {
        println!("{}", "ℹ️  Not a first launch, nothing to do".yellow());
        println!(
            "  Reset with: {} limelink flag reset",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    };

    match task.await {
        Some(result) => print_result(&result, json),
        None => {
            println!("{}", "⚠️  No deferred deep link recovered".yellow());
            Ok(())
        }
    }
}

/// Looks up a token link, either by token or from a referrer.
///
/// Never touches the first-launch flag.
async fn token_link(
    token: Option<String>,
    referrer: Option<String>,
    check: bool,
    dir: &Path,
    json: bool,
) -> Result<()> {
    let config = online_config()?;
    let platform = config.platform.clone();

    let sdk = Orchestrator::connect(
        config,
        Arc::new(FileFlagStore::new(dir)),
        Arc::new(StaticReferrerProvider::unsupported()),
    )?;

    let token = match (token, referrer) {
        (Some(token), _) => token,
        (None, Some(referrer)) => match extract_token(&referrer, DEFAULT_TOKEN_KEY) {
            Some(token) => token,
            None => {
                println!("{}", "⚠️  No token found in referrer".yellow());
                return Ok(());
            }
        },
        (None, None) => anyhow::bail!("Pass a token or --referrer"),
    };

    if check {
        let exists = sdk.token_exists(&token).await?;
        if json {
            let value = serde_json::json!({ "token": token, "exists": exists });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else if exists {
            println!("{} {}", "✅ Token registered:".green().bold(), token.bright_white());
        } else {
            println!("{} {}", "ℹ️  Token not registered:".yellow(), token.bright_white());
        }
        return Ok(());
    }

    match sdk.resolve_token(&token).await {
        Ok(link) => print_token_link(&link, &platform, json),
        Err(e) => {
            println!(
                "{} {}",
                format!("❌ Token lookup failed ({})", e.code()).red().bold(),
                e
            );
            Err(e.into())
        }
    }
}

fn print_token_link(link: &TokenLink, platform: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(link)?);
        return Ok(());
    }

    println!("{}", "✅ Token link found".green().bold());
    println!();
    println!("  Token: {}", link.token.bright_white());
    println!(
        "  Store: {}",
        link.store_url(platform).unwrap_or("-").bright_yellow().bold()
    );
    if !link.parameters.is_empty() {
        println!("  Parameters:");
        for (key, _) in sorted(&link.parameters) {
            println!(
                "    {} = {}",
                key.bright_white(),
                link.parameter(key).unwrap_or_default()
            );
        }
    }
    println!();

    Ok(())
}

fn handle_flag_action(action: FlagAction, dir: &Path) -> Result<()> {
    let store = FileFlagStore::new(dir);

    match action {
        FlagAction::Show => {
            let first_launch = store
                .get_bool(FIRST_LAUNCH_KEY, true)
                .map_err(|e| anyhow::anyhow!("Failed to read flag: {}", e))?;

            println!("{}", "🚩 First-launch flag".bright_blue().bold());
            println!();
            println!("  File:  {}", store.path().display().to_string().cyan());
            let state = if first_launch {
                "PENDING".green()
            } else {
                "CONSUMED".bright_black()
            };
            println!("  State: {}", state);
            println!();
        }
        FlagAction::Reset { yes } => {
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Reset the first-launch flag?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            let removed = store
                .remove(FIRST_LAUNCH_KEY)
                .map_err(|e| anyhow::anyhow!("Failed to reset flag: {}", e))?;

            if removed {
                println!("{}", "✅ Flag reset, next launch is a first launch".green().bold());
            } else {
                println!("{}", "ℹ️  Flag was not set".yellow());
            }
        }
    }

    Ok(())
}

fn show_config() -> Result<()> {
    let config = load_from_env()?;

    println!("{}", "⚙️  Configuration".bright_blue().bold());
    println!();
    println!("  API key:     {}", mask_api_key(&config.api_key).bright_black());
    println!("  Base URL:    {}", config.base_url.cyan());
    println!("  Root domain: {}", config.root_domain.cyan());
    println!("  Legacy host: {}", config.legacy_host.cyan());
    println!("  Platform:    {}", config.platform.bright_white());
    println!(
        "  Deferred:    {}",
        if config.deferred_deeplink_enabled {
            "enabled".green()
        } else {
            "disabled".red()
        }
    );
    println!("  Timeout:     {}s", config.request_timeout_secs);
    println!();

    Ok(())
}

fn print_result(result: &ResolutionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let title = if result.is_deferred() {
        "✅ Deferred link resolved"
    } else {
        "✅ Link resolved"
    };
    println!("{}", title.green().bold());
    println!();
    println!("  Link:   {}", result.original_url().cyan());
    println!(
        "  Target: {}",
        result
            .resolved_target()
            .unwrap_or("-")
            .bright_yellow()
            .bold()
    );

    let path = result.path_params();
    if !path.main_path.is_empty() {
        println!("  Suffix: {}", path.main_path.bright_white());
    }
    if let Some(handle) = &path.sub_path {
        println!("  Handle: {}", handle.bright_white());
    }

    if !result.query_params().is_empty() {
        println!("  Query:");
        for (key, value) in sorted(result.query_params()) {
            println!("    {} = {}", key.bright_white(), value);
        }
    }

    if let Some(attribution) = result.attribution() {
        println!("  Referrer: {}", attribution.referrer_url.bright_black());
        if let Some(clicked) = attribution.clicked_at() {
            println!("  Clicked:  {}", clicked.format("%Y-%m-%d %H:%M:%S"));
        }
        if let Some(installed) = attribution.installed_at() {
            println!("  Installed: {}", installed.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    println!();

    Ok(())
}

fn sorted<V>(map: &std::collections::HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
