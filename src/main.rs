use std::env;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facecmp::{config, render::Report, ComparisonClient, ComparisonSession, ImageSlots};
use log::info;

#[derive(Parser)]
#[command(name = "facecmp")]
#[command(
    version,
    about = "Compare faces across up to four image URLs using a remote comparison service"
)]
struct Cli {
    /// Comparison service base URL (overrides config and FACECMP_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the faces in up to four image URLs
    Compare {
        /// Image URLs; empty strings leave a slot unused
        #[arg(num_args = 1..=4, required = true)]
        urls: Vec<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the comparison service is reachable
    Health,
    /// Open config file in editor
    Config {
        /// Print the effective configuration instead of editing it
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(None)?
        .with_overrides(env::var(config::API_URL_ENV).ok(), cli.api_url);

    match cli.command {
        Commands::Compare { urls, json } => compare(&cfg, urls, json),
        Commands::Health => health(&cfg),
        Commands::Config { show } => {
            if show {
                print!("{}", toml::to_string_pretty(&cfg)?);
                Ok(())
            } else {
                open_config()
            }
        }
    }
}

fn compare(cfg: &config::Config, urls: Vec<String>, json: bool) -> Result<()> {
    let slots = ImageSlots::from_urls(urls).map_err(|e| anyhow::anyhow!(e.user_message()))?;
    info!("{} of {} URLs added", slots.filled_count(), slots.raw().len());

    let client = ComparisonClient::new(cfg);
    info!("Using API URL: {}", client.base_url());

    let mut session = ComparisonSession::new(slots, cfg.send_empty_slots);
    let outcome = session
        .submit(&client)
        .map_err(|e| anyhow::anyhow!("Analysis failed: {}", e.user_message()))?;

    let report = Report::new(outcome);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

fn health(cfg: &config::Config) -> Result<()> {
    let client = ComparisonClient::new(cfg);
    info!("Checking {}", client.base_url());

    let status = client
        .health()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn open_config() -> Result<()> {
    if !config::CONFIG_PATH.exists() {
        config::save_config(&config::Config::default(), None)
            .context("Failed to write default config")?;
    }
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
