use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use stowage::{Config, ContentUri, Fetched, Stowage};

#[derive(Debug, Parser)]
#[command(name = "stowage", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// TOML configuration file.
    #[arg(long, global = true, env = "STOWAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root of the local content store.
    #[arg(long, global = true, env = "STOWAGE_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Base URL of the daemon's HTTP API.
    #[arg(long, global = true, env = "STOWAGE_DAEMON_URL")]
    pub daemon_url: Option<String>,

    /// Use only the local store.
    #[arg(long, global = true, env = "STOWAGE_OFFLINE")]
    pub offline: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a file and print its URI.
    Store {
        file:     PathBuf,
        #[arg(long)]
        basename: Option<String>,
    },
    /// Store a string and print its URI.
    #[command(name = "store-text")]
    StoreText {
        text:     String,
        #[arg(long)]
        basename: Option<String>,
    },
    /// Fetch content and print its local path, optionally copying it.
    Load {
        uri:  ContentUri,
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Fetch content and write it to stdout.
    Cat { uri: ContentUri },
    /// List candidate locations reported by the daemon.
    Find { uri: ContentUri },
    /// List the daemon's swarms.
    Swarms,
    Join { swarm: String },
    Leave { swarm: String },
    /// Print the local path of already stored content.
    Path { uri: ContentUri },
}

/// How the command ended, for the process exit code.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    NotFound,
}

impl GlobalArgs {
    pub fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(dir) = &self.storage_dir {
            config.storage_dir = dir.clone();
        }
        if let Some(url) = &self.daemon_url {
            config.daemon_url = url.clone();
        }
        config.offline |= self.offline;
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> Result<Outcome> {
    let config = cli.global.config()?;
    let client = Stowage::new(&config).context("failed to set up client")?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Store { file, basename } => {
            let uri = client
                .store_file(&file, basename.as_deref())
                .await
                .with_context(|| format!("failed to store {}", file.display()))?;
            writeln!(stdout, "{uri}")?;
        }
        Command::StoreText { text, basename } => {
            let uri = client.store_text(&text, basename.as_deref()).await?;
            writeln!(stdout, "{uri}")?;
        }
        Command::Load { uri, dest } => {
            let Fetched::Found(path) = client.load(&uri).await? else {
                return Ok(Outcome::NotFound);
            };
            match dest {
                Some(dest) => {
                    std::fs::copy(&path, &dest)
                        .with_context(|| format!("failed to copy to {}", dest.display()))?;
                    writeln!(stdout, "{}", dest.display())?;
                }
                None => writeln!(stdout, "{}", path.display())?,
            }
        }
        Command::Cat { uri } => {
            let Some(bytes) = client.load_bytes(&uri).await? else {
                return Ok(Outcome::NotFound);
            };
            stdout.write_all(&bytes)?;
        }
        Command::Find { uri } => {
            let mut locations = client.find_file(&uri).await?;
            while let Some(location) = locations.next().await? {
                writeln!(stdout, "{}", serde_json::to_string(&location)?)?;
            }
        }
        Command::Swarms => {
            for swarm in client.swarms().await? {
                match swarm {
                    Value::String(name) => writeln!(stdout, "{name}")?,
                    other => writeln!(stdout, "{other}")?,
                }
            }
        }
        Command::Join { swarm } => client.join_swarm(&swarm).await?,
        Command::Leave { swarm } => client.leave_swarm(&swarm).await?,
        Command::Path { uri } => match client.locate(&uri) {
            Some(path) => writeln!(stdout, "{}", path.display())?,
            None => return Ok(Outcome::NotFound),
        },
    }
    Ok(Outcome::Done)
}
