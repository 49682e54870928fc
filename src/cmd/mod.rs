mod check;
mod config;
mod decode;
mod mint;
mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};

use crate::config::{CommonConfig, PathSet};
use crate::logs;
use crate::server::config::ServerConfig;
use crate::server::restful::RestfulServer;

/// Name of the configuration file, without the `.toml` extension.
pub const CONFIG_NAME: &str = "gate";

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// The config directory. Default is `$KB_GATE_CONFIG`, then
    /// `/etc/kb-gate` for root or `~/.config/kb-gate`.
    #[arg(long)]
    pub config_path: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn build_path_set(&self) -> Result<PathSet> {
        PathSet::new(self.config_path.clone())
    }

    pub fn load_server_config(&self) -> Result<ServerConfig> {
        let ps = self.build_path_set()?;
        ps.load_config(CONFIG_NAME, ServerConfig::default)
            .with_context(|| format!("load config '{CONFIG_NAME}'"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Log level, one of: error, warn, info, debug.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl LogArgs {
    pub fn init(&self) -> Result<()> {
        logs::init(&self.log_level, self.log_file.as_deref())
    }
}

#[async_trait]
pub trait RunCommand {
    async fn run(&self) -> Result<()>;
}

/// Commands that end in a long running server. The actix server future is
/// not `Send`, so it is awaited by [`App::run`] instead of a [`RunCommand`].
pub trait ServerCommand {
    fn build_server(&self) -> Result<RestfulServer>;
}

#[derive(Parser)]
#[command(author, about, version)]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Check(check::CheckArgs),
    Config(config::ShowConfigArgs),
    Decode(decode::DecodeArgs),
    Mint(mint::MintArgs),
    Serve(serve::ServeArgs),
}

impl App {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Check(args) => args.run().await,
            Commands::Config(args) => args.run().await,
            Commands::Decode(args) => args.run().await,
            Commands::Mint(args) => args.run().await,
            Commands::Serve(args) => args.build_server()?.run().await,
        }
    }
}
