use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};

use crate::server::factory::ServerFactory;
use crate::server::restful::RestfulServer;

use super::{ConfigArgs, LogArgs, ServerCommand};

/// Run the gate server in front of the console.
#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

impl ServerCommand for ServeArgs {
    fn build_server(&self) -> Result<RestfulServer> {
        self.log.init()?;

        let cfg = self.config.load_server_config()?;
        debug!("Server config: {cfg:?}");
        if cfg.upstream.is_empty() {
            info!("No upstream configured, allowed pages will get 404");
        } else {
            info!("Forwarding allowed requests to {}", cfg.upstream);
        }

        let factory = ServerFactory::new(cfg);
        factory.build_server().context("build server")
    }
}
