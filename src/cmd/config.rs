use anyhow::Result;
use async_trait::async_trait;
use clap::Args;

use crate::display::display_json;

use super::{ConfigArgs, RunCommand};

/// Display the effective configuration in JSON format.
#[derive(Args)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for ShowConfigArgs {
    async fn run(&self) -> Result<()> {
        let cfg = self.config.load_server_config()?;
        display_json(cfg)
    }
}
