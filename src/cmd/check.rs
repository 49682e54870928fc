use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::Args;

use crate::display::display_authorization;
use crate::gate::token::parse_expiry;

use super::{ConfigArgs, RunCommand};

/// Show what the gate would do with a request, without running the server.
#[derive(Args)]
pub struct CheckArgs {
    /// Request path, e.g. "/admin/users".
    pub path: String,

    /// Raw value of the session cookie. Omit to check without a session.
    #[arg(short, long)]
    pub cookie: Option<String>,

    /// Evaluate at this time instead of now, ISO-8601.
    #[arg(long)]
    pub now: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for CheckArgs {
    async fn run(&self) -> Result<()> {
        let cfg = self.config.load_server_config()?;
        let gate = cfg.gate.build_gate();

        let now = match self.now.as_ref() {
            Some(now) => parse_expiry(now).with_context(|| format!("invalid time '{now}'"))?,
            None => Utc::now(),
        };

        let auth = gate.authorize(self.cookie.as_deref(), &self.path, now);
        display_authorization(&self.path, &auth);
        Ok(())
    }
}
