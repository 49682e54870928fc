use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::Args;

use crate::display::display_json;
use crate::gate::token::{self, parse_expiry};
use crate::server::SessionResponse;

use super::RunCommand;

/// Decode a session cookie value and print the claim it carries.
#[derive(Args)]
pub struct DecodeArgs {
    /// Raw value of the session cookie.
    pub cookie: String,

    /// Evaluate expiry at this time instead of now, ISO-8601.
    #[arg(long)]
    pub now: Option<String>,
}

#[async_trait]
impl RunCommand for DecodeArgs {
    async fn run(&self) -> Result<()> {
        let now = match self.now.as_ref() {
            Some(now) => parse_expiry(now).with_context(|| format!("invalid time '{now}'"))?,
            None => Utc::now(),
        };

        match token::decode(Some(self.cookie.as_str()), now) {
            Ok(claim) => display_json(SessionResponse::from(claim)),
            Err(err) => bail!("{err}"),
        }
    }
}
