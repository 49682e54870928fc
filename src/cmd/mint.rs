use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use clap::Args;

use crate::gate::token::{self, SessionClaim};

use super::RunCommand;

/// Print an unsigned session cookie value, for local testing.
#[derive(Args)]
pub struct MintArgs {
    /// Identity to put in the cookie. Any name containing "admin" gets the
    /// admin role.
    pub identity: String,

    /// How long the session lives, e.g. "30m", "12h", "7days".
    #[arg(short, long, default_value = "1h")]
    pub ttl: String,
}

impl MintArgs {
    fn build_claim(&self) -> Result<SessionClaim> {
        if self.identity.is_empty() {
            bail!("identity cannot be empty");
        }
        let ttl = humantime::parse_duration(&self.ttl)
            .with_context(|| format!("parse ttl '{}'", self.ttl))?;
        let ttl = Duration::from_std(ttl).context("ttl is too large")?;
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .context("ttl is too large")?;
        Ok(SessionClaim::new(self.identity.clone(), expires_at))
    }
}

#[async_trait]
impl RunCommand for MintArgs {
    async fn run(&self) -> Result<()> {
        let claim = self.build_claim()?;
        println!("{}", token::encode(&claim));
        Ok(())
    }
}
