use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::gate::token::SessionClaim;
use crate::gate::Authorization;

pub fn display_json<T: Serialize>(o: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&o)?);
    Ok(())
}

pub fn display_authorization(path: &str, auth: &Authorization) {
    match auth {
        Authorization::Allow { claim } => {
            println!("{} {path}", style("allow").green().bold());
            display_claim(claim.as_ref());
        }
        Authorization::Redirect { location, denial } => {
            println!(
                "{} {path} -> {}",
                style("redirect").yellow().bold(),
                style(location).cyan()
            );
            println!("reason: {denial}");
        }
    }
}

fn display_claim(claim: Option<&SessionClaim>) {
    let claim = match claim {
        Some(claim) => claim,
        None => {
            println!("session: {}", style("<none>").dim());
            return;
        }
    };
    let role = if claim.is_admin() { "admin" } else { "user" };
    println!("session: {} ({role})", style(&claim.identity).bold());
    println!("expires: {}", claim.expires_at.to_rfc3339());
}
