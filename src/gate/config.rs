use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};

use super::route::{RouteClass, RouteRule, RouteTable};
use super::Gate;

/// Session gate configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GateConfig {
    /// Name of the cookie holding the session token.
    /// Default: "auth-token"
    #[serde(default = "GateConfig::default_cookie_name")]
    pub cookie_name: String,

    /// Where denied requests are redirected to. Must be a public route,
    /// otherwise every denied request would loop back to itself.
    /// Default: "/login"
    #[serde(default = "GateConfig::default_login_path")]
    pub login_path: String,

    /// Append `?from=<requested path>` to the login redirect so the console
    /// can return there after login.
    /// Default: false
    #[serde(default = "GateConfig::default_preserve_from")]
    pub preserve_from: bool,

    /// Ordered route table, first match wins. Unmatched paths are public.
    #[serde(default = "RouteTable::default_rules")]
    pub routes: Vec<RouteRule>,
}

impl CommonConfig for GateConfig {
    fn default() -> Self {
        Self {
            cookie_name: Self::default_cookie_name(),
            login_path: Self::default_login_path(),
            preserve_from: Self::default_preserve_from(),
            routes: RouteTable::default_rules(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        self.validate()
    }
}

impl GateConfig {
    pub fn default_cookie_name() -> String {
        String::from("auth-token")
    }

    pub fn default_login_path() -> String {
        String::from("/login")
    }

    pub fn default_preserve_from() -> bool {
        false
    }

    pub fn build_gate(&self) -> Gate {
        Gate::new(
            RouteTable::new(self.routes.clone()),
            self.cookie_name.clone(),
            self.login_path.clone(),
            self.preserve_from,
        )
    }

    pub fn validate(&mut self) -> Result<()> {
        if self.cookie_name.is_empty() {
            bail!("cookie_name cannot be empty");
        }
        if self
            .cookie_name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || ";,=".contains(c))
        {
            bail!("invalid cookie_name '{}'", self.cookie_name);
        }

        self.login_path = expandenv("login_path", &self.login_path)?;
        if !self.login_path.starts_with('/') {
            bail!("login_path must start with '/', found '{}'", self.login_path);
        }

        for rule in self.routes.iter() {
            if !rule.prefix.starts_with('/') {
                bail!("route prefix must start with '/', found '{}'", rule.prefix);
            }
            if let Some(except) = rule.except.iter().find(|e| !e.starts_with(&rule.prefix)) {
                bail!(
                    "route except '{}' is not under its prefix '{}'",
                    except,
                    rule.prefix
                );
            }
        }

        let table = RouteTable::new(self.routes.clone());
        let class = table.classify(&self.login_path);
        if class != RouteClass::Public {
            bail!(
                "login_path '{}' is classified as {class}, it must be public",
                self.login_path
            );
        }

        Ok(())
    }
}
