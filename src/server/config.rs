use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{expandenv, CommonConfig, PathSet};
use crate::gate::config::GateConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,

    #[serde(default = "ServerConfig::default_ssl")]
    pub ssl: bool,

    #[serde(default = "ServerConfig::default_cert_path")]
    pub cert_path: String,

    #[serde(default = "ServerConfig::default_key_path")]
    pub key_path: String,

    #[serde(default = "ServerConfig::default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    #[serde(default = "ServerConfig::default_workers")]
    pub workers: u64,

    /// Largest request body forwarded to the upstream.
    #[serde(default = "ServerConfig::default_payload_limit_mib")]
    pub payload_limit_mib: usize,

    /// Base URL of the console that allowed requests are forwarded to, e.g.
    /// "http://127.0.0.1:3000". Empty disables forwarding.
    #[serde(default = "ServerConfig::default_upstream")]
    pub upstream: String,

    #[serde(default = "ServerConfig::default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    #[serde(default = "GateConfig::default")]
    pub gate: GateConfig,
}

impl CommonConfig for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            ssl: Self::default_ssl(),
            cert_path: Self::default_cert_path(),
            key_path: Self::default_key_path(),
            keep_alive_secs: Self::default_keep_alive_secs(),
            workers: Self::default_workers(),
            payload_limit_mib: Self::default_payload_limit_mib(),
            upstream: Self::default_upstream(),
            upstream_timeout_secs: Self::default_upstream_timeout_secs(),
            gate: GateConfig::default(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.bind = expandenv("bind", &self.bind)?;
        if self.bind.is_empty() {
            bail!("bind cannot be empty");
        }

        self.cert_path = expandenv("cert_path", &self.cert_path)?;
        if self.cert_path.is_empty() {
            let path = ps.pki_path.join("server.crt");
            self.cert_path = format!("{}", path.display());
        }

        self.key_path = expandenv("key_path", &self.key_path)?;
        if self.key_path.is_empty() {
            let path = ps.pki_path.join("server.key");
            self.key_path = format!("{}", path.display());
        }

        if self.ssl && cfg!(not(feature = "ssl")) {
            bail!("ssl is enabled but kb-gate was built without the 'ssl' feature");
        }

        self.upstream = expandenv("upstream", &self.upstream)?;
        let upstream = self.upstream.trim_end_matches('/').to_string();
        if !upstream.is_empty() {
            let url = Url::parse(&upstream)
                .with_context(|| format!("parse upstream url '{upstream}'"))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("upstream scheme must be http or https, found '{}'", url.scheme());
            }
        }
        self.upstream = upstream;

        if self.payload_limit_mib == 0 {
            bail!("payload_limit_mib must be greater than 0");
        }

        if self.upstream_timeout_secs == 0 {
            bail!("upstream_timeout_secs must be greater than 0");
        }
        if self.upstream_timeout_secs > Self::MAX_UPSTREAM_TIMEOUT_SECS {
            bail!(
                "upstream_timeout_secs must be less than or equal to {}",
                Self::MAX_UPSTREAM_TIMEOUT_SECS
            );
        }

        self.gate.complete(ps).context("gate")?;

        Ok(())
    }
}

impl ServerConfig {
    const MAX_UPSTREAM_TIMEOUT_SECS: u64 = 300;

    pub fn default_bind() -> String {
        String::from("127.0.0.1:7882")
    }

    pub fn default_ssl() -> bool {
        false
    }

    pub fn default_cert_path() -> String {
        String::new()
    }

    pub fn default_key_path() -> String {
        String::new()
    }

    pub fn default_keep_alive_secs() -> u64 {
        0
    }

    pub fn default_workers() -> u64 {
        0
    }

    pub fn default_payload_limit_mib() -> usize {
        10
    }

    pub fn default_upstream() -> String {
        String::new()
    }

    pub fn default_upstream_timeout_secs() -> u64 {
        30
    }
}

#[cfg(test)]
mod tests {
    use crate::config::tests::test_path_set;

    use super::*;

    #[test]
    fn test_default() {
        let ps = test_path_set("server_config_default");
        let mut cfg = <ServerConfig as CommonConfig>::default();
        cfg.complete(&ps).unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:7882");
        assert!(cfg.upstream.is_empty());
        assert!(cfg.cert_path.ends_with("server.crt"));
        assert!(cfg.key_path.ends_with("server.key"));
        assert_eq!(cfg.gate.cookie_name, "auth-token");
    }

    #[test]
    fn test_parse() {
        let ps = test_path_set("server_config_parse");
        let s = r#"
            bind = "0.0.0.0:8080"
            upstream = "http://127.0.0.1:3000/"
            workers = 4

            [gate]
            preserve_from = true
        "#;
        let mut cfg: ServerConfig = toml::from_str(s).unwrap();
        cfg.complete(&ps).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:8080");
        assert_eq!(cfg.upstream, "http://127.0.0.1:3000");
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.upstream_timeout_secs, 30);
        assert!(cfg.gate.preserve_from);
        assert_eq!(cfg.gate.login_path, "/login");
    }

    #[test]
    fn test_invalid() {
        let ps = test_path_set("server_config_invalid");
        let cases = [
            r#"bind = """#,
            r#"upstream = "not a url""#,
            r#"upstream = "ftp://127.0.0.1""#,
            r#"upstream_timeout_secs = 0"#,
            r#"payload_limit_mib = 0"#,
            r#"upstream_timeout_secs = 301"#,
            "[gate]\nlogin_path = \"/chat\"",
        ];
        for case in cases {
            let mut cfg: ServerConfig = toml::from_str(case).unwrap();
            assert!(cfg.complete(&ps).is_err(), "case {case:?} should be rejected");
        }
    }
}
