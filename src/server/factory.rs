use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
#[cfg(feature = "ssl")]
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};

use super::config::ServerConfig;
use super::restful::{RestfulContext, RestfulServer};
use super::upstream::Upstream;

pub struct ServerFactory {
    cfg: ServerConfig,
}

impl ServerFactory {
    pub fn new(cfg: ServerConfig) -> Self {
        Self { cfg }
    }

    pub fn build_server(&self) -> Result<RestfulServer> {
        let ctx = self.build_context()?;

        let mut srv = RestfulServer::new(self.cfg.bind.clone(), ctx);
        #[cfg(feature = "ssl")]
        if let Some(ssl) = self.build_ssl()? {
            srv.set_ssl(ssl);
        }
        if self.cfg.keep_alive_secs > 0 {
            srv.set_keep_alive_secs(self.cfg.keep_alive_secs);
        }
        if self.cfg.workers > 0 {
            srv.set_workers(self.cfg.workers);
        }

        Ok(srv)
    }

    #[cfg(feature = "ssl")]
    pub fn build_ssl(&self) -> Result<Option<SslAcceptorBuilder>> {
        if !self.cfg.ssl {
            return Ok(None);
        }

        let mut builder =
            SslAcceptor::mozilla_intermediate(SslMethod::tls()).context("init ssl acceptor")?;

        builder
            .set_private_key_file(&self.cfg.key_path, SslFiletype::PEM)
            .context("load ssl key file")?;
        builder
            .set_certificate_chain_file(&self.cfg.cert_path)
            .context("load ssl cert file")?;

        Ok(Some(builder))
    }

    pub fn build_context(&self) -> Result<Arc<RestfulContext>> {
        let gate = self.cfg.gate.build_gate();
        let upstream = self.build_upstream()?;
        let ctx = RestfulContext::new(gate, upstream, self.cfg.payload_limit_mib);
        Ok(Arc::new(ctx))
    }

    pub fn build_upstream(&self) -> Result<Option<Upstream>> {
        if self.cfg.upstream.is_empty() {
            return Ok(None);
        }
        let timeout = Duration::from_secs(self.cfg.upstream_timeout_secs);
        let upstream = Upstream::new(&self.cfg.upstream, timeout).context("init upstream")?;
        Ok(Some(upstream))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::tests::test_path_set;
    use crate::config::CommonConfig;

    use super::*;

    #[test]
    fn test_build_context() {
        let ps = test_path_set("server_factory");
        let mut cfg = <ServerConfig as CommonConfig>::default();
        cfg.complete(&ps).unwrap();
        let factory = ServerFactory::new(cfg.clone());
        let ctx = factory.build_context().unwrap();
        assert!(ctx.upstream.is_none());
        assert_eq!(ctx.gate.cookie_name(), "auth-token");
        assert_eq!(ctx.gate.login_path(), "/login");

        cfg.upstream = String::from("http://127.0.0.1:3000");
        let factory = ServerFactory::new(cfg);
        let ctx = factory.build_context().unwrap();
        assert_eq!(
            ctx.upstream.as_ref().unwrap().base().as_str(),
            "http://127.0.0.1:3000/"
        );
    }
}
