use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse};
use anyhow::{Context, Result};
use log::debug;
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use url::{form_urlencoded, Url};

use crate::gate::path;

use super::session::LayoutSession;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Identity of the session, `application/x-www-form-urlencoded` encoded.
pub const USER_HEADER: &str = "x-kb-user";
pub const ADMIN_HEADER: &str = "x-kb-admin";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Forwards requests the gate allowed to the console.
pub struct Upstream {
    client: Client,
    base: Url,
}

impl Upstream {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base).with_context(|| format!("parse upstream url '{base}'"))?;
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .context("build upstream http client")?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Target url for `req`: upstream base with the canonical request path,
    /// the one the gate authorized, and the query.
    pub fn target(&self, req: &HttpRequest) -> Result<Url> {
        let mut path = path::canonicalize(req.path());
        if !req.query_string().is_empty() {
            path.push('?');
            path.push_str(req.query_string());
        }
        let raw = format!("{}{path}", self.base.as_str().trim_end_matches('/'));
        Url::parse(&raw).with_context(|| format!("build upstream url for '{path}'"))
    }

    /// Client supplied `x-forwarded-for` chain with the peer appended.
    fn forwarded_for(req: &HttpRequest) -> Option<String> {
        let mut chain: Vec<String> = req
            .headers()
            .get_all(FORWARDED_FOR_HEADER)
            .filter_map(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if let Some(addr) = req.peer_addr() {
            chain.push(addr.ip().to_string());
        }
        if chain.is_empty() {
            return None;
        }
        Some(chain.join(", "))
    }

    fn encode_identity(identity: &str) -> String {
        form_urlencoded::byte_serialize(identity.as_bytes()).collect()
    }

    /// Sends `req` to the upstream.
    ///
    /// The identity the layout gate resolved is passed along in
    /// [`USER_HEADER`] and [`ADMIN_HEADER`]; values the client sent for
    /// those headers are dropped.
    pub async fn forward(
        &self,
        req: &HttpRequest,
        body: Bytes,
        session: &LayoutSession,
    ) -> Result<HttpResponse> {
        let url = self.target(req)?;
        let method = Method::from_bytes(req.method().as_str().as_bytes())
            .context("convert request method")?;
        debug!("Forward {method} {url}");

        let mut builder = self.client.request(method, url);
        for (name, value) in req.headers().iter() {
            if Self::is_hop_by_hop(name.as_str())
                || name.as_str() == "content-length"
                || name.as_str() == FORWARDED_FOR_HEADER
                || name.as_str() == USER_HEADER
                || name.as_str() == ADMIN_HEADER
            {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_bytes());
        }

        if let Some(chain) = Self::forwarded_for(req) {
            builder = builder.header(FORWARDED_FOR_HEADER, chain);
        }
        if let Some(claim) = session.claim.as_ref() {
            builder = builder
                .header(USER_HEADER, Self::encode_identity(&claim.identity))
                .header(ADMIN_HEADER, if claim.is_admin() { "1" } else { "0" });
        }

        let resp = builder
            .body(body.to_vec())
            .send()
            .await
            .context("send request to upstream")?;

        let status = StatusCode::from_u16(resp.status().as_u16())
            .context("convert upstream status code")?;
        let mut out = HttpResponse::build(status);
        for (name, value) in resp.headers().iter() {
            if Self::is_hop_by_hop(name.as_str()) || name.as_str() == "content-length" {
                continue;
            }
            out.append_header((name.as_str(), value.as_bytes()));
        }

        let body = resp.bytes().await.context("read upstream response body")?;
        Ok(out.body(body.to_vec()))
    }

    fn is_hop_by_hop(name: &str) -> bool {
        HOP_BY_HOP_HEADERS
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn test_target() {
        let upstream = Upstream::new("http://127.0.0.1:3000", Duration::from_secs(5)).unwrap();
        let req = TestRequest::with_uri("/documents/12?tab=history").to_http_request();
        assert_eq!(
            upstream.target(&req).unwrap().as_str(),
            "http://127.0.0.1:3000/documents/12?tab=history"
        );

        let upstream = Upstream::new("http://console:3000/kb/", Duration::from_secs(5)).unwrap();
        let req = TestRequest::with_uri("/").to_http_request();
        assert_eq!(upstream.target(&req).unwrap().as_str(), "http://console:3000/kb/");
    }

    #[test]
    fn test_target_is_canonical() {
        let upstream = Upstream::new("http://127.0.0.1:3000", Duration::from_secs(5)).unwrap();
        let cases = [
            ("/%61dmin/x?a=%61", "http://127.0.0.1:3000/admin/x?a=%61"),
            ("//admin//x", "http://127.0.0.1:3000/admin/x"),
            ("/_next/../tasks", "http://127.0.0.1:3000/tasks"),
        ];
        for (uri, expect) in cases {
            let req = TestRequest::with_uri(uri).to_http_request();
            assert_eq!(upstream.target(&req).unwrap().as_str(), expect, "uri {uri}");
        }
    }

    #[test]
    fn test_encode_identity() {
        assert_eq!(Upstream::encode_identity("alice"), "alice");
        assert_eq!(Upstream::encode_identity("root-admin"), "root-admin");
        assert_eq!(Upstream::encode_identity("alice\nsmith"), "alice%0Asmith");
        assert_eq!(Upstream::encode_identity("Zoë K"), "Zo%C3%AB+K");
    }

    #[test]
    fn test_forwarded_for() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(Upstream::forwarded_for(&req), None);

        let req = TestRequest::default()
            .peer_addr("10.0.0.7:51000".parse().unwrap())
            .to_http_request();
        assert_eq!(Upstream::forwarded_for(&req).unwrap(), "10.0.0.7");

        let req = TestRequest::default()
            .insert_header((FORWARDED_FOR_HEADER, "203.0.113.9"))
            .peer_addr("10.0.0.7:51000".parse().unwrap())
            .to_http_request();
        assert_eq!(
            Upstream::forwarded_for(&req).unwrap(),
            "203.0.113.9, 10.0.0.7"
        );
    }

    #[test]
    fn test_hop_by_hop() {
        assert!(Upstream::is_hop_by_hop("Connection"));
        assert!(Upstream::is_hop_by_hop("transfer-encoding"));
        assert!(Upstream::is_hop_by_hop("Host"));
        assert!(!Upstream::is_hop_by_hop("cookie"));
        assert!(!Upstream::is_hop_by_hop("content-type"));
    }

    #[test]
    fn test_invalid_base() {
        assert!(Upstream::new("not a url", Duration::from_secs(5)).is_err());
    }
}
