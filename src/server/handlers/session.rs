use std::sync::Arc;

use actix_web::HttpRequest;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::gate::token::SessionClaim;
use crate::gate::Gate;
use crate::server::response::Response;
use crate::server::session::LayoutSession;

use super::Handler;

/// What a page layout needs to draw the signed-in chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub username: String,
    pub is_admin: bool,
    /// RFC 3339 expiry of the session.
    pub exp: String,
}

impl From<SessionClaim> for SessionResponse {
    fn from(claim: SessionClaim) -> Self {
        Self {
            is_admin: claim.is_admin(),
            exp: claim.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            username: claim.identity,
        }
    }
}

/// `GET /api/session?path=<page>`: runs the layout gate for the page the
/// console is about to render.
pub struct SessionHandler {
    gate: Arc<Gate>,
}

impl SessionHandler {
    const DEFAULT_PAGE: &'static str = "/";

    pub fn new(gate: Arc<Gate>) -> Self {
        Self { gate }
    }

    fn parse_page(req: &HttpRequest) -> Result<String, &'static str> {
        let page = form_urlencoded::parse(req.query_string().as_bytes())
            .find(|(key, _)| key == "path")
            .map(|(_, value)| value.into_owned());
        match page {
            Some(page) if !page.starts_with('/') => Err("path must start with '/'"),
            Some(page) => Ok(page),
            None => Ok(String::from(Self::DEFAULT_PAGE)),
        }
    }
}

impl Handler for SessionHandler {
    fn handle(&self, req: HttpRequest) -> Response {
        let page = match Self::parse_page(&req) {
            Ok(page) => page,
            Err(msg) => return Response::bad_request(msg),
        };

        match LayoutSession::resolve(&self.gate, &req, &page) {
            Ok(session) => Response::json(session.claim.map(SessionResponse::from)),
            Err(redirect) => Response::redirect(&redirect.location),
        }
    }
}
