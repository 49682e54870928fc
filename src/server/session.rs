use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use chrono::Utc;

use crate::gate::decision::Denial;
use crate::gate::token::SessionClaim;
use crate::gate::{Authorization, Gate};

use super::response::Response;
use super::restful::RestfulContext;

/// Layout gate: the session of the page being rendered.
///
/// Server-rendered pages take this as an extractor. It runs the full
/// decode + decide sequence again on its own, through the same
/// [`Gate::authorize`] the edge middleware uses, so an admin page is denied
/// here even if the request somehow bypassed the edge gate.
#[derive(Debug, Clone)]
pub struct LayoutSession {
    /// `None` on a public page rendered without a session.
    pub claim: Option<SessionClaim>,
}

/// A layout gate denial, ready to be sent to the browser.
#[derive(Debug)]
pub struct LayoutRedirect {
    pub location: String,
    pub denial: Denial,
}

impl LayoutSession {
    /// Authorizes rendering `page_path` for the session cookie carried by
    /// `req`.
    pub fn resolve(
        gate: &Gate,
        req: &HttpRequest,
        page_path: &str,
    ) -> Result<Self, LayoutRedirect> {
        let raw = req.cookie(gate.cookie_name());
        let raw = raw.as_ref().map(|c| c.value());
        match gate.authorize(raw, page_path, Utc::now()) {
            Authorization::Allow { claim } => Ok(Self { claim }),
            Authorization::Redirect { location, denial } => {
                Err(LayoutRedirect { location, denial })
            }
        }
    }
}

impl FromRequest for LayoutSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = match req.app_data::<Data<Arc<RestfulContext>>>() {
            Some(ctx) => ctx,
            None => {
                let resp = Response::error("session gate is not configured");
                let err = InternalError::from_response("missing gate", resp.into());
                return ready(Err(err.into()));
            }
        };

        let result = Self::resolve(&ctx.gate, req, req.path()).map_err(|redirect| {
            let resp = Response::redirect(&redirect.location);
            InternalError::from_response(redirect.denial, resp.into()).into()
        });
        ready(result)
    }
}
