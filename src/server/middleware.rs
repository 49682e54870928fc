use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use chrono::Utc;
use log::error;

use crate::gate::Authorization;

use super::response::Response;
use super::restful::RestfulContext;

/// Edge gate, run in front of every route.
///
/// Reads the session cookie, authorizes the request path and either lets
/// the request through untouched or short-circuits with a redirect to the
/// login page. Nothing downstream runs for a denied request.
pub async fn edge_gate(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let ctx = match req.app_data::<Data<Arc<RestfulContext>>>() {
        Some(ctx) => ctx.clone(),
        None => {
            error!("Edge gate has no context, rejecting {}", req.path());
            let resp: HttpResponse = Response::error("session gate is not configured").into();
            return Ok(req.into_response(resp).map_into_right_body());
        }
    };

    let raw = req.cookie(ctx.gate.cookie_name());
    let raw = raw.as_ref().map(|c| c.value());
    match ctx.gate.authorize(raw, req.path(), Utc::now()) {
        Authorization::Allow { .. } => Ok(next.call(req).await?.map_into_left_body()),
        Authorization::Redirect { location, .. } => {
            let resp: HttpResponse = Response::redirect(&location).into();
            Ok(req.into_response(resp).map_into_right_body())
        }
    }
}
