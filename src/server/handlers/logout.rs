use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse};
use log::info;

use crate::gate::Gate;
use crate::server::response::Response;

use super::Handler;

/// Clears the session cookie and sends the browser to the login page.
pub struct LogoutHandler {
    gate: Arc<Gate>,
}

impl LogoutHandler {
    pub fn new(gate: Arc<Gate>) -> Self {
        Self { gate }
    }
}

impl Handler for LogoutHandler {
    fn handle(&self, req: HttpRequest) -> Response {
        if let Some(cookie) = req.cookie(self.gate.cookie_name()) {
            info!(
                "Logout from {}, clearing session cookie ({} bytes)",
                req.peer_addr()
                    .map(|addr| addr.ip().to_string())
                    .unwrap_or_default(),
                cookie.value().len()
            );
        }

        let mut cookie = Cookie::build(self.gate.cookie_name().to_string(), "")
            .path("/")
            .http_only(true)
            .finish();
        cookie.make_removal();

        HttpResponse::Found()
            .insert_header((LOCATION, self.gate.login_path()))
            .cookie(cookie)
            .finish()
            .into()
    }
}
