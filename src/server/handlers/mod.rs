use actix_web::HttpRequest;

use super::response::Response;

pub mod healthz;
pub mod logout;
pub mod session;

/// A synchronous endpoint of the gate itself. Forwarded console pages are
/// handled by the upstream instead.
pub trait Handler {
    fn handle(&self, req: HttpRequest) -> Response;
}
