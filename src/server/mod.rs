mod handlers;
mod middleware;

pub mod config;
pub mod factory;
pub mod response;
pub mod restful;
pub mod session;
pub mod upstream;

pub use handlers::session::SessionResponse;
