use std::sync::Arc;
use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::web::{self, Bytes, Data, PayloadConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use log::{error, info, warn};
#[cfg(feature = "ssl")]
use openssl::ssl::SslAcceptorBuilder;
use sd_notify::NotifyState;

use crate::gate::Gate;

use super::handlers::healthz::HealthzHandler;
use super::handlers::logout::LogoutHandler;
use super::handlers::session::SessionHandler;
use super::handlers::Handler;
use super::middleware::edge_gate;
use super::response::{CommonResponse, Response};
use super::session::LayoutSession;
use super::upstream::Upstream;

pub struct RestfulServer {
    #[cfg(feature = "ssl")]
    ssl: Option<SslAcceptorBuilder>,
    ctx: Arc<RestfulContext>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    bind: String,
}

pub struct RestfulContext {
    pub gate: Arc<Gate>,

    pub healthz_handler: HealthzHandler,
    pub session_handler: SessionHandler,
    pub logout_handler: LogoutHandler,

    /// `None` when no upstream is configured; allowed pages then get a 404.
    pub upstream: Option<Upstream>,

    pub payload_limit_mib: usize,
}

impl RestfulContext {
    pub fn new(gate: Gate, upstream: Option<Upstream>, payload_limit_mib: usize) -> Self {
        let gate = Arc::new(gate);
        Self {
            healthz_handler: HealthzHandler::new(),
            session_handler: SessionHandler::new(gate.clone()),
            logout_handler: LogoutHandler::new(gate.clone()),
            gate,
            upstream,
            payload_limit_mib,
        }
    }
}

impl RestfulServer {
    const HEALTHZ_PATH: &'static str = "/healthz";
    const LOGOUT_PATH: &'static str = "/logout";
    const SESSION_PATH: &'static str = "/api/session";

    pub fn new(bind: String, ctx: Arc<RestfulContext>) -> Self {
        Self {
            #[cfg(feature = "ssl")]
            ssl: None,
            ctx,
            keep_alive_secs: None,
            workers: None,
            bind,
        }
    }

    #[cfg(feature = "ssl")]
    pub fn set_ssl(&mut self, ssl: SslAcceptorBuilder) {
        self.ssl = Some(ssl);
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    /// The gate application: every route is wrapped by the edge gate, pages
    /// that are not served by the gate itself go to the upstream.
    pub fn build_app(
        ctx: Arc<RestfulContext>,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let payload_limit = ctx.payload_limit_mib * 1024 * 1024;
        App::new()
            .app_data(Data::new(ctx))
            .app_data(PayloadConfig::new(payload_limit))
            .wrap(from_fn(edge_gate))
            .service(web::resource(Self::HEALTHZ_PATH).route(web::get().to(Self::handle_healthz)))
            .service(web::resource(Self::LOGOUT_PATH).route(web::get().to(Self::handle_logout)))
            .service(web::resource(Self::SESSION_PATH).route(web::get().to(Self::handle_session)))
            .default_service(web::route().to(Self::handle_forward))
    }

    pub async fn run(self) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut srv = HttpServer::new(move || Self::build_app(ctx.clone()));

        #[allow(unused_mut)]
        let mut secure = false;
        #[cfg(feature = "ssl")]
        if let Some(ssl) = self.ssl {
            info!("Binding to https://{}", self.bind);
            srv = srv.bind_openssl(&self.bind, ssl).context("bind with ssl")?;
            secure = true;
        }
        if !secure {
            warn!("Using HTTP (without SSL). Session cookies travel in clear text");
            info!("Binding to http://{}", self.bind);
            srv = srv.bind(&self.bind).context("bind without ssl")?;
        }

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        sd_notify::notify(true, &[NotifyState::Ready]).context("notify systemd")?;
        info!("Starting gate server");
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }

    async fn handle_healthz(req: HttpRequest, ctx: Data<Arc<RestfulContext>>) -> HttpResponse {
        ctx.healthz_handler.handle(req).into()
    }

    async fn handle_session(req: HttpRequest, ctx: Data<Arc<RestfulContext>>) -> HttpResponse {
        ctx.session_handler.handle(req).into()
    }

    async fn handle_logout(req: HttpRequest, ctx: Data<Arc<RestfulContext>>) -> HttpResponse {
        ctx.logout_handler.handle(req).into()
    }

    /// Pages of the console. The layout gate runs again through the
    /// [`LayoutSession`] extractor before anything is forwarded.
    async fn handle_forward(
        req: HttpRequest,
        body: Bytes,
        session: LayoutSession,
        ctx: Data<Arc<RestfulContext>>,
    ) -> HttpResponse {
        let upstream = match ctx.upstream.as_ref() {
            Some(upstream) => upstream,
            None => return Self::default_handler(&req),
        };

        match upstream.forward(&req, body, &session).await {
            Ok(resp) => resp,
            Err(err) => {
                error!("Forward {} {} error: {err:#}", req.method(), req.path());
                Response::bad_gateway("upstream is unavailable").into()
            }
        }
    }

    fn default_handler(req: &HttpRequest) -> HttpResponse {
        let path = req.uri().path().to_string();
        let method = req.method().as_str().to_string();
        let message = format!("No route to {method} {path}");
        let ret = CommonResponse {
            code: StatusCode::NOT_FOUND.into(),
            message: Some(message),
        };
        HttpResponse::NotFound().json(ret)
    }
}
