use std::net::TcpListener;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::header::{LOCATION, SET_COOKIE};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::{Duration, Utc};
use kb_gate::gate::token::{encode, SessionClaim};
use kb_gate::gate::Gate;
use kb_gate::server::response::ResourceResponse;
use kb_gate::server::restful::{RestfulContext, RestfulServer};
use kb_gate::server::upstream::{Upstream, ADMIN_HEADER, USER_HEADER};
use kb_gate::server::SessionResponse;
use once_cell::sync::Lazy;

static ADMIN_COOKIE: Lazy<String> = Lazy::new(|| cookie("root-admin", Duration::days(1)));
static USER_COOKIE: Lazy<String> = Lazy::new(|| cookie("alice", Duration::days(1)));
static EXPIRED_COOKIE: Lazy<String> = Lazy::new(|| cookie("alice", -Duration::days(1)));

fn cookie(identity: &str, ttl: Duration) -> String {
    encode(&SessionClaim::new(identity, Utc::now() + ttl))
}

fn context(upstream: Option<Upstream>) -> Arc<RestfulContext> {
    Arc::new(RestfulContext::new(Gate::default(), upstream, 1))
}

fn get(uri: &str, session: Option<&str>) -> TestRequest {
    let req = TestRequest::get().uri(uri);
    match session {
        Some(value) => req.cookie(Cookie::new("auth-token", value.to_string())),
        None => req,
    }
}

#[actix_web::test]
async fn test_edge_redirects() {
    let app = test::init_service(RestfulServer::build_app(context(None))).await;

    let resp = test::call_service(&app, get("/tasks", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login");

    let req = get("/chat", Some(EXPIRED_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login");

    let req = get("/admin/x", Some(USER_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login");

    let resp = test::call_service(&app, get("/users/7", Some("garbage")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_edge_encoded_paths() {
    let app = test::init_service(RestfulServer::build_app(context(None))).await;

    for path in ["/%61dmin/x", "//admin/x", "/_next/../admin/x", "/x/%2e%2e/admin"] {
        let req = get(path, Some(USER_COOKIE.as_str())).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "path {path}");
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login");
    }

    for path in ["/%74asks", "//tasks", "/%63hat//1", "/./documents"] {
        let resp = test::call_service(&app, get(path, None).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "path {path}");
    }

    // Same answer from the layout gate
    let req = get("/api/session?path=%2F%2561dmin", Some(USER_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_edge_allows() {
    // Without an upstream, pages that pass the gate get a 404.
    let app = test::init_service(RestfulServer::build_app(context(None))).await;

    let req = get("/admin/x", Some(ADMIN_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = get("/tasks", Some(USER_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    for path in ["/login", "/register", "/users/register", "/_next/static/a.js", "/"] {
        let resp = test::call_service(&app, get(path, None).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "path {path}");
    }

    let resp = test::call_service(&app, get("/healthz", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_layout_session() {
    let app = test::init_service(RestfulServer::build_app(context(None))).await;

    let req = get("/api/session?path=/admin/users", Some(ADMIN_COOKIE.as_str())).to_request();
    let resp: ResourceResponse<SessionResponse> = test::call_and_read_body_json(&app, req).await;
    let session = resp.data.unwrap();
    assert_eq!(session.username, "root-admin");
    assert!(session.is_admin);

    let req = get("/api/session?path=/login", None).to_request();
    let resp: ResourceResponse<SessionResponse> = test::call_and_read_body_json(&app, req).await;
    assert!(resp.data.is_none());

    // Layout and edge gate agree on admin pages
    let req = get("/api/session?path=/admin", Some(USER_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login");

    let req = get("/api/session?path=/documents", Some(EXPIRED_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_logout() {
    let app = test::init_service(RestfulServer::build_app(context(None))).await;

    let req = get("/logout", Some(USER_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login");

    let set_cookie = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    let removal = Cookie::parse(set_cookie.to_string()).unwrap();
    assert_eq!(removal.name(), "auth-token");
    assert_eq!(removal.value(), "");
}

async fn echo(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    HttpResponse::Ok()
        .insert_header(("x-upstream", "console"))
        .body(format!(
            "{} {} user={} admin={} body={}",
            req.method(),
            req.uri(),
            header(USER_HEADER),
            header(ADMIN_HEADER),
            String::from_utf8_lossy(&body)
        ))
}

fn start_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let srv = HttpServer::new(|| App::new().default_service(web::route().to(echo)))
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();
    actix_web::rt::spawn(srv);
    format!("http://{addr}")
}

#[actix_web::test]
async fn test_forward() {
    let base = start_upstream();
    let upstream = Upstream::new(&base, std::time::Duration::from_secs(5)).unwrap();
    let app = test::init_service(RestfulServer::build_app(context(Some(upstream)))).await;

    let req = get("/documents/12?tab=history", Some(USER_COOKIE.as_str()))
        .insert_header((USER_HEADER, "root-admin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-upstream").unwrap(), "console");
    let body = test::read_body(resp).await;
    assert_eq!(
        String::from_utf8_lossy(&body),
        "GET /documents/12?tab=history user=alice admin=0 body="
    );

    let req = TestRequest::post()
        .uri("/admin/users")
        .cookie(Cookie::new("auth-token", ADMIN_COOKIE.clone()))
        .set_payload("name=bob")
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(
        String::from_utf8_lossy(&body),
        "POST /admin/users user=root-admin admin=1 body=name=bob"
    );

    // Public page, no session: nothing about the user is forwarded
    let body = test::call_and_read_body(&app, get("/login", None).to_request()).await;
    assert_eq!(String::from_utf8_lossy(&body), "GET /login user=- admin=- body=");

    // The upstream gets the path the gate authorized
    let req = get("//admin//users/%61", Some(ADMIN_COOKIE.as_str())).to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(
        String::from_utf8_lossy(&body),
        "GET /admin/users/a user=root-admin admin=1 body="
    );

    // Identities are sent form encoded
    let odd = cookie("alice\nsmith", Duration::hours(1));
    let req = get("/tasks", Some(odd.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(
        String::from_utf8_lossy(&body),
        "GET /tasks user=alice%0Asmith admin=0 body="
    );

    // Denied requests never reach the upstream
    let resp = test::call_service(&app, get("/tasks", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let resp = test::call_service(&app, get("/%74asks", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_forward_unavailable() {
    // Nothing listens on a port we bound and released.
    let addr = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let upstream =
        Upstream::new(&format!("http://{addr}"), std::time::Duration::from_secs(5)).unwrap();
    let app = test::init_service(RestfulServer::build_app(context(Some(upstream)))).await;

    let req = get("/tasks", Some(USER_COOKIE.as_str())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}
