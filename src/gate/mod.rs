pub mod config;
pub mod decision;
pub mod path;
pub mod route;
pub mod token;

use chrono::{DateTime, Utc};
use log::{debug, info};
use url::form_urlencoded;

use decision::{Decision, Denial};
use route::RouteTable;
use token::SessionClaim;

/// The cookie session gate.
///
/// Owns the route table and the redirect target. [`Gate::authorize`] is the
/// only entry point: the edge middleware and the layout extractor both call
/// it, so the two can never apply different rules.
#[derive(Debug, Clone)]
pub struct Gate {
    routes: RouteTable,
    cookie_name: String,
    login_path: String,
    preserve_from: bool,
}

/// What the caller should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allow {
        claim: Option<SessionClaim>,
    },
    Redirect {
        location: String,
        denial: Denial,
    },
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allow { .. })
    }
}

impl Gate {
    pub fn new(
        routes: RouteTable,
        cookie_name: String,
        login_path: String,
        preserve_from: bool,
    ) -> Self {
        Self {
            routes,
            cookie_name,
            login_path,
            preserve_from,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Decodes the cookie, classifies the path and decides.
    ///
    /// # Arguments
    /// * `raw_cookie` - Value of the session cookie, `None` if not set
    /// * `path` - Requested URL path, without query string. It is classified
    ///   in its [`path::canonicalize`] form.
    /// * `now` - Current time, read once by the caller for this request
    pub fn authorize(
        &self,
        raw_cookie: Option<&str>,
        path: &str,
        now: DateTime<Utc>,
    ) -> Authorization {
        let path = path::canonicalize(path);
        let path = path.as_str();
        let class = self.routes.classify(path);
        let claim = token::decode(raw_cookie, now);
        if let Err(err) = claim.as_ref() {
            debug!("No session for {path}: {err}");
        }

        match decision::decide(class, claim) {
            Decision::Allow(claim) => {
                debug!(
                    "Allow {class} route {path} for {}",
                    claim
                        .as_ref()
                        .map(|c| c.identity.as_str())
                        .unwrap_or("<anonymous>")
                );
                Authorization::Allow { claim }
            }
            Decision::RedirectLogin(denial) => {
                info!("Redirect {class} route {path} to login: {denial}");
                Authorization::Redirect {
                    location: self.login_location(path),
                    denial,
                }
            }
        }
    }

    fn login_location(&self, from: &str) -> String {
        if !self.preserve_from {
            return self.login_path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("from", from)
            .finish();
        format!("{}?{query}", self.login_path)
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(
            RouteTable::default(),
            String::from("auth-token"),
            String::from("/login"),
            false,
        )
    }
}
