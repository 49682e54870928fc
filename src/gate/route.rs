use std::fmt;

use serde::{Deserialize, Serialize};

/// Access class of a URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    /// No session required.
    Public,
    /// Any valid, unexpired session.
    Authenticated,
    /// A valid session whose identity passes the admin check.
    Admin,
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteClass::Public => write!(f, "public"),
            RouteClass::Authenticated => write!(f, "authenticated"),
            RouteClass::Admin => write!(f, "admin"),
        }
    }
}

/// One entry of the route table.
///
/// A path matches when it starts with `prefix` and with none of the `except`
/// prefixes. Matching is plain string prefix matching, not path-segment aware:
/// `/chat` also covers `/chatroom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub prefix: String,

    pub class: RouteClass,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub except: Vec<String>,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, class: RouteClass) -> Self {
        Self {
            prefix: prefix.into(),
            class,
            except: Vec::new(),
        }
    }

    pub fn except(mut self, prefix: impl Into<String>) -> Self {
        self.except.push(prefix.into());
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        if !path.starts_with(&self.prefix) {
            return false;
        }
        !self
            .except
            .iter()
            .any(|except| path.starts_with(except.as_str()))
    }
}

/// Ordered list of [`RouteRule`]s. The first matching rule decides the class,
/// paths no rule matches are public.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.class)
            .unwrap_or(RouteClass::Public)
    }

    /// The console's routing policy: auth pages and framework assets are
    /// public, the workspace pages need a session, `/admin` needs an admin.
    pub fn default_rules() -> Vec<RouteRule> {
        use RouteClass::*;
        vec![
            RouteRule::new("/login", Public),
            RouteRule::new("/register", Public),
            RouteRule::new("/_next", Public),
            RouteRule::new("/favicon.ico", Public),
            RouteRule::new("/chat", Authenticated),
            RouteRule::new("/tasks", Authenticated),
            RouteRule::new("/documents", Authenticated),
            RouteRule::new("/profile", Authenticated),
            RouteRule::new("/users", Authenticated).except("/users/register"),
            RouteRule::new("/admin", Admin),
        ]
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}
