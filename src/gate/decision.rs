use thiserror::Error;

use super::route::RouteClass;
use super::token::{InvalidClaim, SessionClaim};

/// Outcome of combining a route class with the decoded cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Pass the request on. Carries the claim when the cookie held a valid
    /// one, so callers can show who is logged in even on public pages.
    Allow(Option<SessionClaim>),
    /// Send the browser to the login page without running any page logic.
    RedirectLogin(Denial),
}

/// Why a request was sent back to the login page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("{0}")]
    Unauthenticated(#[from] InvalidClaim),

    /// Valid session on an admin route, but the identity is not an admin.
    /// Still answered with the login redirect rather than a forbidden page.
    #[error("user '{0}' is not an admin")]
    InsufficientRole(String),
}

pub fn decide(class: RouteClass, claim: Result<SessionClaim, InvalidClaim>) -> Decision {
    match class {
        RouteClass::Public => Decision::Allow(claim.ok()),
        RouteClass::Authenticated => match claim {
            Ok(claim) => Decision::Allow(Some(claim)),
            Err(err) => Decision::RedirectLogin(err.into()),
        },
        RouteClass::Admin => match claim {
            Ok(claim) if claim.is_admin() => Decision::Allow(Some(claim)),
            Ok(claim) => Decision::RedirectLogin(Denial::InsufficientRole(claim.identity)),
            Err(err) => Decision::RedirectLogin(err.into()),
        },
    }
}
