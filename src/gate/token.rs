use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Separator between the cookie segments.
pub const SEGMENT_SEPARATOR: char = ':';

/// URL-safe base64 that writes without padding and accepts either form on
/// decode, the same way browsers and the backend issuer do.
const B64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Identity asserted by an `auth-token` cookie.
///
/// A claim only exists for cookies whose expiry was strictly in the future at
/// decode time. It is derived fresh for every request and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaim {
    /// Display name / username of the principal.
    pub identity: String,
    /// The moment after which the claim must be treated as invalid.
    pub expires_at: DateTime<Utc>,
}

impl SessionClaim {
    pub fn new(identity: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            expires_at,
        }
    }

    /// Whether the identity contains "admin", ignoring ASCII case.
    ///
    /// There is no role claim in the cookie, so this username heuristic is the
    /// whole role model. Authorization outcomes depend on it exactly.
    pub fn is_admin(&self) -> bool {
        self.identity.to_ascii_lowercase().contains("admin")
    }
}

/// Why a cookie did not yield a [`SessionClaim`].
///
/// Every variant means "no session"; the distinction only feeds logging and
/// tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidClaim {
    #[error("no session cookie")]
    Missing,

    #[error("malformed session cookie: {0}")]
    Malformed(MalformedKind),

    #[error("session expired")]
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedKind {
    #[error("expected at least 2 segments")]
    SegmentCount,

    #[error("identity segment is not base64url encoded utf-8")]
    Identity,

    #[error("expiry segment is not base64url encoded utf-8")]
    Expiry,

    #[error("expiry is not an ISO-8601 date")]
    ExpiryFormat,
}

/// Decodes a raw cookie value into a [`SessionClaim`].
///
/// The wire format is `base64url(identity):base64url(expiry)[:...]`. Segments
/// after the second one (the issuer's signature) are ignored: no signature is
/// verified here, so anyone able to set the cookie can assert any identity.
///
/// # Arguments
/// * `raw` - Cookie value, `None` when the cookie is not set
/// * `now` - Current time, the claim must expire strictly after it
///
/// # Returns
/// The claim, or the reason the cookie counts as "no session". Malformed input
/// never panics.
pub fn decode(raw: Option<&str>, now: DateTime<Utc>) -> Result<SessionClaim, InvalidClaim> {
    let raw = raw.ok_or(InvalidClaim::Missing)?;

    let mut segments = raw.split(SEGMENT_SEPARATOR);
    let (identity, expiry) = match (segments.next(), segments.next()) {
        (Some(identity), Some(expiry)) => (identity, expiry),
        _ => return Err(InvalidClaim::Malformed(MalformedKind::SegmentCount)),
    };

    let identity =
        decode_segment(identity).ok_or(InvalidClaim::Malformed(MalformedKind::Identity))?;
    let expiry = decode_segment(expiry).ok_or(InvalidClaim::Malformed(MalformedKind::Expiry))?;

    let expires_at =
        parse_expiry(&expiry).ok_or(InvalidClaim::Malformed(MalformedKind::ExpiryFormat))?;
    if expires_at <= now {
        return Err(InvalidClaim::Expired);
    }

    Ok(SessionClaim {
        identity,
        expires_at,
    })
}

/// Encodes a claim in the issuer's wire format, without a signature segment.
pub fn encode(claim: &SessionClaim) -> String {
    let expiry = claim.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        "{}{SEGMENT_SEPARATOR}{}",
        B64_URL.encode(claim.identity.as_bytes()),
        B64_URL.encode(expiry.as_bytes())
    )
}

fn decode_segment(segment: &str) -> Option<String> {
    let data = B64_URL.decode(segment).ok()?;
    String::from_utf8(data).ok()
}

/// Parses the ISO-8601 forms the issuer and browsers produce. Date-times
/// without an offset and bare dates are read as UTC.
pub fn parse_expiry(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Some(time.with_timezone(&Utc));
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(time.and_utc());
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Some(time.and_utc());
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}
