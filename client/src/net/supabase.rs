//! Supabase wire schema, endpoints, and error mapping.
//!
//! DESIGN
//! ======
//! Everything here is pure except `send`, so the URL shapes and the mapping
//! of HTTP failures onto `AuthError`/`RemoteError` are unit-tested without a
//! browser. Request building stays with the callers in `auth` and `visits`.

#[cfg(test)]
#[path = "supabase_test.rs"]
mod supabase_test;

use diary::{AuthError, Identity, RemoteError, Visit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Refresh the access token once it is this close to expiry.
pub const REFRESH_MARGIN_SECS: i64 = 60;

// =============================================================================
// SESSION
// =============================================================================

/// Session as kept in `localStorage`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub user: Identity,
}

impl StoredSession {
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.expires_at - now <= REFRESH_MARGIN_SECS
    }

    /// Seconds until the refresh should fire; zero when it is already due.
    pub fn refresh_in_secs(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at - REFRESH_MARGIN_SECS - now).unwrap_or(0)
    }
}

/// GoTrue token grant response.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenBody {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Identity,
}

impl TokenBody {
    pub fn into_session(self, now: i64) -> StoredSession {
        StoredSession {
            expires_at: self.expires_at.unwrap_or(now + self.expires_in),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user: self.user,
        }
    }
}

/// Sign-up answers with a full session when email confirmation is off, and
/// with the bare user record when it is on.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpBody {
    Session(TokenBody),
    PendingUser(Identity),
}

// =============================================================================
// ENDPOINTS
// =============================================================================

pub fn token_url(base: &str, grant_type: &str) -> String {
    format!("{base}/auth/v1/token?grant_type={grant_type}")
}

pub fn signup_url(base: &str) -> String {
    format!("{base}/auth/v1/signup")
}

pub fn logout_url(base: &str) -> String {
    format!("{base}/auth/v1/logout")
}

pub fn visits_url(base: &str) -> String {
    format!("{base}/rest/v1/visits")
}

/// One owner's visits, newest first.
pub fn list_visits_url(base: &str, owner_id: Uuid) -> String {
    format!("{base}/rest/v1/visits?select=*&user_id=eq.{owner_id}&order=visited_at.desc,created_at.desc")
}

pub fn visit_url(base: &str, id: Uuid) -> String {
    format!("{base}/rest/v1/visits?id=eq.{id}")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

// =============================================================================
// ERRORS
// =============================================================================

/// The error fields GoTrue and PostgREST use, in order of preference.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Human-readable message for a failed response.
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.error_description.or(parsed.msg).or(parsed.message).or(parsed.error) {
            return message;
        }
    }
    let body = body.trim();
    if body.is_empty() || body.starts_with('{') {
        format!("request failed with status {status}")
    } else {
        body.to_owned()
    }
}

pub fn auth_error(status: u16, body: &str) -> AuthError {
    let message = error_message(status, body);
    if status >= 500 {
        AuthError::Network(message)
    } else {
        AuthError::Rejected(message)
    }
}

pub fn remote_error(status: u16, body: &str) -> RemoteError {
    let message = error_message(status, body);
    match status {
        401 => RemoteError::Unauthenticated,
        403 => RemoteError::Forbidden(message),
        500.. => RemoteError::Network(message),
        _ => RemoteError::Rejected(message),
    }
}

/// The row a filtered write touched. Row-level security turns writes to
/// another owner's row into zero-row successes; those become `NotFound`.
pub fn single_row(rows: Vec<Visit>, id: Uuid) -> Result<Visit, RemoteError> {
    rows.into_iter().next().ok_or(RemoteError::NotFound(id))
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// A response read to completion.
#[cfg(feature = "hydrate")]
pub struct Reply {
    pub status: u16,
    pub ok: bool,
    pub body: String,
}

#[cfg(feature = "hydrate")]
impl Reply {
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_str(&self.body).map_err(|e| e.to_string())
    }
}

/// Attach the project key and a bearer token (the anon key when signed out).
#[cfg(feature = "hydrate")]
pub fn authorize(
    builder: gloo_net::http::RequestBuilder,
    anon_key: &str,
    token: &str,
) -> gloo_net::http::RequestBuilder {
    builder.header("apikey", anon_key).header("Authorization", &bearer(token))
}

/// Send `request` and read the whole body. Network failures become `Err`.
#[cfg(feature = "hydrate")]
pub async fn send(request: Result<gloo_net::http::Request, gloo_net::Error>) -> Result<Reply, String> {
    let response = request.map_err(|e| e.to_string())?.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    let ok = response.ok();
    let body = response.text().await.map_err(|e| e.to_string())?;
    Ok(Reply { status, ok, body })
}
