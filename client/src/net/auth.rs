//! `AuthGateway` backed by Supabase GoTrue.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`, with the session
//! persisted in `localStorage` and refreshed on a `gloo-timers` timer shortly
//! before it expires. Server-side (SSR): every call reports "not available on
//! server"; the session is only ever bootstrapped in the browser.
//!
//! SESSION LIFECYCLE
//! =================
//! Sign-in and sign-up store the token pair and publish `SignedIn`. A timer
//! refreshes the pair `REFRESH_MARGIN_SECS` before expiry and publishes
//! `TokenRefreshed`; a refresh the provider rejects drops the session and
//! publishes `SignedOut`. Replacing or dropping the session invalidates any
//! timer armed for the previous one.

#![allow(clippy::unused_async)]

#[cfg(feature = "hydrate")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "hydrate")]
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use diary::gateway::Listener;
use diary::{AuthError, AuthEventHub, AuthGateway, Identity, Session, SignUpOutcome, Subscription};
#[cfg(feature = "hydrate")]
use diary::{AuthChange, AuthEvent};

use crate::config::PublicConfig;
#[cfg(feature = "hydrate")]
use crate::net::supabase::{self, SignUpBody, StoredSession, TokenBody};

#[cfg(feature = "hydrate")]
const SESSION_KEY: &str = "eatin.auth.session";

#[cfg(not(feature = "hydrate"))]
fn server_unavailable() -> AuthError {
    AuthError::Network("not available on server".to_owned())
}

#[derive(Clone)]
pub struct SupabaseAuth {
    hub: AuthEventHub,
    #[cfg(feature = "hydrate")]
    config: PublicConfig,
    #[cfg(feature = "hydrate")]
    session: Arc<Mutex<Option<StoredSession>>>,
    /// Bumped on every session replacement; timers armed under an older
    /// value do nothing when they fire.
    #[cfg(feature = "hydrate")]
    generation: Arc<AtomicU64>,
}

impl SupabaseAuth {
    /// Gateway for the project in `config`, resuming any persisted session.
    pub fn new(config: PublicConfig) -> Self {
        #[cfg(feature = "hydrate")]
        {
            let stored = crate::util::storage::load_json::<StoredSession>(SESSION_KEY);
            Self {
                hub: AuthEventHub::new(),
                config,
                session: Arc::new(Mutex::new(stored)),
                generation: Arc::new(AtomicU64::new(0)),
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = config;
            Self { hub: AuthEventHub::new() }
        }
    }

    /// A usable access token, refreshing first when the current one is
    /// about to expire. `None` when signed out.
    pub async fn access_token(&self) -> Option<String> {
        #[cfg(feature = "hydrate")]
        {
            let stored = self.snapshot()?;
            if !stored.needs_refresh(crate::util::clock::now_unix()) {
                return Some(stored.access_token);
            }
            self.refresh_now().await;
            self.snapshot().map(|session| session.access_token)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            None
        }
    }
}

#[cfg(feature = "hydrate")]
impl SupabaseAuth {
    pub fn config(&self) -> &PublicConfig {
        &self.config
    }

    fn snapshot(&self) -> Option<StoredSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the session, persist it, and cancel timers for the old one.
    fn store(&self, session: Option<StoredSession>) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        match &session {
            Some(stored) => crate::util::storage::save_json(SESSION_KEY, stored),
            None => crate::util::storage::remove(SESSION_KEY),
        }
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Store a fresh session, arm its refresh timer, and publish `event`.
    fn open(&self, session: StoredSession, event: AuthEvent) -> Identity {
        let identity = session.user.clone();
        self.store(Some(session));
        self.schedule_refresh();
        self.hub.emit(&AuthChange::new(event, Session::Present(identity.clone())));
        identity
    }

    fn drop_session(&self) {
        self.store(None);
        self.hub.emit(&AuthChange::signed_out());
    }

    fn schedule_refresh(&self) {
        let Some(stored) = self.snapshot() else {
            return;
        };
        let generation = self.generation.load(Ordering::Acquire);
        let delay = stored.refresh_in_secs(crate::util::clock::now_unix());
        log::debug!("token refresh in {delay}s");
        let this = self.clone();
        leptos::task::spawn_local(async move {
            gloo_timers::future::sleep(std::time::Duration::from_secs(delay)).await;
            if this.generation.load(Ordering::Acquire) == generation {
                this.refresh_now().await;
            }
        });
    }

    /// Exchange the refresh token. Provider rejections end the session;
    /// network failures leave it for the next attempt.
    async fn refresh_now(&self) {
        let Some(stored) = self.snapshot() else {
            return;
        };
        match self.refresh_grant(&stored.refresh_token).await {
            Ok(fresh) => {
                log::info!("access token refreshed");
                self.open(fresh, AuthEvent::TokenRefreshed);
            }
            Err(AuthError::Rejected(message)) => {
                log::warn!("refresh rejected, signing out: {message}");
                self.drop_session();
            }
            Err(e) => log::warn!("token refresh failed: {e}"),
        }
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<StoredSession, AuthError> {
        let url = supabase::token_url(&self.config.supabase_url, "refresh_token");
        let payload = serde_json::json!({ "refresh_token": refresh_token });
        self.token_request(&url, &payload).await
    }

    async fn token_request(&self, url: &str, payload: &serde_json::Value) -> Result<StoredSession, AuthError> {
        let key = &self.config.supabase_anon_key;
        let request = supabase::authorize(gloo_net::http::Request::post(url), key, key).json(payload);
        let reply = supabase::send(request).await.map_err(AuthError::Network)?;
        if !reply.ok {
            return Err(supabase::auth_error(reply.status, &reply.body));
        }
        let body: TokenBody = reply.decode().map_err(AuthError::Decode)?;
        Ok(body.into_session(crate::util::clock::now_unix()))
    }
}

#[async_trait(?Send)]
impl AuthGateway for SupabaseAuth {
    async fn current_session(&self) -> Result<Session, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let Some(stored) = self.snapshot() else {
                return Ok(Session::Absent);
            };
            if !stored.needs_refresh(crate::util::clock::now_unix()) {
                self.schedule_refresh();
                return Ok(Session::Present(stored.user));
            }
            match self.refresh_grant(&stored.refresh_token).await {
                Ok(fresh) => {
                    let identity = fresh.user.clone();
                    self.store(Some(fresh));
                    self.schedule_refresh();
                    Ok(Session::Present(identity))
                }
                Err(AuthError::Rejected(message)) => {
                    log::warn!("stored session no longer valid: {message}");
                    self.store(None);
                    Ok(Session::Absent)
                }
                Err(e) => Err(e),
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Err(server_unavailable())
        }
    }

    fn on_session_change(&self, listener: Listener) -> Subscription {
        self.hub.subscribe(listener)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let url = supabase::token_url(&self.config.supabase_url, "password");
            let payload = serde_json::json!({ "email": email, "password": password });
            let session = self.token_request(&url, &payload).await?;
            Ok(self.open(session, AuthEvent::SignedIn))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (email, password);
            Err(server_unavailable())
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let key = &self.config.supabase_anon_key;
            let url = supabase::signup_url(&self.config.supabase_url);
            let payload = serde_json::json!({ "email": email, "password": password });
            let request = supabase::authorize(gloo_net::http::Request::post(&url), key, key).json(&payload);
            let reply = supabase::send(request).await.map_err(AuthError::Network)?;
            if !reply.ok {
                return Err(supabase::auth_error(reply.status, &reply.body));
            }
            match reply.decode::<SignUpBody>().map_err(AuthError::Decode)? {
                SignUpBody::Session(body) => {
                    let session = body.into_session(crate::util::clock::now_unix());
                    Ok(SignUpOutcome::SignedIn(self.open(session, AuthEvent::SignedIn)))
                }
                SignUpBody::PendingUser(user) => {
                    log::info!("sign-up for {} awaits email confirmation", user.label());
                    Ok(SignUpOutcome::ConfirmationRequired)
                }
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (email, password);
            Err(server_unavailable())
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let token = self.snapshot().map(|session| session.access_token);
            self.drop_session();
            let Some(token) = token else {
                return Ok(());
            };
            let url = supabase::logout_url(&self.config.supabase_url);
            let key = &self.config.supabase_anon_key;
            let request = supabase::authorize(gloo_net::http::Request::post(&url), key, &token).build();
            let reply = supabase::send(request).await.map_err(AuthError::Network)?;
            if !reply.ok {
                return Err(supabase::auth_error(reply.status, &reply.body));
            }
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Err(server_unavailable())
        }
    }
}
