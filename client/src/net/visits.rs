//! `VisitRepository` backed by the Supabase PostgREST `visits` table.
//!
//! Client-side (hydrate): requests carry the signed-in user's access token,
//! so the table's row-level security scopes every call to that user. Writes
//! ask for `return=representation` and treat an empty result as a refusal.
//! Server-side (SSR): every call reports "not available on server".

#![allow(clippy::unused_async)]

use async_trait::async_trait;
use diary::{NewVisit, RemoteError, Visit, VisitPatch, VisitRepository};
use uuid::Uuid;

use crate::net::auth::SupabaseAuth;
#[cfg(feature = "hydrate")]
use crate::net::supabase::{self, Reply};

#[cfg(not(feature = "hydrate"))]
fn server_unavailable() -> RemoteError {
    RemoteError::Network("not available on server".to_owned())
}

#[derive(Clone)]
pub struct SupabaseVisits {
    #[cfg(feature = "hydrate")]
    auth: SupabaseAuth,
}

impl SupabaseVisits {
    /// Repository authenticated as whoever `auth` is signed in as.
    pub fn new(auth: SupabaseAuth) -> Self {
        #[cfg(feature = "hydrate")]
        {
            Self { auth }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = auth;
            Self {}
        }
    }
}

#[cfg(feature = "hydrate")]
impl SupabaseVisits {
    /// Builder with project key and the caller's bearer token.
    async fn request(
        &self,
        make: impl FnOnce(&str) -> gloo_net::http::RequestBuilder,
        url: &str,
    ) -> Result<gloo_net::http::RequestBuilder, RemoteError> {
        let token = self.auth.access_token().await.ok_or(RemoteError::Unauthenticated)?;
        let builder = supabase::authorize(make(url), &self.auth.config().supabase_anon_key, &token);
        Ok(builder.header("Prefer", "return=representation"))
    }

    async fn rows(
        request: Result<gloo_net::http::Request, gloo_net::Error>,
    ) -> Result<Vec<Visit>, RemoteError> {
        let reply: Reply = supabase::send(request).await.map_err(RemoteError::Network)?;
        if !reply.ok {
            let err = supabase::remote_error(reply.status, &reply.body);
            log::error!("visits request failed ({}): {err}", reply.status);
            return Err(err);
        }
        reply.decode().map_err(RemoteError::Decode)
    }

    fn base(&self) -> &str {
        &self.auth.config().supabase_url
    }
}

#[async_trait(?Send)]
impl VisitRepository for SupabaseVisits {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Visit>, RemoteError> {
        #[cfg(feature = "hydrate")]
        {
            let url = supabase::list_visits_url(self.base(), owner_id);
            let builder = self.request(gloo_net::http::Request::get, &url).await?;
            let mut visits = Self::rows(builder.build()).await?;
            diary::model::sort_newest_first(&mut visits);
            Ok(visits)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = owner_id;
            Err(server_unavailable())
        }
    }

    async fn create(&self, visit: NewVisit) -> Result<Visit, RemoteError> {
        #[cfg(feature = "hydrate")]
        {
            let url = supabase::visits_url(self.base());
            let builder = self.request(gloo_net::http::Request::post, &url).await?;
            let rows = Self::rows(builder.json(&visit)).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| RemoteError::Rejected("insert returned no row".to_owned()))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = visit;
            Err(server_unavailable())
        }
    }

    async fn update(&self, id: Uuid, patch: VisitPatch) -> Result<Visit, RemoteError> {
        #[cfg(feature = "hydrate")]
        {
            let url = supabase::visit_url(self.base(), id);
            let builder = self.request(gloo_net::http::Request::patch, &url).await?;
            supabase::single_row(Self::rows(builder.json(&patch)).await?, id)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (id, patch);
            Err(server_unavailable())
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RemoteError> {
        #[cfg(feature = "hydrate")]
        {
            let url = supabase::visit_url(self.base(), id);
            let builder = self.request(gloo_net::http::Request::delete, &url).await?;
            supabase::single_row(Self::rows(builder.build()).await?, id).map(|_| ())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = id;
            Err(server_unavailable())
        }
    }
}
