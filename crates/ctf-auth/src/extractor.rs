use crate::SESSION_COOKIE;
use actix_web::dev::Payload;
use actix_web::web;
use actix_web::FromRequest;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use ctf_core::Team;
use ctf_core::Unique;
use ctf_core::ID;
use ctf_database::SessionRepository;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_postgres::Client;

async fn resolve(req: &HttpRequest) -> Option<ID<Team>> {
    let db = req.app_data::<web::Data<Arc<Client>>>()?.clone();
    let token = req.cookie(SESSION_COOKIE)?.value().to_owned();
    let session = db.get_session(&token).await.ok()??;
    Some(session.team_id())
}

/// Rejection for a protected route with no valid session. Renders as the
/// 307-to-`/auth.html` redirect spec.md §6 asks for ("Unauthenticated
/// requests to protected paths redirect 307 to `/auth.html`"), not a bare
/// 401 — so handlers taking [`AuthedTeam`] get that behavior for free
/// instead of branching on `Option` themselves.
#[derive(Debug)]
pub struct Unauthenticated;

impl std::fmt::Display for Unauthenticated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing or invalid session")
    }
}

impl actix_web::ResponseError for Unauthenticated {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::TemporaryRedirect()
            .insert_header(("Location", "/auth.html"))
            .finish()
    }
}

/// A request that carries a valid session cookie — `teamId` is guaranteed.
pub struct AuthedTeam(pub ID<Team>);

impl AuthedTeam {
    pub fn team(&self) -> ID<Team> {
        self.0
    }
}

impl FromRequest for AuthedTeam {
    type Error = Unauthenticated;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { resolve(&req).await.map(AuthedTeam).ok_or(Unauthenticated) })
    }
}

/// A request that may or may not carry a valid session — the literal
/// "possibly anonymous" contract spec.md §1 asks the core to consume.
pub struct MaybeTeam(pub Option<ID<Team>>);

impl MaybeTeam {
    pub fn team(&self) -> Option<ID<Team>> {
        self.0
    }
}

impl FromRequest for MaybeTeam {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(MaybeTeam(resolve(&req).await)) })
    }
}
