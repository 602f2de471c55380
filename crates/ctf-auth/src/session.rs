use chrono::Utc;
use ctf_core::Session;
use ctf_core::Team;
use ctf_core::ID;
use ctf_database::SessionRepository;
use rand::Rng;
use std::sync::Arc;
use tokio_postgres::Client;

/// Name of the cookie carrying the session token (spec.md §6).
pub const SESSION_COOKIE: &str = "session";

/// 256 bytes of randomness, hex-encoded — spec.md §6: "a `session` cookie
/// whose value is a hex-encoded 256-byte random string."
fn generate_token() -> String {
    let mut bytes = [0u8; 256];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Mints and persists a new session for `team`, returning the record whose
/// `token()` is the cookie value the caller should set.
pub async fn issue_session(db: &Arc<Client>, team: ID<Team>) -> Result<Session, ctf_database::PgErr> {
    let session = Session::new(ID::default(), team, generate_token(), Utc::now());
    db.create_session(&session).await?;
    Ok(session)
}
