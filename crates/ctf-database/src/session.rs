use crate::Schema;
use crate::PgErr;
use crate::SESSIONS;
use ctf_core::Session;
use ctf_core::Unique;
use ctf_core::ID;
use std::sync::Arc;
use tokio_postgres::Client;

pub(crate) const CREATE: &str = const_format::concatcp!(
    "CREATE TABLE IF NOT EXISTS ",
    SESSIONS,
    " (
        id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        token TEXT NOT NULL UNIQUE,
        timestamp TIMESTAMPTZ NOT NULL
    )"
);
pub(crate) const INDICES: &str =
    const_format::concatcp!("CREATE INDEX IF NOT EXISTS session_team_idx ON ", SESSIONS, " (team_id)");

pub struct SessionSchema;
impl Schema for SessionSchema {
    const NAME: &'static str = SESSIONS;
    const CREATE: &'static str = CREATE;
    const INDICES: &'static str = INDICES;
}

/// Repository trait for the opaque session-cookie → team mapping (spec.md §6).
#[allow(async_fn_in_trait)]
pub trait SessionRepository {
    async fn get_session(&self, token: &str) -> Result<Option<Session>, PgErr>;
    async fn create_session(&self, session: &Session) -> Result<(), PgErr>;
}

impl SessionRepository for Arc<Client> {
    async fn get_session(&self, token: &str) -> Result<Option<Session>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, team_id, token, timestamp FROM ",
                SESSIONS,
                " WHERE token = $1"
            ),
            &[&token],
        )
        .await
        .map(|row| {
            row.map(|row| {
                Session::new(
                    ID::from(row.get::<_, uuid::Uuid>(0)),
                    ID::from(row.get::<_, uuid::Uuid>(1)),
                    row.get::<_, String>(2),
                    row.get::<_, chrono::DateTime<chrono::Utc>>(3),
                )
            })
        })
    }

    async fn create_session(&self, session: &Session) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                SESSIONS,
                " (id, team_id, token, timestamp) VALUES ($1, $2, $3, $4)"
            ),
            &[
                &session.id().inner(),
                &session.team_id().inner(),
                &session.token(),
                &session.timestamp(),
            ],
        )
        .await
        .map(|_| ())
    }
}
