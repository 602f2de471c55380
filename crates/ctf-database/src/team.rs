use crate::Schema;
use crate::PgErr;
use crate::TEAMS;
use ctf_core::Team;
use ctf_core::Unique;
use ctf_core::ID;
use std::sync::Arc;
use tokio_postgres::Client;

pub(crate) const CREATE: &str = const_format::concatcp!(
    "CREATE TABLE IF NOT EXISTS ",
    TEAMS,
    " (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        token TEXT NOT NULL UNIQUE,
        test BOOLEAN NOT NULL DEFAULT FALSE
    )"
);
pub(crate) const INDICES: &str = "";

pub struct TeamSchema;
impl Schema for TeamSchema {
    const NAME: &'static str = TEAMS;
    const CREATE: &'static str = CREATE;
    const INDICES: &'static str = INDICES;
}

/// Repository trait for registered teams (spec.md §4.1 `listTeams`, §6 auth lookup).
#[allow(async_fn_in_trait)]
pub trait TeamRepository {
    async fn list_teams(&self) -> Result<Vec<Team>, PgErr>;
    async fn get_team(&self, id: ID<Team>) -> Result<Option<Team>, PgErr>;
    /// Looks a team up by its bearer token, the auth-handshake entry point.
    async fn get_team_by_token(&self, token: &str) -> Result<Option<Team>, PgErr>;
    async fn create_team(&self, team: &Team) -> Result<(), PgErr>;
}

fn team_from_row(row: &tokio_postgres::Row) -> Team {
    Team::new(
        ID::from(row.get::<_, uuid::Uuid>("id")),
        row.get::<_, String>("name"),
        row.get::<_, String>("description"),
        row.get::<_, String>("token"),
        row.get::<_, bool>("test"),
    )
}

impl TeamRepository for Arc<Client> {
    async fn list_teams(&self) -> Result<Vec<Team>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT id, name, description, token, test FROM ",
                TEAMS,
                " ORDER BY id"
            ),
            &[],
        )
        .await
        .map(|rows| rows.iter().map(team_from_row).collect())
    }

    async fn get_team(&self, id: ID<Team>) -> Result<Option<Team>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, name, description, token, test FROM ",
                TEAMS,
                " WHERE id = $1"
            ),
            &[&id.inner()],
        )
        .await
        .map(|row| row.as_ref().map(team_from_row))
    }

    async fn get_team_by_token(&self, token: &str) -> Result<Option<Team>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, name, description, token, test FROM ",
                TEAMS,
                " WHERE token = $1"
            ),
            &[&token],
        )
        .await
        .map(|row| row.as_ref().map(team_from_row))
    }

    async fn create_team(&self, team: &Team) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                TEAMS,
                " (id, name, description, token, test) VALUES ($1, $2, $3, $4, $5)"
            ),
            &[
                &team.id().inner(),
                &team.name(),
                &team.description(),
                &team.token(),
                &team.is_test(),
            ],
        )
        .await
        .map(|_| ())
    }
}
