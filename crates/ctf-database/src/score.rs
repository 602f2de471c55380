use crate::Schema;
use crate::PgErr;
use crate::SCORES;
use ctf_core::ScoreSnapshot;
use ctf_core::Team;
use ctf_core::Unique;
use ctf_core::ID;
use std::sync::Arc;
use tokio_postgres::Client;

pub(crate) const CREATE: &str = const_format::concatcp!(
    "CREATE TABLE IF NOT EXISTS ",
    SCORES,
    " (
        id UUID PRIMARY KEY,
        team_id UUID NOT NULL UNIQUE,
        score BIGINT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL
    )"
);
pub(crate) const INDICES: &str = "";

pub struct ScoreSchema;
impl Schema for ScoreSchema {
    const NAME: &'static str = SCORES;
    const CREATE: &'static str = CREATE;
    const INDICES: &'static str = INDICES;
}

/// Repository trait for per-team score snapshots (spec.md §4.6 recompute cycle).
///
/// Snapshots are latest-wins, not append-only: `append_score` is an UPSERT
/// keyed on `team_id` rather than an ever-growing history table, resolving
/// the spec's Open Question on snapshot retention (see DESIGN.md).
#[allow(async_fn_in_trait)]
pub trait ScoreRepository {
    async fn latest_score(&self, team: ID<Team>) -> Result<Option<ScoreSnapshot>, PgErr>;
    async fn all_latest_scores(&self) -> Result<Vec<ScoreSnapshot>, PgErr>;
    async fn append_score(&self, snapshot: &ScoreSnapshot) -> Result<(), PgErr>;
}

impl ScoreRepository for Arc<Client> {
    async fn latest_score(&self, team: ID<Team>) -> Result<Option<ScoreSnapshot>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, team_id, score, timestamp FROM ",
                SCORES,
                " WHERE team_id = $1"
            ),
            &[&team.inner()],
        )
        .await
        .map(|row| {
            row.map(|row| {
                ScoreSnapshot::new(
                    ID::from(row.get::<_, uuid::Uuid>(0)),
                    ID::from(row.get::<_, uuid::Uuid>(1)),
                    row.get::<_, i64>(2),
                    row.get::<_, chrono::DateTime<chrono::Utc>>(3),
                )
            })
        })
    }

    async fn all_latest_scores(&self) -> Result<Vec<ScoreSnapshot>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT id, team_id, score, timestamp FROM ",
                SCORES,
                " ORDER BY score DESC, timestamp ASC"
            ),
            &[],
        )
        .await
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    ScoreSnapshot::new(
                        ID::from(row.get::<_, uuid::Uuid>(0)),
                        ID::from(row.get::<_, uuid::Uuid>(1)),
                        row.get::<_, i64>(2),
                        row.get::<_, chrono::DateTime<chrono::Utc>>(3),
                    )
                })
                .collect()
        })
    }

    async fn append_score(&self, snapshot: &ScoreSnapshot) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                SCORES,
                " (id, team_id, score, timestamp) VALUES ($1, $2, $3, $4)
                 ON CONFLICT (team_id) DO UPDATE SET score = EXCLUDED.score, timestamp = EXCLUDED.timestamp"
            ),
            &[
                &snapshot.id().inner(),
                &snapshot.team_id().inner(),
                &snapshot.score(),
                &snapshot.timestamp(),
            ],
        )
        .await
        .map(|_| ())
    }
}
