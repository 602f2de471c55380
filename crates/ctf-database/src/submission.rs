use crate::Schema;
use crate::PgErr;
use crate::SUBMISSIONS;
use crate::TEAMS;
use ctf_core::Submission;
use ctf_core::Task;
use ctf_core::Team;
use ctf_core::Unique;
use ctf_core::ID;
use std::sync::Arc;
use tokio_postgres::Client;

pub(crate) const CREATE: &str = const_format::concatcp!(
    "CREATE TABLE IF NOT EXISTS ",
    SUBMISSIONS,
    " (
        id UUID PRIMARY KEY,
        team_id UUID NOT NULL,
        task_id UUID NOT NULL,
        submitted_flag TEXT NOT NULL,
        accepted BOOLEAN NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL
    )"
);
/// The partial unique index is the persistence-layer enforcement of spec.md
/// §3 Invariant 2: at most one accepted submission per (team, task) pair.
pub(crate) const INDICES: &str = const_format::concatcp!(
    "CREATE UNIQUE INDEX IF NOT EXISTS flag_accepted_once_idx ON ",
    SUBMISSIONS,
    " (team_id, task_id) WHERE accepted;
     CREATE INDEX IF NOT EXISTS flag_task_idx ON ",
    SUBMISSIONS,
    " (task_id) WHERE accepted;
     CREATE INDEX IF NOT EXISTS flag_team_idx ON ",
    SUBMISSIONS,
    " (team_id)"
);

pub struct SubmissionSchema;
impl Schema for SubmissionSchema {
    const NAME: &'static str = SUBMISSIONS;
    const CREATE: &'static str = CREATE;
    const INDICES: &'static str = INDICES;
}

/// Repository trait for the flag submission audit log (spec.md §4.1, §4.5).
#[allow(async_fn_in_trait)]
pub trait SubmissionRepository {
    async fn list_submissions(&self, team: ID<Team>) -> Result<Vec<Submission>, PgErr>;
    /// Number of distinct teams holding an accepted submission for `task`.
    async fn solved_count(&self, task: ID<Task>) -> Result<i64, PgErr>;
    /// Accepted-submission counts for every non-test team, keyed by team id —
    /// the `k_i` series the nonlinear teams-base estimator sums over
    /// (spec.md §4.3).
    async fn accepted_counts_by_team(&self) -> Result<Vec<(ID<Team>, i64)>, PgErr>;
    /// Teams holding an accepted submission for `task`, in acceptance order —
    /// used by the pricing engine's `TeamsBase` estimator (spec.md §4.2).
    async fn solvers_of(&self, task: ID<Task>) -> Result<Vec<ID<Team>>, PgErr>;
    async fn has_accepted(&self, team: ID<Team>, task: ID<Task>) -> Result<bool, PgErr>;
    async fn append_submission(&self, submission: &Submission) -> Result<(), PgErr>;
}

impl SubmissionRepository for Arc<Client> {
    async fn list_submissions(&self, team: ID<Team>) -> Result<Vec<Submission>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT id, team_id, task_id, submitted_flag, accepted, timestamp FROM ",
                SUBMISSIONS,
                " WHERE team_id = $1 ORDER BY timestamp"
            ),
            &[&team.inner()],
        )
        .await
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    Submission::new(
                        ID::from(row.get::<_, uuid::Uuid>(0)),
                        ID::from(row.get::<_, uuid::Uuid>(1)),
                        ID::from(row.get::<_, uuid::Uuid>(2)),
                        row.get::<_, String>(3),
                        row.get::<_, bool>(4),
                        row.get::<_, chrono::DateTime<chrono::Utc>>(5),
                    )
                })
                .collect()
        })
    }

    async fn solved_count(&self, task: ID<Task>) -> Result<i64, PgErr> {
        let row = self
            .query_one(
                const_format::concatcp!(
                    "SELECT COUNT(*) FROM ",
                    SUBMISSIONS,
                    " WHERE task_id = $1 AND accepted"
                ),
                &[&task.inner()],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn solvers_of(&self, task: ID<Task>) -> Result<Vec<ID<Team>>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT team_id FROM ",
                SUBMISSIONS,
                " WHERE task_id = $1 AND accepted ORDER BY timestamp"
            ),
            &[&task.inner()],
        )
        .await
        .map(|rows| {
            rows.iter()
                .map(|row| ID::from(row.get::<_, uuid::Uuid>(0)))
                .collect()
        })
    }

    async fn has_accepted(&self, team: ID<Team>, task: ID<Task>) -> Result<bool, PgErr> {
        let row = self
            .query_one(
                const_format::concatcp!(
                    "SELECT EXISTS(SELECT 1 FROM ",
                    SUBMISSIONS,
                    " WHERE team_id = $1 AND task_id = $2 AND accepted)"
                ),
                &[&team.inner(), &task.inner()],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn accepted_counts_by_team(&self) -> Result<Vec<(ID<Team>, i64)>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT t.id, COUNT(f.id) FROM ",
                TEAMS,
                " t LEFT JOIN ",
                SUBMISSIONS,
                " f ON f.team_id = t.id AND f.accepted
                 WHERE NOT t.test
                 GROUP BY t.id"
            ),
            &[],
        )
        .await
        .map(|rows| {
            rows.iter()
                .map(|row| (ID::from(row.get::<_, uuid::Uuid>(0)), row.get::<_, i64>(1)))
                .collect()
        })
    }

    async fn append_submission(&self, submission: &Submission) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                SUBMISSIONS,
                " (id, team_id, task_id, submitted_flag, accepted, timestamp)
                 VALUES ($1, $2, $3, $4, $5, $6)"
            ),
            &[
                &submission.id().inner(),
                &submission.team_id().inner(),
                &submission.task_id().inner(),
                &submission.submitted_flag(),
                &submission.accepted(),
                &submission.timestamp(),
            ],
        )
        .await
        .map(|_| ())
    }
}
