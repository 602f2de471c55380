use crate::Schema;
use crate::PgErr;
use crate::TASKS;
use chrono::DateTime;
use chrono::Utc;
use ctf_core::model::Bilingual;
use ctf_core::Task;
use ctf_core::Unique;
use ctf_core::ID;
use std::sync::Arc;
use tokio_postgres::Client;

pub(crate) const CREATE: &str = const_format::concatcp!(
    "CREATE TABLE IF NOT EXISTS ",
    TASKS,
    " (
        id UUID PRIMARY KEY,
        category_id UUID NOT NULL,
        level INTEGER NOT NULL,
        name TEXT NOT NULL,
        name_en TEXT NOT NULL,
        description TEXT NOT NULL,
        description_en TEXT NOT NULL,
        tags TEXT[] NOT NULL DEFAULT '{}',
        author TEXT NOT NULL,
        flag_pattern TEXT NOT NULL,
        force_closed BOOLEAN NOT NULL DEFAULT FALSE,
        opened BOOLEAN NOT NULL DEFAULT FALSE,
        opened_at TIMESTAMPTZ,
        base_price BIGINT NOT NULL,
        shared BOOLEAN NOT NULL DEFAULT FALSE,
        max_share_price BIGINT NOT NULL DEFAULT 0,
        min_share_price BIGINT NOT NULL DEFAULT 0
    )"
);
pub(crate) const INDICES: &str =
    const_format::concatcp!("CREATE INDEX IF NOT EXISTS task_category_idx ON ", TASKS, " (category_id)");

pub struct TaskSchema;
impl Schema for TaskSchema {
    const NAME: &'static str = TASKS;
    const CREATE: &'static str = CREATE;
    const INDICES: &'static str = INDICES;
}

/// Repository trait for the puzzle catalog (spec.md §4.1 `listTasks`/`getTask`/`setTaskOpened`).
#[allow(async_fn_in_trait)]
pub trait TaskRepository {
    async fn list_tasks(&self) -> Result<Vec<Task>, PgErr>;
    async fn get_task(&self, id: ID<Task>) -> Result<Option<Task>, PgErr>;
    async fn create_task(&self, task: &Task) -> Result<(), PgErr>;
    /// Marks a task opened at `at`, the single writer of `opened`/`opened_at`.
    async fn set_task_opened(&self, id: ID<Task>, at: DateTime<Utc>) -> Result<(), PgErr>;
}

fn task_from_row(row: &tokio_postgres::Row) -> Task {
    Task::new(
        ID::from(row.get::<_, uuid::Uuid>("id")),
        ID::from(row.get::<_, uuid::Uuid>("category_id")),
        row.get::<_, i32>("level") as u32,
        Bilingual::new(
            row.get::<_, String>("name"),
            row.get::<_, String>("name_en"),
        ),
        Bilingual::new(
            row.get::<_, String>("description"),
            row.get::<_, String>("description_en"),
        ),
        row.get::<_, Vec<String>>("tags"),
        row.get::<_, String>("author"),
        row.get::<_, String>("flag_pattern"),
        row.get::<_, bool>("force_closed"),
        row.get::<_, i64>("base_price"),
        row.get::<_, bool>("shared"),
        row.get::<_, i64>("max_share_price"),
        row.get::<_, i64>("min_share_price"),
    )
    .expect("persisted flag_pattern must already be valid regex")
}

impl TaskRepository for Arc<Client> {
    async fn list_tasks(&self) -> Result<Vec<Task>, PgErr> {
        let rows = self
            .query(
                const_format::concatcp!(
                    "SELECT id, category_id, level, name, name_en, description, description_en,
                     tags, author, flag_pattern, force_closed, opened, opened_at,
                     base_price, shared, max_share_price, min_share_price FROM ",
                    TASKS,
                    " ORDER BY level, id"
                ),
                &[],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| {
                let mut task = task_from_row(row);
                if let Some(at) = row.get::<_, Option<DateTime<Utc>>>("opened_at") {
                    if row.get::<_, bool>("opened") {
                        task.mark_opened(at);
                    }
                }
                task
            })
            .collect())
    }

    async fn get_task(&self, id: ID<Task>) -> Result<Option<Task>, PgErr> {
        let row = self
            .query_opt(
                const_format::concatcp!(
                    "SELECT id, category_id, level, name, name_en, description, description_en,
                     tags, author, flag_pattern, force_closed, opened, opened_at,
                     base_price, shared, max_share_price, min_share_price FROM ",
                    TASKS,
                    " WHERE id = $1"
                ),
                &[&id.inner()],
            )
            .await?;
        Ok(row.map(|row| {
            let mut task = task_from_row(&row);
            if let Some(at) = row.get::<_, Option<DateTime<Utc>>>("opened_at") {
                if row.get::<_, bool>("opened") {
                    task.mark_opened(at);
                }
            }
            task
        }))
    }

    async fn create_task(&self, task: &Task) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                TASKS,
                " (id, category_id, level, name, name_en, description, description_en, tags,
                   author, flag_pattern, force_closed, base_price, shared, max_share_price, min_share_price)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
            ),
            &[
                &task.id().inner(),
                &task.category_id().inner(),
                &(task.level() as i32),
                &task.name(ctf_core::Language::Primary),
                &task.name(ctf_core::Language::English),
                &task.description(ctf_core::Language::Primary),
                &task.description(ctf_core::Language::English),
                &task.tags(),
                &task.author(),
                &task.flag_pattern(),
                &task.force_closed(),
                &task.base_price(),
                &task.shared(),
                &task.max_share_price(),
                &task.min_share_price(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn set_task_opened(&self, id: ID<Task>, at: DateTime<Utc>) -> Result<(), PgErr> {
        // `AND opened = FALSE` makes this idempotent: of two concurrent
        // callers that both observed the task closed, only the first
        // caller's `at` is persisted, per spec.md §4.4 trigger 2.
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                TASKS,
                " SET opened = TRUE, opened_at = $2 WHERE id = $1 AND opened = FALSE"
            ),
            &[&id.inner(), &at],
        )
        .await
        .map(|_| ())
    }
}
