//! PostgreSQL repository for the contest engine.
//!
//! A repository-per-entity pattern (`trait Repository for Arc<Client>`)
//! over the six tables in spec.md §6. Table DDL is expressed through a
//! small [`Schema`] trait and `const_format::concatcp!`. Row counts are
//! small enough that plain `INSERT`/`SELECT` is the right tool; no bulk
//! binary-COPY machinery is carried (see DESIGN.md).
mod category;
mod schema;
mod score;
mod session;
mod submission;
mod task;
mod team;

pub use category::CategoryRepository;
pub use schema::Schema;
pub use score::ScoreRepository;
pub use session::SessionRepository;
pub use submission::SubmissionRepository;
pub use task::TaskRepository;
pub use team::TeamRepository;

use std::sync::Arc;
use tokio_postgres::Client;

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for themed categories.
pub const CATEGORIES: &str = "category";
/// Table for puzzles.
pub const TASKS: &str = "task";
/// Table for scoring teams.
pub const TEAMS: &str = "team";
/// Table for flag submission attempts (accepted and rejected).
pub const SUBMISSIONS: &str = "flag";
/// Table for per-team score snapshots.
pub const SCORES: &str = "score";
/// Table for session-cookie → team mappings.
pub const SESSIONS: &str = "session";

/// Establishes a database connection.
///
/// Connects to PostgreSQL using `connection` (`cfg.database.connection` in
/// `config.toml`) and returns an `Arc<Client>` suitable for sharing across
/// async tasks.
///
/// # Panics
///
/// Panics if the connection fails — a startup-time configuration error,
/// not a runtime condition the engine is asked to recover from.
pub async fn db(connection: &str) -> Arc<Client> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let (client, conn) = tokio_postgres::connect(connection, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            log::error!("database connection closed: {}", e);
        }
    });
    Arc::new(client)
}

/// Runs every table's `CREATE TABLE IF NOT EXISTS` + index DDL.
pub async fn migrate(client: &Client) -> anyhow::Result<()> {
    for (creates, indices) in [
        (category::CREATE, category::INDICES),
        (task::CREATE, task::INDICES),
        (team::CREATE, team::INDICES),
        (submission::CREATE, submission::INDICES),
        (score::CREATE, score::INDICES),
        (session::CREATE, session::INDICES),
    ] {
        client.batch_execute(creates).await?;
        if !indices.is_empty() {
            client.batch_execute(indices).await?;
        }
    }
    Ok(())
}
