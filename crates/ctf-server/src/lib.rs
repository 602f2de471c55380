//! HTTP/websocket surface (spec.md §4.8) and process lifecycle (spec.md
//! §4.9) for the contest engine — thin over `ctf-scheduler`,
//! `ctf-submission`, `ctf-scoreboard`, and `ctf-push`.
pub mod handlers;
pub mod lifecycle;

use ctf_core::config::Config;
use ctf_pricing::PricingThresholds;
use ctf_pricing::TeamsBase;
use ctf_scoreboard::Scoreboard;
use ctf_submission::GameWindow;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::Client;

/// Shared engine state, constructed once at startup and handed to every
/// handler and background task via `web::Data`.
pub struct Engine {
    pub db: Arc<Client>,
    pub scoreboard: Arc<Scoreboard>,
    pub teams_base: Arc<dyn TeamsBase>,
    pub thresholds: PricingThresholds,
    pub window: GameWindow,
    pub open_timeout: Duration,
    pub flag_timeout: Duration,
    pub info_timeout: Duration,
    pub scoreboard_timeout: Duration,
    pub tasks_timeout: Duration,
}

impl Engine {
    /// Current price of `task`, reading the live solved-count and the
    /// configured teams-base estimator (spec.md §4.2).
    pub async fn price_of(&self, task: ctf_core::ID<ctf_core::Task>) -> anyhow::Result<ctf_core::Price> {
        use ctf_database::SubmissionRepository;
        let solved_count = self.db.solved_count(task).await?;
        Ok(ctf_pricing::price(solved_count, self.teams_base.current(), self.thresholds))
    }
}

pub use lifecycle::run;

pub(crate) fn thresholds_from(cfg: &Config) -> PricingThresholds {
    PricingThresholds::from(&cfg.task_price)
}
