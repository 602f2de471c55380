//! Recomputes per-team totals and caches the ranked snapshot behind a
//! single mutex — spec.md §4.6, §5 ("single-writer, many-readers... readers
//! hold it briefly to copy").
use chrono::DateTime;
use chrono::Utc;
use ctf_core::ScoreSnapshot;
use ctf_core::Team;
use ctf_core::Unique;
use ctf_core::ID;
use ctf_database::ScoreRepository;
use ctf_database::SubmissionRepository;
use ctf_database::TaskRepository;
use ctf_database::TeamRepository;
use ctf_pricing::PricingThresholds;
use ctf_pricing::TeamsBase;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_postgres::Client;

/// One ranked row of the scoreboard.
#[derive(Debug, Clone)]
pub struct Standing {
    pub team: ID<Team>,
    pub team_name: String,
    pub score: i64,
    /// Timestamp of the team's most recent accepted submission, or the
    /// Unix epoch if the team has none — spec.md §4.6: "0 if none", used as
    /// the ascending tie-break key.
    pub last_accept: DateTime<Utc>,
}

/// Single-writer, many-reader ranked cache (spec.md §5).
pub struct Scoreboard {
    standings: Mutex<Vec<Standing>>,
}

impl Scoreboard {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            standings: Mutex::new(Vec::new()),
        })
    }

    /// A shallow copy of the current ranking — spec.md §4.6 `snapshot()`.
    pub async fn snapshot(&self) -> Vec<Standing> {
        self.standings.lock().await.clone()
    }

    /// Recomputes every non-test team's score, persists a `ScoreSnapshot`
    /// per team, re-ranks, and replaces the in-memory cache — spec.md §4.6
    /// `recompute()`.
    pub async fn recompute(
        &self,
        db: &Arc<Client>,
        teams_base: &dyn TeamsBase,
        thresholds: PricingThresholds,
    ) -> anyhow::Result<()> {
        let teams = db.list_teams().await?;
        let tasks = db.list_tasks().await?;
        let mut standings = Vec::with_capacity(teams.len());

        for team in teams.iter().filter(|t| !t.is_test()) {
            let submissions = db.list_submissions(team.id()).await?;
            let solved: HashSet<_> = submissions
                .iter()
                .filter(|s| s.accepted())
                .map(|s| s.task_id())
                .collect();
            let last_accept = submissions
                .iter()
                .filter(|s| s.accepted())
                .map(|s| s.timestamp())
                .max()
                .unwrap_or_else(|| DateTime::from_timestamp(0, 0).expect("epoch is representable"));

            let mut score = 0i64;
            for task in &tasks {
                if solved.contains(&task.id()) {
                    let solved_count = db.solved_count(task.id()).await?;
                    score += ctf_pricing::price(solved_count, teams_base.current(), thresholds);
                }
            }

            db.append_score(&ScoreSnapshot::new(ID::default(), team.id(), score, Utc::now()))
                .await?;

            standings.push(Standing {
                team: team.id(),
                team_name: team.name().to_string(),
                score,
                last_accept,
            });
        }

        standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.last_accept.cmp(&b.last_accept)));

        *self.standings.lock().await = standings;
        Ok(())
    }

    /// Spawns the named background task calling `recompute` every
    /// `recalc_timeout` — spec.md §4.9 "Launch background loops: scoreboard
    /// recompute".
    pub fn spawn_recompute_loop(
        self: Arc<Self>,
        db: Arc<Client>,
        teams_base: Arc<dyn TeamsBase>,
        thresholds: PricingThresholds,
        recalc_timeout: Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(recalc_timeout);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.recompute(&db, teams_base.as_ref(), thresholds).await {
                            log::error!("scoreboard recompute failed: {e}");
                        }
                    }
                    _ = shutdown.changed() => {
                        log::info!("scoreboard recompute loop shutting down");
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(name: &str, score: i64, last_accept_secs: i64) -> Standing {
        Standing {
            team: ID::default(),
            team_name: name.to_string(),
            score,
            last_accept: DateTime::from_timestamp(last_accept_secs, 0).unwrap(),
        }
    }

    #[test]
    fn ties_break_by_ascending_last_accept() {
        let mut standings = vec![standing("b", 700, 300), standing("a", 700, 0)];
        standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.last_accept.cmp(&b.last_accept)));
        assert_eq!(standings[0].team_name, "a");
        assert_eq!(standings[1].team_name, "b");
    }

    #[test]
    fn higher_score_always_outranks_lower() {
        let mut standings = vec![standing("low", 100, 0), standing("high", 900, 1_000_000)];
        standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.last_accept.cmp(&b.last_accept)));
        assert_eq!(standings[0].team_name, "high");
    }
}
