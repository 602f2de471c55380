//! Per-subscriber websocket push pipeline (spec.md §4.7): three endpoints,
//! each a per-connection loop that ticks, renders, and sends only when the
//! rendering differs from last-sent or a heartbeat interval has elapsed.
//!
//! Grounded on `crates/hosting/src/casino.rs`'s `bridge` (the `actix_ws`
//! session-loop shape: `tokio::select!` over an incoming stream and a
//! timer, `actix_web::rt::spawn` per connection) and
//! `examples/original_source/scoreboard/scoreboard.go`'s `resultUpdater`
//! (compare-then-send, forced heartbeat after a fixed interval).
pub mod phase;
pub mod render;

use chrono::DateTime;
use chrono::Utc;
use ctf_core::Category;
use ctf_core::Language;
use ctf_core::Task;
use ctf_core::Team;
use ctf_core::Unique;
use ctf_core::ID;
use ctf_pricing::PricingThresholds;
use ctf_pricing::TeamsBase;
use ctf_scoreboard::Scoreboard;
use futures::StreamExt;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::Client;

/// Forced heartbeat interval for the scoreboard/tasks channels — spec.md
/// §4.7: "send if rendering differs from last-sent *or* if ≥60 s have
/// elapsed since last send."
const HEARTBEAT: Duration = Duration::from_secs(60);

/// `/info` channel: every `tick`, send the contest phase with remaining
/// `HH:MM:SS`. No coalescing — spec.md §4.7 "it is a heartbeat."
pub async fn run_info(
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
    tick: Duration,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) {
    let mut interval = tokio::time::interval(tick);
    loop {
        tokio::select! {
            biased;
            _ = interval.tick() => {
                let (phase, remaining) = phase::phase_at(Utc::now(), start, end);
                let html = render::render_info(phase, remaining);
                if session.text(html).await.is_err() {
                    break;
                }
            }
            msg = stream.next() => if !alive(msg) { break },
        }
    }
    log::debug!("[push:info] subscriber disconnected");
}

/// `/scoreboard` channel: each tick, render the scoreboard HTML for
/// `viewer`'s team id and coalesce-and-heartbeat against the last send.
pub async fn run_scoreboard(
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
    tick: Duration,
    scoreboard: Arc<Scoreboard>,
    viewer: Option<ID<Team>>,
) {
    let mut interval = tokio::time::interval(tick);
    let mut last_sent: Option<(String, DateTime<Utc>)> = None;
    loop {
        tokio::select! {
            biased;
            _ = interval.tick() => {
                let standings = scoreboard.snapshot().await;
                let html = render::render_scoreboard(&standings, viewer);
                if should_send(&last_sent, &html) {
                    if session.text(html.clone()).await.is_err() {
                        break;
                    }
                    last_sent = Some((html, Utc::now()));
                }
            }
            msg = stream.next() => if !alive(msg) { break },
        }
    }
    log::debug!("[push:scoreboard] subscriber disconnected");
}

/// `/tasks` channel: same coalesce-and-heartbeat scheme over the task grid,
/// varying per team (solved tasks render differently) and per requested
/// language (spec.md §4.7).
#[allow(clippy::too_many_arguments)]
pub async fn run_tasks(
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
    tick: Duration,
    db: Arc<Client>,
    teams_base: Arc<dyn TeamsBase>,
    thresholds: PricingThresholds,
    viewer: Option<ID<Team>>,
    lang: Language,
) {
    let mut interval = tokio::time::interval(tick);
    let mut last_sent: Option<(String, DateTime<Utc>)> = None;
    loop {
        tokio::select! {
            biased;
            _ = interval.tick() => {
                let html = match render_grid(&db, teams_base.as_ref(), thresholds, viewer, lang).await {
                    Ok(html) => html,
                    Err(e) => {
                        log::error!("[push:tasks] render failed: {e}");
                        continue;
                    }
                };
                if should_send(&last_sent, &html) {
                    if session.text(html.clone()).await.is_err() {
                        break;
                    }
                    last_sent = Some((html, Utc::now()));
                }
            }
            msg = stream.next() => if !alive(msg) { break },
        }
    }
    log::debug!("[push:tasks] subscriber disconnected");
}

async fn render_grid(
    db: &Arc<Client>,
    teams_base: &dyn TeamsBase,
    thresholds: PricingThresholds,
    viewer: Option<ID<Team>>,
    lang: Language,
) -> anyhow::Result<String> {
    use ctf_database::CategoryRepository;
    use ctf_database::SubmissionRepository;
    use ctf_database::TaskRepository;

    let categories: Vec<Category> = db.list_categories().await?;
    let tasks: Vec<Task> = db.list_tasks().await?;
    let solved: HashSet<ID<Task>> = match viewer {
        Some(team) => db
            .list_submissions(team)
            .await?
            .into_iter()
            .filter(|s| s.accepted())
            .map(|s| s.task_id())
            .collect(),
        None => HashSet::new(),
    };
    let mut prices: HashMap<ID<Task>, ctf_core::Price> = HashMap::with_capacity(tasks.len());
    for task in &tasks {
        let solved_count = db.solved_count(task.id()).await?;
        prices.insert(task.id(), ctf_pricing::price(solved_count, teams_base.current(), thresholds));
    }
    Ok(render::render_tasks(&categories, &tasks, &|id| *prices.get(&id).unwrap_or(&0), &solved, lang))
}

/// Whether `rendered` should be pushed: it differs from the last send, or
/// the forced heartbeat interval has elapsed (spec.md §4.7).
fn should_send(last_sent: &Option<(String, DateTime<Utc>)>, rendered: &str) -> bool {
    match last_sent {
        None => true,
        Some((html, at)) => html != rendered || Utc::now() - *at >= chrono::Duration::from_std(HEARTBEAT).unwrap(),
    }
}

/// Drains one message from the incoming stream, closing the loop on a
/// client-initiated close, a transport error, or stream end — spec.md §4.7
/// "Close on write error" / §5 "a subscriber disconnection is detected on
/// the next send's error."
fn alive(msg: Option<Result<actix_ws::Message, actix_ws::ProtocolError>>) -> bool {
    !matches!(
        msg,
        Some(Ok(actix_ws::Message::Close(_))) | Some(Err(_)) | None
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sends_when_rendering_changes() {
        assert!(should_send(&None, "a"));
        let stale = Some(("a".to_string(), Utc::now()));
        assert!(should_send(&stale, "b"));
    }

    #[test]
    fn suppresses_unchanged_rendering_within_heartbeat() {
        let fresh = Some(("a".to_string(), Utc::now()));
        assert!(!should_send(&fresh, "a"));
    }

    #[test]
    fn forces_heartbeat_after_interval_elapses() {
        let stale = Some(("a".to_string(), Utc::now() - chrono::Duration::seconds(61)));
        assert!(should_send(&stale, "a"));
    }
}
