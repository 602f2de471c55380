//! Owns per-task `Opened` state and drives the three triggers spec.md §4.4
//! describes: contest-start first-level open, post-solve cascade, and idle
//! auto-open. Never caches task state across a decision — every tick
//! re-reads from the repository (spec.md §9: "avoid caching tasks in-process
//! for scheduling decisions... source revisions that did so drifted from the
//! database and had to be reverted").
use chrono::DateTime;
use chrono::Utc;
use ctf_core::Category;
use ctf_core::Task;
use ctf_core::Unique;
use ctf_core::ID;
use ctf_database::TaskRepository;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::Client;

/// Opens, idempotently, the lowest-level non-`forceClosed` task in each
/// category whose predecessors are themselves permanently unopenable —
/// spec.md §4.4 trigger 1, run once at `gameStart`.
pub async fn first_level_open(db: &Arc<Client>) -> anyhow::Result<()> {
    let tasks = db.list_tasks().await?;
    for (_, mut chain) in group_by_category(tasks) {
        chain.sort_by_key(|t| t.level());
        if let Some(task) = chain.iter().find(|t| !t.force_closed()) {
            open_if_closed(db, task, Utc::now()).await?;
        }
    }
    Ok(())
}

/// Schedules the deferred opening of `category`'s `level + 1` task after
/// `open_timeout` — spec.md §4.4 trigger 2. Detached and not cancellable:
/// cascades fire even after `gameEnd` (spec.md §5, "harmless").
pub fn spawn_cascade(
    db: Arc<Client>,
    category: ID<Category>,
    level: u32,
    open_timeout: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(open_timeout).await;
        if let Err(e) = open_successor(&db, category, level).await {
            log::error!("cascade open failed for category {category} level {}: {e}", level + 1);
        }
    })
}

async fn open_successor(db: &Arc<Client>, category: ID<Category>, level: u32) -> anyhow::Result<()> {
    let tasks = db.list_tasks().await?;
    if let Some(successor) = tasks
        .iter()
        .find(|t| t.category_id() == category && t.level() == level + 1)
    {
        if successor.force_closed() {
            return Ok(());
        }
        open_if_closed(db, successor, Utc::now()).await?;
    }
    Ok(())
}

/// Periodic sweep (spec.md §4.4 trigger 3): for each category, in ascending
/// `level` order, opens the first closed non-`forceClosed` task whose
/// immediate predecessor is open and has been open at least
/// `auto_open_timeout`. Runs only while `enabled`. Repository errors are
/// logged and the sweep continues; the next tick retries (spec.md §4.4
/// failure semantics).
pub fn spawn_idle_auto_open(
    db: Arc<Client>,
    tick: Duration,
    auto_open_timeout: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = idle_auto_open_sweep(&db, auto_open_timeout).await {
                        log::error!("idle auto-open sweep failed: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    log::info!("idle auto-open sweep shutting down");
                    return;
                }
            }
        }
    })
}

async fn idle_auto_open_sweep(db: &Arc<Client>, auto_open_timeout: Duration) -> anyhow::Result<()> {
    let now = Utc::now();
    let tasks = db.list_tasks().await?;
    for (_, mut chain) in group_by_category(tasks) {
        chain.sort_by_key(|t| t.level());
        for pair in chain.windows(2) {
            let (predecessor, candidate) = (&pair[0], &pair[1]);
            if candidate.opened() || candidate.force_closed() {
                continue;
            }
            if !predecessor.opened() {
                break;
            }
            let Some(opened_at) = predecessor.opened_at() else {
                break;
            };
            if now >= opened_at + chrono::Duration::from_std(auto_open_timeout)? {
                open_if_closed(db, candidate, now).await?;
            }
            break;
        }
    }
    Ok(())
}

async fn open_if_closed(db: &Arc<Client>, task: &Task, at: DateTime<Utc>) -> anyhow::Result<()> {
    if !task.opened() {
        db.set_task_opened(task.id(), at).await?;
    }
    Ok(())
}

fn group_by_category(tasks: Vec<Task>) -> HashMap<ID<Category>, Vec<Task>> {
    let mut by_category: HashMap<ID<Category>, Vec<Task>> = HashMap::new();
    for task in tasks {
        by_category.entry(task.category_id()).or_default().push(task);
    }
    by_category
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctf_core::model::Bilingual;

    fn task(category: ID<Category>, level: u32, force_closed: bool) -> Task {
        Task::new(
            ID::default(),
            category,
            level,
            Bilingual::new("n", ""),
            Bilingual::new("d", ""),
            vec![],
            "author",
            "flag",
            force_closed,
            500,
            false,
            0,
            0,
        )
        .unwrap()
    }

    #[test]
    fn groups_tasks_by_category() {
        let c1 = ID::default();
        let c2 = ID::default();
        let tasks = vec![task(c1, 1, false), task(c1, 2, false), task(c2, 1, false)];
        let grouped = group_by_category(tasks);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&c1].len(), 2);
        assert_eq!(grouped[&c2].len(), 1);
    }
}
