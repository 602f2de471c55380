use ctf_database::SubmissionRepository;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::Client;

/// An abstract measure of "effective competing teams" — the denominator in
/// the pricing formula (spec.md §4.3). Implementations expose a plain
/// synchronous read so pricing never awaits to price a task.
pub trait TeamsBase: Send + Sync {
    fn current(&self) -> f64;
}

/// Either the literal team count or a configured constant — spec.md §4.3
/// "Static: either `len(teams)` or a configured constant."
pub struct Static(f64);

impl Static {
    pub fn team_count(n: usize) -> Self {
        Self(n as f64)
    }
    pub fn configured(value: f64) -> Self {
        Self(value)
    }
}

impl TeamsBase for Static {
    fn current(&self) -> f64 {
        self.0
    }
}

/// Floor below which the nonlinear estimate never falls (spec.md §4.3,
/// "clamped to a floor of 21"; §8 boundary: zero submissions anywhere
/// returns exactly 21).
const FLOOR: f64 = 21.0;

/// `Z = Σ_i √(k_i / M)`, `M = max(1, max_i k_i)`, recomputed periodically
/// by a background task and read lock-free by pricing. Stored as the raw
/// bits of an `f64` in an `AtomicU64` — spec.md §5: "TeamsBase value:
/// single writer... atomic read/write sufficient."
pub struct NonLinear {
    bits: AtomicU64,
}

impl NonLinear {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bits: AtomicU64::new(FLOOR.to_bits()),
        })
    }

    fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Computes `Z` from every non-test team's accepted-submission count.
    pub fn compute(counts: &[i64]) -> f64 {
        let m = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
        let z: f64 = counts.iter().map(|&k| (k as f64 / m).sqrt()).sum();
        z.max(FLOOR)
    }

    async fn refresh(&self, db: &Arc<Client>) -> anyhow::Result<()> {
        let counts: Vec<i64> = db
            .accepted_counts_by_team()
            .await?
            .into_iter()
            .map(|(_, k)| k)
            .collect();
        self.store(Self::compute(&counts));
        Ok(())
    }

    /// Spawns the named background task that keeps `current()` fresh —
    /// spec.md §5's "1 teams-base updater loop (optional)".
    pub fn spawn_updater(
        self: Arc<Self>,
        db: Arc<Client>,
        tick: Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.refresh(&db).await {
                            log::error!("teams-base update failed: {e}");
                        }
                    }
                    _ = shutdown.changed() => {
                        log::info!("teams-base updater shutting down");
                        return;
                    }
                }
            }
        })
    }
}

impl TeamsBase for NonLinear {
    fn current(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_applies_with_no_submissions() {
        assert_eq!(NonLinear::compute(&[]), 21.0);
        assert_eq!(NonLinear::compute(&[0, 0, 0]), 21.0);
    }

    #[test]
    fn early_contest_approaches_sqrt_n() {
        // All teams tied at k=1: Z = n * sqrt(1/1) = n, floored at 21.
        let counts = vec![1; 30];
        assert_eq!(NonLinear::compute(&counts), 30.0);
    }

    #[test]
    fn grows_slower_than_team_count_once_teams_pull_ahead() {
        let mut counts = vec![1i64; 50];
        counts[0] = 40;
        let z = NonLinear::compute(&counts);
        assert!(z < 50.0);
        assert!(z > 21.0);
    }

    #[test]
    fn static_reports_configured_constant() {
        let base = Static::configured(42.0);
        assert_eq!(base.current(), 42.0);
    }
}
