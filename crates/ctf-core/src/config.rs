//! Typed configuration, mirroring the TOML fields in spec §6.
//!
//! Loading a file from disk is a thin convenience wrapper; validating and
//! parsing arbitrary operator-supplied task/team files stays out of scope
//! (spec.md §1) — the core only needs the *shape* of configuration to
//! construct the engine.
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration, matching the original's `config.Config`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub log_file: Option<String>,
    pub task_dir: Option<String>,
    pub database: DatabaseConfig,
    pub scoreboard: ScoreboardConfig,
    pub websocket_timeout: WebsocketTimeoutConfig,
    pub task_price: TaskPriceConfig,
    pub game: GameConfig,
    pub flag: FlagConfig,
    pub task: TaskConfig,
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub connection: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: i32,
    #[serde(default)]
    pub safe_reinit: bool,
}

fn default_max_connections() -> i32 {
    16
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardConfig {
    pub www_path: Option<String>,
    pub addr: String,
    #[serde(with = "duration_secs")]
    pub recalc_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebsocketTimeoutConfig {
    #[serde(with = "duration_secs")]
    pub info: Duration,
    #[serde(with = "duration_secs")]
    pub scoreboard: Duration,
    #[serde(with = "duration_secs")]
    pub tasks: Duration,
}

/// Integer-percent fields, converted to fractions (percent / 100) on read —
/// spec.md §9 Open Question 4, frozen per DESIGN.md O2.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskPriceConfig {
    #[serde(default)]
    pub use_teams_base: bool,
    #[serde(default)]
    pub teams_base: i64,
    #[serde(default)]
    pub use_non_linear: bool,
    pub p500: i64,
    pub p400: i64,
    pub p300: i64,
    pub p200: i64,
}

impl TaskPriceConfig {
    pub fn t500(&self) -> f64 {
        self.p500 as f64 / 100.0
    }
    pub fn t400(&self) -> f64 {
        self.p400 as f64 / 100.0
    }
    pub fn t300(&self) -> f64 {
        self.p300 as f64 / 100.0
    }
    pub fn t200(&self) -> f64 {
        self.p200 as f64 / 100.0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlagConfig {
    #[serde(with = "duration_secs")]
    pub send_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(with = "duration_secs")]
    pub open_timeout: Duration,
    #[serde(default)]
    pub auto_open: bool,
    #[serde(with = "duration_secs")]
    pub auto_open_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub token: String,
    #[serde(default)]
    pub test: bool,
}

impl Config {
    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let cfg = toml::from_str(&text)?;
        Ok(cfg)
    }
}

/// Seconds-as-integer (de)serialization for `Duration`, generalizing the
/// original's bespoke `_duration` TOML type (`config.go`) without adding a
/// dependency beyond `serde`.
mod duration_secs {
    use serde::Deserialize;
    use serde::Deserializer;
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        log_file = "henhouse.log"
        task_dir = "tasks"

        [database]
        connection = "postgres://localhost/henhouse"

        [scoreboard]
        addr = "0.0.0.0:8080"
        recalc_timeout = 5

        [websocket_timeout]
        info = 1
        scoreboard = 2
        tasks = 2

        [task_price]
        use_teams_base = true
        use_non_linear = true
        p500 = 10
        p400 = 15
        p300 = 30
        p200 = 50

        [game]
        start = 2026-01-01T10:00:00Z
        end   = 2026-01-02T10:00:00Z

        [flag]
        send_timeout = 3

        [task]
        open_timeout = 60
        auto_open = true
        auto_open_timeout = 1800

        [[teams]]
        name = "team-a"
        token = "abc123"
    "#;

    #[test]
    fn parses_sample_config() {
        let cfg: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.teams.len(), 1);
        assert_eq!(cfg.teams[0].name, "team-a");
        assert!(!cfg.teams[0].test);
        assert_eq!(cfg.task_price.t500(), 0.10);
        assert_eq!(cfg.task_price.t400(), 0.15);
        assert_eq!(cfg.task.open_timeout, Duration::from_secs(60));
        assert!(cfg.task.auto_open);
    }
}
