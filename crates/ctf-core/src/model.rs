//! Domain entities shared by every other crate in the workspace.
//!
//! Modeled directly on spec §3: each entity pairs with a typed [`ID`] via
//! the [`Unique`] trait across the contest's six tables.
use crate::ID;
use crate::Unique;
use chrono::DateTime;
use chrono::Utc;
use std::sync::Arc;

/// A themed column in the task grid.
#[derive(Debug, Clone)]
pub struct Category {
    id: ID<Category>,
    name: String,
}

impl Category {
    pub fn new(id: ID<Category>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Unique for Category {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// A bilingual text pair, falling back to the other language when one side
/// is missing — generalized from the original's `Name`/`NameEn` fallback
/// rule (out-of-scope ingestion detail, kept here since Task carries it).
#[derive(Debug, Clone, Default)]
pub struct Bilingual {
    pub primary: String,
    pub english: String,
}

impl Bilingual {
    pub fn new(primary: impl Into<String>, english: impl Into<String>) -> Self {
        let primary = primary.into();
        let english = english.into();
        if primary.is_empty() {
            Self {
                primary: english.clone(),
                english,
            }
        } else if english.is_empty() {
            Self {
                english: primary.clone(),
                primary,
            }
        } else {
            Self { primary, english }
        }
    }
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::Primary => &self.primary,
            Language::English => &self.english,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Primary,
    English,
}

/// Error compiling a task's flag pattern — a programming error in task
/// authoring (spec.md §7 `PatternCompile`), not a runtime submission failure.
/// The workspace has no `thiserror` dependency, so `Display`/`Error` are
/// implemented by hand.
#[derive(Debug)]
pub struct PatternError(pub String);

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid flag pattern: {}", self.0)
    }
}
impl std::error::Error for PatternError {}

/// A puzzle belonging to one category at a fixed difficulty level.
#[derive(Debug, Clone)]
pub struct Task {
    id: ID<Task>,
    category_id: ID<Category>,
    level: u32,
    name: Bilingual,
    description: Bilingual,
    tags: Vec<String>,
    author: String,
    flag_pattern: String,
    flag_regex: Arc<regex::Regex>,
    opened: bool,
    force_closed: bool,
    opened_at: Option<DateTime<Utc>>,
    base_price: i64,
    shared: bool,
    max_share_price: i64,
    min_share_price: i64,
}

impl Task {
    /// Constructs a task, eagerly compiling the anchored flag regex
    /// (spec.md §9: "Regex as a capability" — a bad pattern fails
    /// construction, not each submission).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ID<Task>,
        category_id: ID<Category>,
        level: u32,
        name: Bilingual,
        description: Bilingual,
        tags: Vec<String>,
        author: impl Into<String>,
        flag_pattern: impl Into<String>,
        force_closed: bool,
        base_price: i64,
        shared: bool,
        max_share_price: i64,
        min_share_price: i64,
    ) -> Result<Self, PatternError> {
        let flag_pattern = flag_pattern.into();
        let anchored = format!("^({})$", flag_pattern);
        let flag_regex = regex::Regex::new(&anchored)
            .map_err(|e| PatternError(format!("{flag_pattern}: {e}")))?;
        Ok(Self {
            id,
            category_id,
            level,
            name,
            description,
            tags,
            author: author.into(),
            flag_pattern,
            flag_regex: Arc::new(flag_regex),
            opened: false,
            force_closed,
            opened_at: None,
            base_price,
            shared,
            max_share_price,
            min_share_price,
        })
    }

    pub fn category_id(&self) -> ID<Category> {
        self.category_id
    }
    pub fn level(&self) -> u32 {
        self.level
    }
    pub fn name(&self, lang: Language) -> &str {
        self.name.get(lang)
    }
    pub fn description(&self, lang: Language) -> &str {
        self.description.get(lang)
    }
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
    pub fn author(&self) -> &str {
        &self.author
    }
    pub fn flag_pattern(&self) -> &str {
        &self.flag_pattern
    }
    /// Whether `candidate` matches the anchored flag pattern exactly.
    pub fn matches(&self, candidate: &str) -> bool {
        self.flag_regex.is_match(candidate)
    }
    pub fn opened(&self) -> bool {
        self.opened
    }
    pub fn force_closed(&self) -> bool {
        self.force_closed
    }
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }
    /// A task is visible to players only if opened and not administratively
    /// force-closed — spec.md §3 Invariant 4.
    pub fn is_visible(&self) -> bool {
        self.opened && !self.force_closed
    }
    pub fn base_price(&self) -> i64 {
        self.base_price
    }
    pub fn shared(&self) -> bool {
        self.shared
    }
    pub fn max_share_price(&self) -> i64 {
        self.max_share_price
    }
    pub fn min_share_price(&self) -> i64 {
        self.min_share_price
    }
    /// Applies a repository-confirmed open, setting `openedAt` — spec.md §3
    /// Invariant 3 (`opened=true` implies `openedAt` is set).
    pub fn mark_opened(&mut self, at: DateTime<Utc>) {
        self.opened = true;
        self.opened_at = Some(at);
    }
}

impl Unique for Task {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// The scoring unit; identifies itself by a single bearer token.
#[derive(Debug, Clone)]
pub struct Team {
    id: ID<Team>,
    name: String,
    description: String,
    token: String,
    test: bool,
}

impl Team {
    pub fn new(
        id: ID<Team>,
        name: impl Into<String>,
        description: impl Into<String>,
        token: impl Into<String>,
        test: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            token: token.into(),
            test,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn token(&self) -> &str {
        &self.token
    }
    /// Test teams are never counted in scoreboard or pricing (spec.md §3).
    pub fn is_test(&self) -> bool {
        self.test
    }
}

impl Unique for Team {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Append-only audit record; one row per attempt, including rejections.
#[derive(Debug, Clone)]
pub struct Submission {
    id: ID<Submission>,
    team_id: ID<Team>,
    task_id: ID<Task>,
    submitted_flag: String,
    accepted: bool,
    timestamp: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        id: ID<Submission>,
        team_id: ID<Team>,
        task_id: ID<Task>,
        submitted_flag: impl Into<String>,
        accepted: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            team_id,
            task_id,
            submitted_flag: submitted_flag.into(),
            accepted,
            timestamp,
        }
    }
    pub fn team_id(&self) -> ID<Team> {
        self.team_id
    }
    pub fn task_id(&self) -> ID<Task> {
        self.task_id
    }
    pub fn submitted_flag(&self) -> &str {
        &self.submitted_flag
    }
    pub fn accepted(&self) -> bool {
        self.accepted
    }
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Unique for Submission {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Latest-wins per-team score snapshot.
#[derive(Debug, Clone)]
pub struct ScoreSnapshot {
    id: ID<ScoreSnapshot>,
    team_id: ID<Team>,
    score: i64,
    timestamp: DateTime<Utc>,
}

impl ScoreSnapshot {
    pub fn new(id: ID<ScoreSnapshot>, team_id: ID<Team>, score: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            team_id,
            score,
            timestamp,
        }
    }
    pub fn team_id(&self) -> ID<Team> {
        self.team_id
    }
    pub fn score(&self) -> i64 {
        self.score
    }
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Unique for ScoreSnapshot {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// A logged-in team's session, mapping an opaque cookie value to a team.
#[derive(Debug, Clone)]
pub struct Session {
    id: ID<Session>,
    team_id: ID<Team>,
    token: String,
    timestamp: DateTime<Utc>,
}

impl Session {
    pub fn new(id: ID<Session>, team_id: ID<Team>, token: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            team_id,
            token: token.into(),
            timestamp,
        }
    }
    pub fn team_id(&self) -> ID<Team> {
        self.team_id
    }
    pub fn token(&self) -> &str {
        &self.token
    }
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Unique for Session {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(pattern: &str) -> Result<Task, PatternError> {
        Task::new(
            ID::default(),
            ID::default(),
            1,
            Bilingual::new("name", ""),
            Bilingual::new("", "desc en"),
            vec![],
            "author",
            pattern,
            false,
            500,
            false,
            0,
            0,
        )
    }

    #[test]
    fn bilingual_falls_back() {
        let b = Bilingual::new("", "english only");
        assert_eq!(b.get(Language::Primary), "english only");
        assert_eq!(b.get(Language::English), "english only");
    }

    #[test]
    fn flag_is_anchored_both_ends() {
        let t = task("flag\\{[a-z]+\\}").unwrap();
        assert!(t.matches("flag{abc}"));
        assert!(!t.matches("xflag{abc}"));
        assert!(!t.matches("flag{abc}x"));
        assert!(!t.matches("FLAG{abc}"));
    }

    #[test]
    fn invalid_pattern_fails_construction() {
        assert!(task("[unterminated").is_err());
    }

    #[test]
    fn visible_requires_opened_and_not_force_closed() {
        let mut t = task("flag").unwrap();
        assert!(!t.is_visible());
        t.mark_opened(Utc::now());
        assert!(t.is_visible());
    }
}
