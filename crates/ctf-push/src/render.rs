//! HTML fragment rendering via plain string composition — no templating
//! crate, matching the original's `resultUpdater`
//! (`examples/original_source/scoreboard/scoreboard.go`), which builds the
//! scoreboard table with bare `fmt.Sprintf` calls.
use crate::phase::format_remaining;
use crate::phase::Phase;
use chrono::Duration;
use ctf_core::Category;
use ctf_core::Language;
use ctf_core::Task;
use ctf_core::Team;
use ctf_core::Unique;
use ctf_core::Price;
use ctf_core::ID;
use ctf_scoreboard::Standing;
use std::collections::HashSet;
use std::fmt::Write;

/// Contest phase banner — the `/info` channel's payload.
pub fn render_info(phase: Phase, remaining: Duration) -> String {
    let mut out = format!(r#"<span class="btn contest-{phase}">contest {phase}</span>"#);
    if phase != Phase::Completed {
        let _ = write!(out, r#"<span class="btn btn-info">Left {}</span>"#, format_remaining(remaining));
    }
    out
}

/// Scoreboard table — the `/scoreboard` channel's payload. `viewer` marks
/// the subscriber's own row for self-highlighting; `None` (spec.md §4.8's
/// `teamId = -1` for `GET /outer-scoreboard`) highlights nothing.
pub fn render_scoreboard(standings: &[Standing], viewer: Option<ID<Team>>) -> String {
    let mut out = String::from("<thead><th>#</th><th>Team</th><th>Score</th></thead><tbody>");
    for (rank, row) in standings.iter().enumerate() {
        let highlight = if Some(row.team) == viewer { " class=\"self\"" } else { "" };
        let _ = write!(
            out,
            "<tr{highlight}><td>{}</td><td>{}</td><td>{}</td></tr>",
            rank + 1,
            html_escape(&row.team_name),
            row.score
        );
    }
    out.push_str("</tbody>");
    out
}

/// The task grid — the `/tasks` channel's payload. `solved` marks which of
/// `viewer`'s tasks already carry an accepted submission, so a solved cell
/// renders differently (spec.md §4.7: "varying per team ... and per
/// requested language").
pub fn render_tasks(
    categories: &[Category],
    tasks: &[Task],
    prices: &dyn Fn(ID<Task>) -> Price,
    solved: &HashSet<ID<Task>>,
    lang: Language,
) -> String {
    let mut out = String::from("<div class=\"grid\">");
    for category in categories {
        let _ = write!(out, "<div class=\"category\"><h3>{}</h3><ul>", html_escape(category.name()));
        let mut column: Vec<_> = tasks.iter().filter(|t| t.category_id() == category.id()).collect();
        column.sort_by_key(|t| t.level());
        for task in column {
            if !task.is_visible() {
                continue;
            }
            let price = prices(task.id());
            let state = if solved.contains(&task.id()) { "solved" } else { "open" };
            let _ = write!(
                out,
                "<li class=\"task {state}\" data-id=\"{}\">{} ({price})</li>",
                task.id(),
                html_escape(task.name(lang))
            );
        }
        out.push_str("</ul></div>");
    }
    out.push_str("</div>");
    out
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_team_names_in_scoreboard_rows() {
        let standings = vec![Standing {
            team: ID::default(),
            team_name: "<script>".to_string(),
            score: 100,
            last_accept: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        }];
        let html = render_scoreboard(&standings, None);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn info_omits_remaining_when_completed() {
        let html = render_info(Phase::Completed, Duration::zero());
        assert!(!html.contains("Left"));
    }

    #[test]
    fn info_shows_remaining_while_running() {
        let html = render_info(Phase::Running, Duration::seconds(3725));
        assert!(html.contains("01:02:05"));
    }
}
