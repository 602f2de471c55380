//! The HTTP/websocket routes of spec.md §4.8/§6: task view, flag submit,
//! the anonymous and authenticated static scoreboard/task renders, the
//! JSON export, and the three websocket upgrades.
//!
//! Grounded on `crates/server/src/hosting/handlers.rs` (the `actix_ws::handle`
//! upgrade idiom) and `.../analysis/handlers.rs` (`match` over parsed input,
//! explicit `HttpResponse::BadRequest`/`::InternalServerError` branches).
use crate::Engine;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use ctf_auth::AuthedTeam;
use ctf_auth::MaybeTeam;
use ctf_auth::SESSION_COOKIE;
use ctf_core::Language;
use ctf_core::Team;
use ctf_core::Unique;
use ctf_core::ID;
use ctf_database::CategoryRepository;
use ctf_database::SubmissionRepository;
use ctf_database::TaskRepository;
use ctf_database::TeamRepository;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use tokio_postgres::Client;

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::TemporaryRedirect()
        .insert_header(("Location", location))
        .finish()
}

/// Catches an unmapped route or an unsupported method on a mapped one — the
/// `ProtocolViolation` case of spec.md §7 ("wrong HTTP method, malformed
/// id"). Redirects to root rather than surfacing actix-web's default 404.
pub async fn protocol_violation() -> impl Responder {
    redirect("/")
}

/// `web::QueryConfig` error handler: a request missing (or malformed beyond
/// what `id: String` can absorb) a query parameter `task_view`/`flag_submit`
/// need fails actix-web's own extraction before the handler body runs. Also
/// a `ProtocolViolation` (spec.md §7) — redirect to root instead of
/// surfacing the framework's default 400.
pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    actix_web::error::InternalError::from_response(err, redirect("/")).into()
}

#[derive(Deserialize)]
pub struct AuthForm {
    token: String,
}

/// `POST /auth.php`: exchanges a team's bearer token for a session cookie
/// (spec.md §6). Unknown tokens redirect back to the login page rather than
/// leaking whether a token exists.
pub async fn auth(db: web::Data<Arc<Client>>, form: web::Form<AuthForm>) -> impl Responder {
    match db.get_team_by_token(&form.token).await {
        Ok(Some(team)) => match ctf_auth::issue_session(db.get_ref(), team.id()).await {
            Ok(session) => HttpResponse::Found()
                .insert_header(("Location", "/"))
                .cookie(
                    actix_web::cookie::Cookie::build(SESSION_COOKIE, session.token().to_string())
                        .path("/")
                        .http_only(true)
                        .finish(),
                )
                .finish(),
            Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
        },
        Ok(None) => redirect("/auth.html"),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

#[derive(Deserialize)]
pub struct TaskQuery {
    id: String,
}

/// `GET /task?id=N`: renders the task detail when the task is visible and
/// the caller is authenticated; otherwise redirects (spec.md §4.8). A team
/// that has already solved it gets an "already solved" marker instead of
/// the submit form. A malformed `id` is a `ProtocolViolation`
/// (spec.md §7) — redirect to root rather than surface a raw 400.
pub async fn task_view(
    engine: web::Data<Arc<Engine>>,
    team: AuthedTeam,
    query: web::Query<TaskQuery>,
) -> impl Responder {
    let team_id = team.team();
    let Ok(uuid) = query.id.parse::<uuid::Uuid>() else {
        return redirect("/");
    };
    let task_id: ID<ctf_core::Task> = ID::from(uuid);
    let task = match engine.db.get_task(task_id).await {
        Ok(Some(task)) if task.is_visible() => task,
        Ok(_) => return redirect("/"),
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let already_solved = match engine.db.has_accepted(team_id, task_id).await {
        Ok(v) => v,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let price = match engine.price_of(task_id).await {
        Ok(p) => p,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let form = if already_solved {
        "<p class=\"already-solved\">already solved</p>".to_string()
    } else {
        format!(
            "<form method=\"post\" action=\"/flag?id={}\"><input name=\"flag\"><button>submit</button></form>",
            task_id
        )
    };
    HttpResponse::Ok().content_type("text/html").body(format!(
        "<h1>{}</h1><p>{}</p><p>price: {}</p>{}",
        task.name(Language::Primary),
        task.description(Language::Primary),
        price,
        form
    ))
}

#[derive(Deserialize)]
pub struct FlagQuery {
    id: String,
}

#[derive(Deserialize)]
pub struct FlagForm {
    flag: String,
}

/// `POST /flag?id=N`: delegates to `ctf_submission::solve`, applies the
/// submit-rate delay, then renders a solved/invalid page — spec.md §4.8.
/// Logs `(teamId, taskId, flag, outcome)`. A malformed `id` is a
/// `ProtocolViolation` (spec.md §7) — redirect to root.
pub async fn flag_submit(
    engine: web::Data<Arc<Engine>>,
    team: AuthedTeam,
    query: web::Query<FlagQuery>,
    form: web::Form<FlagForm>,
) -> impl Responder {
    let team_id = team.team();
    let Ok(uuid) = query.id.parse::<uuid::Uuid>() else {
        return redirect("/");
    };
    let task_id: ID<ctf_core::Task> = ID::from(uuid);
    let outcome = ctf_submission::solve(
        &engine.db,
        team_id,
        task_id,
        &form.flag,
        engine.window,
        engine.open_timeout,
    )
    .await;
    tokio::time::sleep(engine.flag_timeout).await;
    match outcome {
        Ok(outcome) => {
            let flag = form.flag.as_str();
            log::info!("submission team={team_id} task={task_id} flag={flag:?} outcome={outcome:?}");
            let body = if outcome.accepted() {
                "<p class=\"solved\">correct</p>"
            } else {
                "<p class=\"invalid\">incorrect</p>"
            };
            HttpResponse::Ok().content_type("text/html").body(body)
        }
        Err(e) => {
            log::error!("submission team={team_id} task={task_id} failed: {e}");
            HttpResponse::InternalServerError().body("submission failed")
        }
    }
}

/// `GET /outer-scoreboard`: anonymous static render, `teamId = -1` — no
/// self-highlight (spec.md §4.8).
pub async fn outer_scoreboard(engine: web::Data<Arc<Engine>>) -> impl Responder {
    let standings = engine.scoreboard.snapshot().await;
    let html = ctf_push::render::render_scoreboard(&standings, None);
    HttpResponse::Ok().content_type("text/html").body(html)
}

/// `GET /tasks.html`: authenticated static render of the task grid, the
/// initial payload before the `/tasks` websocket takes over (spec.md §4.8).
pub async fn tasks_html(engine: web::Data<Arc<Engine>>, team: AuthedTeam) -> impl Responder {
    render_tasks_for(engine.get_ref().as_ref(), team.team()).await
}

/// `GET /`: authenticated static render (scoreboard, initial payload before
/// the `/scoreboard` websocket takes over).
pub async fn index(engine: web::Data<Arc<Engine>>, team: AuthedTeam) -> impl Responder {
    let team_id = team.team();
    let standings = engine.scoreboard.snapshot().await;
    let html = ctf_push::render::render_scoreboard(&standings, Some(team_id));
    HttpResponse::Ok().content_type("text/html").body(html)
}

async fn render_tasks_for(engine: &Engine, team_id: ID<Team>) -> HttpResponse {
    let categories = match engine.db.list_categories().await {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let tasks = match engine.db.list_tasks().await {
        Ok(t) => t,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let solved: std::collections::HashSet<_> = match engine.db.list_submissions(team_id).await {
        Ok(subs) => subs.into_iter().filter(|s| s.accepted()).map(|s| s.task_id()).collect(),
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let mut prices = std::collections::HashMap::new();
    for task in &tasks {
        match engine.price_of(task.id()).await {
            Ok(p) => {
                prices.insert(task.id(), p);
            }
            Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
        }
    }
    let html = ctf_push::render::render_tasks(
        &categories,
        &tasks,
        &|id| *prices.get(&id).unwrap_or(&0),
        &solved,
        Language::Primary,
    );
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[derive(Serialize)]
struct ExportStanding {
    pos: usize,
    team: String,
    score: i64,
    #[serde(rename = "lastAccept", skip_serializing_if = "Option::is_none")]
    last_accept: Option<i64>,
}

#[derive(Serialize)]
struct ExportDocument {
    standings: Vec<ExportStanding>,
}

/// `GET /export`: the JSON standings document (spec.md §6).
pub async fn export(engine: web::Data<Arc<Engine>>) -> impl Responder {
    let standings = engine.scoreboard.snapshot().await;
    let epoch = chrono::DateTime::from_timestamp(0, 0).expect("epoch is representable");
    let doc = ExportDocument {
        standings: standings
            .iter()
            .enumerate()
            .map(|(i, s)| ExportStanding {
                pos: i + 1,
                team: s.team_name.clone(),
                score: s.score,
                last_accept: if s.last_accept > epoch {
                    Some(s.last_accept.timestamp())
                } else {
                    None
                },
            })
            .collect(),
    };
    HttpResponse::Ok().json(doc)
}

/// `GET /info` websocket upgrade: the contest phase heartbeat channel.
pub async fn ws_info(engine: web::Data<Arc<Engine>>, req: HttpRequest, body: web::Payload) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            let (start, end) = (engine.window.start, engine.window.end);
            let tick = engine.info_timeout;
            actix_web::rt::spawn(ctf_push::run_info(session, stream, tick, start, end));
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}

/// `GET /scoreboard` websocket upgrade.
pub async fn ws_scoreboard(
    engine: web::Data<Arc<Engine>>,
    team: MaybeTeam,
    req: HttpRequest,
    body: web::Payload,
) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            let scoreboard = engine.scoreboard.clone();
            let tick = engine.scoreboard_timeout;
            let viewer = team.team();
            actix_web::rt::spawn(ctf_push::run_scoreboard(session, stream, tick, scoreboard, viewer));
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}

#[derive(Deserialize)]
pub struct LangQuery {
    #[serde(default)]
    lang: Option<String>,
}

/// `GET /tasks` websocket upgrade.
pub async fn ws_tasks(
    engine: web::Data<Arc<Engine>>,
    team: MaybeTeam,
    query: web::Query<LangQuery>,
    req: HttpRequest,
    body: web::Payload,
) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            let db = engine.db.clone();
            let tick = engine.tasks_timeout;
            let teams_base = engine.teams_base.clone();
            let thresholds = engine.thresholds;
            let viewer = team.team();
            let lang = match query.lang.as_deref() {
                Some("en") => Language::English,
                _ => Language::Primary,
            };
            actix_web::rt::spawn(ctf_push::run_tasks(
                session, stream, tick, db, teams_base, thresholds, viewer, lang,
            ));
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}
