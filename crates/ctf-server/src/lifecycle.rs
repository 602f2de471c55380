//! Startup sequencing and shutdown (spec.md §4.9): connect, migrate, prime
//! the scoreboard cache, launch background loops, wait for `gameStart`,
//! open first-level tasks, then bind the HTTP listener.
//!
//! Grounded on `bin/backend/src/main.rs` for overall sequencing; the
//! `gameStart` wait is a single `tokio::time::sleep` to the deadline
//! (spec.md §9 Open Question 2, resolved against the rejected 1-second
//! polling loop — see DESIGN.md).
use crate::Engine;
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use chrono::Utc;
use ctf_core::config::Config;
use ctf_database::TeamRepository;
use ctf_pricing::NonLinear;
use ctf_pricing::Static;
use ctf_pricing::TeamsBase;
use ctf_scoreboard::Scoreboard;
use ctf_submission::GameWindow;
use std::sync::Arc;

/// Result of selecting a `TeamsBase` strategy: the trait object every
/// reader uses, plus (only for the nonlinear strategy) the concrete handle
/// its background updater needs.
struct TeamsBaseChoice {
    reader: Arc<dyn TeamsBase>,
    updater: Option<Arc<NonLinear>>,
}

/// Builds the `TeamsBase` estimator named by `cfg.task_price` — spec.md
/// §4.3's three strategies, selected at startup since the choice never
/// changes mid-contest.
async fn teams_base_from(cfg: &Config, db: &Arc<tokio_postgres::Client>) -> anyhow::Result<TeamsBaseChoice> {
    if cfg.task_price.use_non_linear {
        let nonlinear = NonLinear::new();
        Ok(TeamsBaseChoice {
            reader: nonlinear.clone(),
            updater: Some(nonlinear),
        })
    } else if cfg.task_price.use_teams_base {
        Ok(TeamsBaseChoice {
            reader: Arc::new(Static::configured(cfg.task_price.teams_base as f64)),
            updater: None,
        })
    } else {
        let teams = db.list_teams().await?;
        let count = teams.iter().filter(|t| !t.is_test()).count();
        Ok(TeamsBaseChoice {
            reader: Arc::new(Static::team_count(count)),
            updater: None,
        })
    }
}

/// Waits until `target`, or returns immediately if it has already passed —
/// the redesigned alternative to a busy 1-second polling loop.
async fn wait_until(target: chrono::DateTime<Utc>) {
    let now = Utc::now();
    if target <= now {
        return;
    }
    let remaining = (target - now)
        .to_std()
        .unwrap_or(std::time::Duration::ZERO);
    log::info!("waiting {:?} for contest start", remaining);
    tokio::time::sleep(remaining).await;
}

/// Runs the full lifecycle: construct the engine, launch background loops,
/// wait for `gameStart`, and serve HTTP until the process is interrupted.
pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let db = ctf_database::db(&cfg.database.connection).await;
    ctf_database::migrate(&db).await?;

    for team in &cfg.teams {
        if db.get_team_by_token(&team.token).await?.is_none() {
            let record = ctf_core::Team::new(
                ctf_core::ID::default(),
                team.name.clone(),
                team.description.clone(),
                team.token.clone(),
                team.test,
            );
            db.create_team(&record).await?;
        }
    }

    let TeamsBaseChoice { reader: teams_base, updater: nonlinear_updater } = teams_base_from(&cfg, &db).await?;
    let thresholds = crate::thresholds_from(&cfg);
    let window = GameWindow {
        start: cfg.game.start,
        end: cfg.game.end,
    };
    let scoreboard = Scoreboard::empty();

    let engine = Arc::new(Engine {
        db: db.clone(),
        scoreboard: scoreboard.clone(),
        teams_base: teams_base.clone(),
        thresholds,
        window,
        open_timeout: cfg.task.open_timeout,
        flag_timeout: cfg.flag.send_timeout,
        info_timeout: cfg.websocket_timeout.info,
        scoreboard_timeout: cfg.websocket_timeout.scoreboard,
        tasks_timeout: cfg.websocket_timeout.tasks,
    });

    // Prime the in-memory scoreboard so early readers never see an empty cache.
    scoreboard.recompute(&db, teams_base.as_ref(), thresholds).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let _recompute = scoreboard.clone().spawn_recompute_loop(
        db.clone(),
        teams_base.clone(),
        thresholds,
        cfg.scoreboard.recalc_timeout,
        shutdown_rx.clone(),
    );

    if cfg.task.auto_open {
        let _auto_open = ctf_scheduler::spawn_idle_auto_open(
            db.clone(),
            std::time::Duration::from_secs(1),
            cfg.task.auto_open_timeout,
            shutdown_rx.clone(),
        );
    }

    if let Some(nonlinear) = nonlinear_updater {
        let _teams_base_updater =
            nonlinear.spawn_updater(db.clone(), cfg.scoreboard.recalc_timeout, shutdown_rx.clone());
    }

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            log::warn!("interrupt received, cancelling background loops");
            let _ = shutdown_tx.send(true);
        }
    });

    wait_until(window.start).await;
    ctf_scheduler::first_level_open(&db).await?;
    log::info!("contest started, first-level tasks opened");

    let addr = cfg.scoreboard.addr.clone();
    let engine_data = web::Data::new(engine);
    let db_data = web::Data::new(db);
    log::info!("binding http listener on {addr}");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
            .app_data(engine_data.clone())
            .app_data(db_data.clone())
            .app_data(web::QueryConfig::default().error_handler(crate::handlers::query_error_handler))
            .route("/auth.php", web::post().to(crate::handlers::auth))
            .route("/task", web::get().to(crate::handlers::task_view))
            .route("/flag", web::post().to(crate::handlers::flag_submit))
            .route("/outer-scoreboard", web::get().to(crate::handlers::outer_scoreboard))
            .route("/tasks.html", web::get().to(crate::handlers::tasks_html))
            .route("/export", web::get().to(crate::handlers::export))
            .route("/info", web::get().to(crate::handlers::ws_info))
            .route("/scoreboard", web::get().to(crate::handlers::ws_scoreboard))
            .route("/tasks", web::get().to(crate::handlers::ws_tasks))
            .route("/", web::get().to(crate::handlers::index))
            .default_service(web::route().to(crate::handlers::protocol_violation))
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
