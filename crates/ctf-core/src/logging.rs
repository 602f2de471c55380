//! Dual terminal+file logging, initialized once at process start.

/// Initialize dual logging (terminal + file) with DEBUG level to file, INFO
/// to terminal.
///
/// `log_file` is `cfg.log_file` from `config.toml`. When `None`, falls back
/// to a timestamped file under `logs/` (creating that directory).
#[cfg(feature = "server")]
pub fn log(log_file: Option<&str>) {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let path = match log_file {
        Some(path) => path.to_string(),
        None => {
            std::fs::create_dir_all("logs").expect("create logs directory");
            let time = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time moves slow")
                .as_secs();
            format!("logs/{}.log", time)
        }
    };
    if let Some(parent) = std::path::Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).expect("create log file parent directory");
        }
    }
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(&path).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register a Ctrl+C handler for immediate (non-graceful) termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("interrupt received, shutting down");
        std::process::exit(0);
    });
}
