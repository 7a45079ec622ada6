use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use arcade_showdown::audio_system::{CuePlayer, CueSink, SilentCues};
use arcade_showdown::config::APP_DIR_NAME;
use arcade_showdown::messaging::Notification;
use arcade_showdown::transport::{
    open_serial_pair, LineSource, SerialLineSink, SerialLineSource, StdinLineSource,
};
use arcade_showdown::{
    AppResult, Arcade, Cli, Config, LoopExit, LoopRole, Supervisor, SystemClock,
    LOG_TARGET_STARTUP,
};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver};
use sysinfo::System;

/// Initialize tracing with file rotation
///
/// Logs go to `<config_dir>/ArcadeShowdown/logs/arcade-showdown.YYYY-MM-DD.log`
/// and to the console. `RUST_LOG` wins over `--debug`.
fn initialize_tracing(debug: bool) -> PathBuf {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "arcade-showdown.log");

    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    log_dir
}

fn log_runtime_environment(config: &Config) {
    let mut system = System::new();
    system.refresh_cpu();

    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());
    let architecture = std::env::consts::ARCH;

    tracing::info!(target: LOG_TARGET_STARTUP, "Starting Arcade Showdown v{} on ({})", version, architecture);
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {}), {} cores", os_name, kernel, system.cpus().len());
    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Controller: {}, score board: {}, clock board: {}",
        if config.test_mode { "stdin".to_string() } else { format!("{} @ {}", config.port_read, config.baudrate_read) },
        config.port_write.as_deref().unwrap_or("none"),
        config.port_clock.as_deref().unwrap_or("none"),
    );
}

fn load_config(cli: &Cli) -> AppResult<Config> {
    let path = cli.config_path();
    let config = cli.apply(Config::load_or_default(&path)?);
    config.validate()?;
    Ok(config)
}

fn build_cues(config: &Config) -> Arc<dyn CueSink> {
    if !config.audio_enabled {
        tracing::info!("Audio disabled");
        return Arc::new(SilentCues);
    }

    match CuePlayer::spawn(&config.audio_dir) {
        Ok(player) => {
            if player.loaded_cues().is_empty() {
                tracing::warn!("No cue files found in {}", config.audio_dir.display());
            } else {
                tracing::debug!("Loaded cues: {:?}", player.loaded_cues());
            }
            Arc::new(player)
        }
        Err(err) => {
            tracing::warn!("Audio unavailable, continuing without sound: {}", err);
            Arc::new(SilentCues)
        }
    }
}

/// Log every notification as one JSON line
fn spawn_notification_logger(rx: Receiver<Notification>) -> AppResult<()> {
    thread::Builder::new()
        .name("notifications".to_string())
        .spawn(move || {
            for notification in rx.iter() {
                match notification.to_json() {
                    Ok(json) => tracing::info!(target: "arcade_showdown::notify", "{}", json),
                    Err(err) => tracing::warn!("Failed to encode {}: {}", notification.description(), err),
                }
            }
        })
        .context("Failed to start notification logger")?;
    Ok(())
}

fn report(exits: &[LoopExit]) -> ExitCode {
    let mut failed = false;
    for exit in exits {
        match &exit.result {
            Ok(()) => tracing::info!(
                "{} loop on {} stopped ({} lines)",
                exit.role, exit.source, exit.stats.lines
            ),
            Err(err) => {
                failed = true;
                tracing::error!("{} loop on {} failed: {}", exit.role, exit.source, err);
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(config: Config) -> AppResult<ExitCode> {
    let timeout = config.read_timeout();
    let mut builder = Arcade::builder(Arc::new(SystemClock))
        .cues(build_cues(&config))
        .game_len(config.game_len_secs);

    if let Some(port) = &config.port_write {
        let sink = SerialLineSink::open(port, config.baudrate_write, timeout)
            .with_context(|| format!("Failed to open score board port {}", port))?;
        builder = builder.score_sink(sink);
    }

    let mut clock_source = None;
    if let Some(port) = &config.port_clock {
        let (source, sink) = open_serial_pair(port, config.baudrate_clock, timeout)
            .with_context(|| format!("Failed to open clock board port {}", port))?;
        builder = builder.clock_sink(sink);
        clock_source = Some(source);
    }

    let arcade = builder.build();
    let (notifications, _subscriber) = arcade.subscribe();
    spawn_notification_logger(notifications)?;

    let primary: Box<dyn LineSource> = if config.test_mode {
        if std::io::stdin().is_terminal() {
            Box::new(StdinLineSource::new())
        } else {
            Box::new(StdinLineSource::quiet())
        }
    } else {
        Box::new(
            SerialLineSource::open(&config.port_read, config.baudrate_read, timeout)
                .with_context(|| format!("Failed to open controller port {}", config.port_read))?,
        )
    };

    let supervisor = Supervisor::new();
    supervisor.spawn(
        arcade
            .ingest_loop(LoopRole::Primary, primary)
            .echo_lines(config.debug),
    )?;
    if let Some(source) = clock_source {
        supervisor.spawn(
            arcade
                .ingest_loop(LoopRole::Clock, source)
                .echo_lines(config.debug),
        )?;
    }

    let (interrupt_tx, interrupt_rx) = bounded(1);
    let stop = supervisor.stop_handle();
    ctrlc::set_handler(move || {
        tracing::info!("Shutting down...");
        stop.stop();
        let _ = interrupt_tx.try_send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    let grace = timeout + Duration::from_millis(500);
    let exits = match supervisor.wait_first_exit_or(&interrupt_rx)? {
        Some(first) => supervisor.finish(first, grace),
        None => supervisor.shutdown(grace),
    };

    let status = arcade.status();
    tracing::info!(
        "Final status: score {}, mode {}",
        status.score, status.mode
    );

    Ok(report(&exits))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("✗ Failed to load config: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let log_dir = initialize_tracing(config.debug);
    tracing::info!("Log directory: {}", log_dir.display());
    log_runtime_environment(&config);

    match run(config) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
