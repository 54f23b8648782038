//! Photo Sorter - Interactive photo and video folder maintenance
//!
//! Menu-driven CLI that converts camera images, sorts media into a dated
//! folder hierarchy, repairs timestamps and checks file names.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use photo_sorter::output::write_hint;
use photo_sorter::{
    App, CancellationToken, Cli, DirectoryValidator, LocalEngine, Prompter, Settings, init_locale,
};
use rust_i18n::t;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// Initialize i18n for this binary
rust_i18n::i18n!("locales", fallback = "en");

fn main() -> Result<()> {
    // Initialize locale based on system settings
    init_locale();

    let cli = Cli::parse();

    // Get the executable directory for Config and Log directories
    let exe_dir = get_executable_dir()?;
    let settings = cli.merge_with_settings(Settings::discover(cli.settings.as_deref(), &exe_dir)?);

    let log_path = get_log_path(&settings, &exe_dir);
    let _guard = setup_logging(&settings, &log_path)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Photo Sorter starting"
    );
    if settings.verbose {
        info!(?settings, "Settings loaded");
    }
    info!(log_file = %log_path.display(), "Log file location");

    configure_thread_pool(settings.threads);

    let token = CancellationToken::new();
    install_interrupt_handler(token.clone());

    let prompter = Prompter::new(io::stdin().lock(), io::stdout(), DirectoryValidator)
        .with_max_read_failures(settings.max_read_failures);
    let engine = LocalEngine::with_cancellation(token);
    let mut app = App::new(engine, prompter, io::stdout()).with_banner(settings.show_banner);

    match cli.operation {
        Some(operation) => {
            app.run_single(operation)?;
        }
        None => app.run()?,
    }

    info!("Session complete");
    let _ = write_hint(
        &mut io::stdout(),
        &t!("log_saved_to", path = log_path.display().to_string()),
    );

    Ok(())
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Timestamped log file inside the configured log directory
fn get_log_path(settings: &Settings, exe_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    settings
        .log_dir_or(exe_dir)
        .join(format!("PhotoSorter_{}.log", timestamp))
}

/// Setup file-only logging; the terminal belongs to the prompts
fn setup_logging(settings: &Settings, log_path: &Path) -> Result<WorkerGuard> {
    let level = if settings.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if settings.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .init();
    }

    Ok(guard)
}

/// Ctrl-C cancels the running job, or exits when no job is running
fn install_interrupt_handler(token: CancellationToken) {
    let installed = ctrlc::set_handler(move || {
        if token.interrupt() {
            warn!("Interrupt received, cancelling the running job");
        } else {
            info!("Interrupt received at a prompt, exiting");
            std::process::exit(130);
        }
    });

    if let Err(e) = installed {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }
}

/// Size the global rayon pool (0 keeps rayon's default)
fn configure_thread_pool(threads: usize) {
    if threads == 0 {
        return;
    }

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!(error = %e, threads, "Failed to configure thread pool");
    }
}
