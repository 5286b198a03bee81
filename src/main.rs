//! Photo Importer - batch photo sorting into year/month folders
//!
//! CLI front end around the import pipeline: classify photos in a source
//! directory, resolve capture dates through exiftool and copy every dated
//! photo to YYYY/MM/ under two target roots.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use photo_importer::{Cli, Config, Error, ProgressEvent, Runner};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Styling helpers for the terminal summary.

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(&format!("{}\n", "─".repeat(60))));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_stat(key: &str, value: &str, color: Color) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = style(value).with(color).bold();
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_failure(source: &str, msg: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(msg).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }

    /// In-place progress line, overwritten on every update.
    pub fn print_progress(completed: usize, total: usize, percent: u8) {
        let _ = stdout().execute(Print(format!(
            "\rProgress: {percent:>3}% ({completed}/{total} copies)"
        )));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_sample_config {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    // Get the executable directory for the Log directory
    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir, &cli);

    let _guard = setup_logging(&cli, &log_path)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Photo Importer starting"
    );

    let config = load_config(&cli)?;
    if config.verbose {
        info!(?config, "Configuration loaded");
    }
    info!(log_file = %log_path.display(), "Log file location");

    let runner = Runner::new(config);
    let handle = match runner.start() {
        Ok(handle) => handle,
        Err(Error::SourceEmpty { path }) => {
            cli_output::print_warning(&format!(
                "No entries found in {}, nothing to do",
                path.display()
            ));
            info!(source = %path.display(), "Source directory empty, nothing to do");
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "Run could not start");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Consume progress events on this thread; the worker never blocks on us.
    for event in handle.events().iter() {
        match event {
            ProgressEvent::Progress {
                completed,
                total,
                percent,
                ..
            } => cli_output::print_progress(completed, total, percent),
            ProgressEvent::Done { .. } => cli_output::print_blank(),
        }
    }

    let report = handle.wait();
    info!(summary = %report.summary(), "Run complete");

    print_report(&report);
    cli_output::print_separator();
    cli_output::print_stat("Log file", &log_path.display().to_string(), cli_output::CliTheme::ACCENT);

    Ok(())
}

fn print_report(report: &photo_importer::RunReport) {
    use cli_output::*;

    print_separator();
    print_stat("Entries", &report.total_entries.to_string(), CliTheme::ACCENT);
    print_stat("Copied", &report.copied.to_string(), CliTheme::SUCCESS);
    print_stat("Failed", &report.failed.to_string(), CliTheme::ERROR);
    print_stat(
        "Skipped (not a photo)",
        &report.skipped_not_photo.to_string(),
        CliTheme::WARNING,
    );
    print_stat(
        "Skipped (no date)",
        &report.skipped_no_date.to_string(),
        CliTheme::WARNING,
    );
    if report.resolver_errors > 0 {
        print_stat(
            "Resolver errors",
            &report.resolver_errors.to_string(),
            CliTheme::ERROR,
        );
    }

    if !report.failures.is_empty() {
        print_blank();
        print_error(&format!("{} failure(s):", report.failures.len()));
        for failure in &report.failures {
            let detail = match &failure.target_root {
                Some(root) => format!("→ {}: {}", root.display(), failure.message),
                None => failure.message.clone(),
            };
            print_failure(&failure.source.display().to_string(), &detail);
        }
    }

    if report.cancelled {
        print_blank();
        print_warning("Run was cancelled before all files were processed");
    }
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path based on config file or timestamp
fn get_log_path(exe_dir: &Path, cli: &Cli) -> PathBuf {
    let log_dir = exe_dir.join("Log");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(config_name) = cli.config_name() {
        log_dir.join(format!("{}_{}.log", config_name, timestamp))
    } else {
        log_dir.join(format!("Import_{}.log", timestamp))
    }
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
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

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(Some(guard))
}
