//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start the rolling file logger once per process.
//! - Optionally mirror warnings and errors to stderr for batch runs.
//! - Record panics as log events before the default hook runs.
//!
//! # Invariants
//! - Repeated initialization with identical settings is a no-op.
//! - Reconfiguration (level, directory or stderr mirroring) is rejected.
//! - Initialization never panics.

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "fairshake";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_MESSAGE_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSettings {
    level: &'static str,
    log_dir: PathBuf,
    mirror_warnings: bool,
}

struct LoggingState {
    settings: ActiveSettings,
    _logger: LoggerHandle,
}

/// Starts file logging under `log_dir` at `level`.
///
/// With `mirror_warnings`, `warn` and `error` records are also written to
/// stderr.
///
/// # Errors
/// - Unsupported `level`.
/// - `log_dir` empty, relative, or not creatable.
/// - Logging already active with different settings.
pub fn init_logging(level: &str, log_dir: &Path, mirror_warnings: bool) -> Result<(), String> {
    let requested = ActiveSettings {
        level: normalize_level(level)?,
        log_dir: normalize_log_dir(log_dir)?,
        mirror_warnings,
    };

    if let Some(state) = LOGGING_STATE.get() {
        return compare_settings(&state.settings, &requested);
    }

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(requested.clone()))?;
    compare_settings(&state.settings, &requested)
}

/// Active `(level, log_dir)`, or `None` before initialization.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.settings.level, state.settings.log_dir.clone()))
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(settings: ActiveSettings) -> Result<LoggingState, String> {
    std::fs::create_dir_all(&settings.log_dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            settings.log_dir.display()
        )
    })?;

    let duplicate = if settings.mirror_warnings {
        Duplicate::Warn
    } else {
        Duplicate::None
    };
    let logger = Logger::try_with_str(settings.level)
        .map_err(|err| format!("invalid log level `{}`: {err}", settings.level))?
        .log_to_file(
            FileSpec::default()
                .directory(settings.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .duplicate_to_stderr(duplicate)
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();

    info!(
        "event=logging_init module=core status=ok version={} level={} log_dir={} mirror_warnings={}",
        env!("CARGO_PKG_VERSION"),
        settings.level,
        settings.log_dir.display(),
        settings.mirror_warnings
    );

    Ok(LoggingState {
        settings,
        _logger: logger,
    })
}

fn compare_settings(active: &ActiveSettings, requested: &ActiveSettings) -> Result<(), String> {
    if active.log_dir != requested.log_dir {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            active.log_dir.display(),
            requested.log_dir.display()
        ));
    }
    if active.level != requested.level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            active.level, requested.level
        ));
    }
    if active.mirror_warnings != requested.mirror_warnings {
        return Err("logging already initialized; refusing to toggle stderr mirroring".into());
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(log_dir: &Path) -> Result<PathBuf, String> {
    if log_dir.as_os_str().is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    if !log_dir.is_absolute() {
        return Err(format!(
            "log_dir must be an absolute path, got `{}`",
            log_dir.display()
        ));
    }
    Ok(log_dir.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(
            "event=panic_captured module=core status=error location={} message={}",
            location,
            single_line(&message, MAX_PANIC_MESSAGE_CHARS)
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

/// Flattens newlines and caps length so one record stays on one line.
fn single_line(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let mut capped = flattened.chars().take(max_chars).collect::<String>();
    if flattened.chars().count() > max_chars {
        capped.push_str("...");
    }
    capped
}
