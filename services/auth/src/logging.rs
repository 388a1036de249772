//! tg-auth 日志：stdout 摘要 + `<log-root>/raw/<service>.log` 按天滚动的文件日志。
//!
//! 日志根目录由调用方传入，`resolve_log_root` 负责从 `TG_LOG_DIR` 推导默认值。

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

const LOG_DIR_ENV: &str = "TG_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";
const RAW_DIR_NAME: &str = "raw";
/// 文件日志级别，独立于 `RUST_LOG`。
const FILE_LOG_LEVEL_ENV: &str = "TG_FILE_LOG_LEVEL";
const DEFAULT_STDOUT_FILTER: &str = "info";

/// 持有两路 non-blocking writer 的守卫；析构时刷新剩余日志。
pub(crate) struct LogRuntime {
    _stdout_guard: WorkerGuard,
    _file_guard: WorkerGuard,
    raw_dir: PathBuf,
}

impl LogRuntime {
    /// 文件日志实际写入的目录。
    pub(crate) fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }
}

/// 安装全局 subscriber，文件日志写入 `log_root/raw`。
pub(crate) fn init(service_name: &str, log_root: &Path) -> Result<LogRuntime> {
    let raw_dir = prepare_raw_dir(log_root)?;

    let file_appender = tracing_appender::rolling::daily(&raw_dir, format!("{service_name}.log"));
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(stdout_writer)
        .with_target(false)
        .compact()
        .with_filter(stdout_filter());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(file_level(std::env::var(FILE_LOG_LEVEL_ENV).ok().as_deref()));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(LogRuntime {
        _stdout_guard: stdout_guard,
        _file_guard: file_guard,
        raw_dir,
    })
}

/// 从 `TG_LOG_DIR` 与当前工作目录推导日志根目录。
pub(crate) fn resolve_log_root() -> PathBuf {
    log_root_from(
        std::env::var(LOG_DIR_ENV).ok().as_deref(),
        std::env::current_dir().ok(),
    )
}

/// 相对路径挂到 `cwd` 下；拿不到 `cwd` 时原样保留相对路径。
fn log_root_from(raw: Option<&str>, cwd: Option<PathBuf>) -> PathBuf {
    let path = PathBuf::from(
        raw.map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_LOG_DIR),
    );
    if path.is_absolute() {
        return path;
    }
    match cwd {
        Some(dir) => dir.join(path),
        None => path,
    }
}

fn prepare_raw_dir(log_root: &Path) -> Result<PathBuf> {
    let raw_dir = log_root.join(RAW_DIR_NAME);
    fs::create_dir_all(&raw_dir)
        .with_context(|| format!("create raw log dir: {}", raw_dir.display()))?;
    Ok(raw_dir)
}

/// `RUST_LOG` 优先，否则 `info`。
fn stdout_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDOUT_FILTER))
}

/// 无法识别的级别名回退到 `debug`。
fn file_level(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::DEBUG)
}
