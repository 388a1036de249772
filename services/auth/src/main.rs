//! tg-auth 二进制入口：仅负责启动应用。

mod api;
mod app;
mod auth;
mod cli;
mod config;
mod identity;
mod logging;
mod state;

#[tokio::main]
/// 启动认证服务。
async fn main() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    match cli::dispatch(&args)? {
        cli::CliDispatch::Run => {}
        cli::CliDispatch::Exit => return Ok(()),
    }

    let log_runtime = logging::init("auth", &logging::resolve_log_root())?;
    tracing::info!("file logs under {}", log_runtime.raw_dir().display());
    let config = config::AppConfig::from_env()?;
    app::run(config).await
}
