//! tg-auth CLI 分发：`run`、`hash-password`、`doctor`、`version`。

use std::io::BufRead;

use anyhow::{anyhow, bail};
use serde_json::json;

use crate::{
    auth::token_crypto::secret_fingerprint,
    config::AppConfig,
    identity::{memory::MemoryIdentityStore, password::hash_password},
};

/// CLI 分发结果。
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CliDispatch {
    /// 继续进入服务主循环。
    Run,
    /// 命令已处理完成，主程序应退出。
    Exit,
}

/// 解析并执行 CLI。
pub(crate) fn dispatch(args: &[String]) -> anyhow::Result<CliDispatch> {
    if args.is_empty() {
        return Ok(CliDispatch::Run);
    }

    let cmd = args[0].trim();
    if cmd.is_empty() || cmd == "run" {
        return Ok(CliDispatch::Run);
    }

    if matches!(cmd, "-h" | "--help" | "help") {
        print_root_help();
        return Ok(CliDispatch::Exit);
    }

    match cmd {
        "hash-password" => {
            let password = match args.get(1) {
                Some(password) => password.clone(),
                None => read_password_from_stdin()?,
            };
            if password.is_empty() {
                bail!("password must not be empty");
            }
            println!("{}", hash_password(&password)?);
            Ok(CliDispatch::Exit)
        }
        "doctor" => {
            let format = parse_doctor_format(&args[1..])?;
            run_doctor(format);
            Ok(CliDispatch::Exit)
        }
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(CliDispatch::Exit)
        }
        other => Err(anyhow!(
            "unknown command: {other}; run `tg-auth --help` for usage"
        )),
    }
}

/// `doctor` 输出格式。
#[derive(Debug, PartialEq, Eq)]
enum DoctorFormat {
    Text,
    Json,
}

/// 解析 doctor 的 `--format` 参数。
fn parse_doctor_format(args: &[String]) -> anyhow::Result<DoctorFormat> {
    if args.is_empty() {
        return Ok(DoctorFormat::Text);
    }
    if args.len() == 2 && args[0] == "--format" {
        return match args[1].as_str() {
            "text" => Ok(DoctorFormat::Text),
            "json" => Ok(DoctorFormat::Json),
            other => Err(anyhow!("unsupported doctor format: {other}")),
        };
    }
    Err(anyhow!("usage: tg-auth doctor [--format text|json]"))
}

/// 打印生效配置（密钥仅输出指纹），配置或身份存储异常时以非零码退出。
fn run_doctor(format: DoctorFormat) {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config: invalid ({err})");
            std::process::exit(1);
        }
    };
    let identities = MemoryIdentityStore::load(&config.identity_store_path).map(|s| s.len());
    let identities_display = match &identities {
        Ok(count) => count.to_string(),
        Err(err) => format!("error: {err:#}"),
    };

    match format {
        DoctorFormat::Text => {
            println!("listen-addr: {}", config.addr);
            println!("token-issuer: {}", config.token.issuer);
            println!("token-audience: {}", config.token.audience);
            println!("token-secret-source: {}", config.secret_source.as_str());
            println!(
                "token-secret-fingerprint: {}",
                secret_fingerprint(&config.token.secret)
            );
            println!("identity-store: {}", config.identity_store_path.display());
            println!("identities: {identities_display}");
        }
        DoctorFormat::Json => {
            let payload = json!({
                "listenAddr": config.addr,
                "tokenIssuer": config.token.issuer,
                "tokenAudience": config.token.audience,
                "tokenSecretSource": config.secret_source.as_str(),
                "tokenSecretFingerprint": secret_fingerprint(&config.token.secret),
                "identityStorePath": config.identity_store_path.display().to_string(),
                "identities": identities_display,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }

    if identities.is_err() {
        std::process::exit(1);
    }
}

/// 从 stdin 读取一行密码（去掉行尾换行）。
fn read_password_from_stdin() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| anyhow!("read password from stdin failed: {err}"))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// 打印 root help。
fn print_root_help() {
    println!("tg-auth usage:");
    println!("  tg-auth run");
    println!("  tg-auth hash-password [password]   (reads stdin when omitted)");
    println!("  tg-auth doctor [--format text|json]");
    println!("  tg-auth version");
}
