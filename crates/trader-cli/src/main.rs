//! 트레이딩 터미널 로그인 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 자격증명 등록 (비밀번호는 프롬프트로 입력)
//! trader enroll --account demo --login 12345678 --server MetaQuotes-Demo
//!
//! # 등록된 자격증명으로 로그인
//! trader login --account demo
//!
//! # 브리지 없이 시뮬레이션 터미널로 확인
//! trader login --account demo --simulate
//!
//! # 등록된 계좌 조회
//! trader list
//! trader show --account demo
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use trader_core::{init_logging, AppConfig, CredentialVault, LogConfig, DEFAULT_CONFIG_PATH};

use trader_cli::commands::enroll::{enroll, EnrollConfig};
use trader_cli::commands::inspect::{list, print_summary, remove, show};
use trader_cli::commands::login::{login, LoginConfig};

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "Trading terminal login CLI - encrypted credentials and terminal sessions", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (없으면 기본값과 환경변수 사용)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 자격증명 저장소 디렉토리 (설정 파일의 vault.root 대신 사용)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// JSON 형식으로 출력
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 계좌 자격증명 암호화 저장
    Enroll {
        /// 계좌 이름 (저장 파일명)
        #[arg(short, long)]
        account: String,

        /// 로그인 번호
        #[arg(short, long)]
        login: String,

        /// 브로커 서버 이름
        #[arg(short, long)]
        server: String,

        /// 비밀번호 (생략하면 TRADER_ACCOUNT_PASSWORD 또는 프롬프트)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// 저장된 자격증명으로 터미널 로그인
    Login {
        /// 계좌 이름
        #[arg(short, long)]
        account: String,

        /// 연결 타임아웃 (밀리초, 기본: terminal.timeout_ms)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// 터미널 진단 정보 생략
        #[arg(short, long)]
        quiet: bool,

        /// 시뮬레이션 터미널 사용 (브리지 불필요)
        #[arg(long)]
        simulate: bool,
    },

    /// 저장된 자격증명 확인 (비밀번호 제외)
    Show {
        /// 계좌 이름
        #[arg(short, long)]
        account: String,
    },

    /// 등록된 계좌 목록
    List,

    /// 계좌 자격증명 삭제
    Remove {
        /// 계좌 이름
        #[arg(short, long)]
        account: String,
    },
}

fn run(cli: Cli) -> Result<()> {
    let app = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    init_logging(LogConfig::from_settings(&app.logging))
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
    debug!(config = %cli.config.display(), "Configuration loaded");

    let root = cli.vault.clone().unwrap_or_else(|| app.vault.root.clone());
    let vault = CredentialVault::new(root);

    match cli.command {
        Commands::Enroll {
            account,
            login,
            server,
            password,
        } => {
            let path = enroll(
                &vault,
                EnrollConfig {
                    account: account.clone(),
                    login,
                    server,
                    password,
                },
            )?;
            println!("Credentials for '{}' saved to {}", account, path.display());
        }

        Commands::Login {
            account,
            timeout,
            quiet,
            simulate,
        } => {
            let mut config = LoginConfig::from_settings(account, &app.terminal);
            if let Some(timeout) = timeout {
                config.timeout_ms = timeout;
            }
            config.verbose = config.verbose && !quiet;
            config.simulate = simulate;
            config.json = cli.json;

            login(&app, &vault, &config)?;
        }

        Commands::Show { account } => {
            let summary = show(&vault, &account)?;
            print_summary(&summary, cli.json)?;
        }

        Commands::List => {
            list(&vault, cli.json)?;
        }

        Commands::Remove { account } => {
            remove(&vault, &account)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // .env 파일 로드 (없으면 무시)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_login_arguments() {
        let cli = Cli::try_parse_from(["trader", "login", "--account", "demo", "--timeout", "5000", "--quiet"])
            .unwrap();

        match cli.command {
            Commands::Login {
                account,
                timeout,
                quiet,
                simulate,
            } => {
                assert_eq!(account, "demo");
                assert_eq!(timeout, Some(5000));
                assert!(quiet);
                assert!(!simulate);
            }
            _ => panic!("expected login command"),
        }
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }
}
