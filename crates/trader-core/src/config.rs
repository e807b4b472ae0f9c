//! 설정 관리.
//!
//! 기본값 → TOML 파일 (선택) → `TRADER__` 환경 변수 순서로 덮어씁니다.
//!
//! ```text
//! TRADER__VAULT__ROOT=/secure/credentials
//! TRADER__TERMINAL__TIMEOUT_MS=60000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 자격증명 저장소 설정
    #[serde(default)]
    pub vault: VaultConfig,
    /// 터미널 연결 설정
    #[serde(default)]
    pub terminal: TerminalConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 자격증명 저장소 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VaultConfig {
    /// 계좌별 자격증명 파일이 저장되는 디렉토리
    #[serde(default = "default_vault_root")]
    pub root: PathBuf,
}

fn default_vault_root() -> PathBuf {
    PathBuf::from("credentials")
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: default_vault_root(),
        }
    }
}

/// 터미널 연결 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TerminalConfig {
    /// 터미널 실행 파일 경로 (없으면 클라이언트 기본값)
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// 브리지 실행 파일
    #[serde(default)]
    pub bridge: Option<String>,
    /// 브리지 실행 인자
    #[serde(default)]
    pub bridge_args: Vec<String>,
    /// 연결 타임아웃 (밀리초)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// 연결 성공 시 터미널 정보 출력 여부
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

fn default_timeout_ms() -> u64 {
    30_000
}
fn default_verbose() -> bool {
    true
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            path: None,
            bridge: None,
            bridge_args: Vec::new(),
            timeout_ms: default_timeout_ms(),
            verbose: default_verbose(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드 (선택)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("TRADER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
