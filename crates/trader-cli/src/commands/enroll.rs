//! 자격증명 등록.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;
use trader_core::CredentialVault;
use zeroize::Zeroizing;

/// 비밀번호 환경변수 (비대화형 실행용)
pub const PASSWORD_ENV_VAR: &str = "TRADER_ACCOUNT_PASSWORD";

/// 템플릿에 남아 있는 자리표시자 값
const PLACEHOLDERS: [&str; 3] = ["YOUR_LOGIN_NUMBER", "YOUR_PASSWORD", "YOUR_BROKER_SERVER"];

/// 등록 설정.
#[derive(Debug)]
pub struct EnrollConfig {
    /// 계좌 이름 (저장 파일명)
    pub account: String,
    /// 로그인 식별자
    pub login: String,
    /// 서버 주소
    pub server: String,
    /// 비밀번호 (없으면 환경변수 또는 프롬프트)
    pub password: Option<String>,
}

/// 입력 값 검증 (빈 값, 자리표시자 거부).
pub fn validate_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{} must not be empty", name);
    }
    if PLACEHOLDERS.contains(&value.trim()) {
        bail!("{} still holds the placeholder value {}", name, value.trim());
    }
    Ok(())
}

/// 비밀번호 입력 (인자 → 환경변수 → 에코 없는 프롬프트).
fn read_password(given: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(password) = given {
        return Ok(Zeroizing::new(password));
    }

    if let Ok(password) = std::env::var(PASSWORD_ENV_VAR) {
        if !password.is_empty() {
            return Ok(Zeroizing::new(password));
        }
    }

    if std::io::stdin().is_terminal() {
        let password = rpassword::prompt_password("Password: ")
            .map_err(|e| anyhow!("failed to read password: {}", e))?;
        return Ok(Zeroizing::new(password));
    }

    bail!(
        "No password provided. Pass --password, set {} or run interactively",
        PASSWORD_ENV_VAR
    )
}

/// 자격증명 암호화 후 저장. 저장된 파일 경로 반환.
///
/// 로그인과 서버는 앞뒤 공백을 제거해 저장하고, 비밀번호는 입력 그대로 저장합니다.
pub fn enroll(vault: &CredentialVault, config: EnrollConfig) -> Result<PathBuf> {
    validate_field("login", &config.login)?;
    validate_field("server", &config.server)?;
    let login = config.login.trim();
    let server = config.server.trim();

    let password = read_password(config.password)?;
    validate_field("password", &password)?;

    let path = vault
        .store(&config.account, login, &password, server)
        .with_context(|| format!("Failed to enroll credentials for '{}'", config.account))?;

    info!(account = %config.account, path = %path.display(), "Credentials enrolled");
    Ok(path)
}
