//! 저장된 자격증명으로 터미널 로그인.

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use tracing::{error, info};
use trader_core::{AppConfig, CredentialVault, TerminalConfig};
use trader_terminal::{
    BridgeTerminal, SessionManager, SessionReport, SessionState, SimulatedTerminal, TerminalClient,
};

use super::vault_error;

/// 로그인 설정.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// 계좌 이름
    pub account: String,
    /// 연결 타임아웃 (밀리초)
    pub timeout_ms: u64,
    /// 진단 리포트 출력 여부
    pub verbose: bool,
    /// 시뮬레이션 터미널 사용
    pub simulate: bool,
    /// JSON 출력
    pub json: bool,
}

impl LoginConfig {
    /// 설정 파일 값을 기본값으로 사용하는 로그인 설정 생성.
    pub fn from_settings(account: impl Into<String>, settings: &TerminalConfig) -> Self {
        Self {
            account: account.into(),
            timeout_ms: settings.timeout_ms,
            verbose: settings.verbose,
            simulate: false,
            json: false,
        }
    }
}

/// 로그인 결과 (JSON 출력용).
#[derive(Debug, Serialize)]
struct LoginOutcome<'a> {
    account: &'a str,
    state: String,
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a SessionReport>,
}

/// 설정에 따른 터미널 클라이언트 생성.
fn build_client(settings: &TerminalConfig, simulate: bool) -> Result<Box<dyn TerminalClient>> {
    if simulate {
        info!("Using simulated terminal");
        return Ok(Box::new(SimulatedTerminal::permissive()));
    }

    let program = settings.bridge.as_deref().ok_or_else(|| {
        anyhow!("No terminal bridge configured. Set terminal.bridge or TRADER__TERMINAL__BRIDGE, or use --simulate")
    })?;

    Ok(Box::new(
        BridgeTerminal::new(program).with_args(settings.bridge_args.iter().cloned()),
    ))
}

/// 자격증명을 복호화하여 터미널에 연결하고 결과를 출력.
///
/// 연결 세션은 함수가 끝날 때 해제됩니다.
pub fn login(app: &AppConfig, vault: &CredentialVault, config: &LoginConfig) -> Result<SessionState> {
    let credential = vault
        .load(&config.account)
        .map_err(|e| vault_error(&config.account, e))?;

    let client = build_client(&app.terminal, config.simulate)?;
    let mut manager = SessionManager::new(client);
    if let Some(path) = &app.terminal.path {
        manager = manager.with_terminal_path(path.clone());
    }

    let state = manager.connect(credential, config.timeout_ms, config.verbose);
    print_outcome(&config.account, &state, manager.report(), config.json)?;

    if let SessionState::Failed(reason) = &state {
        error!(account = %config.account, code = reason.code, "Login failed");
        bail!("Login to '{}' failed: {}", config.account, reason);
    }
    if !state.is_connected() {
        bail!("Unexpected session state after connect: {}", state);
    }

    info!(account = %config.account, "Login succeeded");
    Ok(state)
}

fn print_outcome(account: &str, state: &SessionState, report: Option<&SessionReport>, json: bool) -> Result<()> {
    if json {
        let failure = state.failure();
        let outcome = LoginOutcome {
            account,
            state: state.to_string(),
            connected: state.is_connected(),
            code: failure.map(|r| r.code),
            message: failure.map(|r| r.message.as_str()),
            report,
        };
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match state {
        SessionState::Connected => println!("Connected to trading account '{}'", account),
        SessionState::Failed(reason) => {
            println!("Failed to connect to trading account '{}': {}", account, reason)
        }
        other => println!("Session state: {}", other),
    }

    if let Some(report) = report {
        println!();
        print!("{}", report.render());
    }
    Ok(())
}
