//! 터미널 로그인 세션 관리.
//!
//! 세션 상태 전이:
//! - `Disconnected` → `Connecting` → `Connected` (초기화 성공)
//! - `Disconnected` → `Connecting` → `Failed` (초기화 실패, 클라이언트 핸들 해제 후)
//! - `Connected` / `Failed` → `Disconnected` (`disconnect`)
//!
//! 매니저는 재시도하지 않습니다. 실패는 한 번 보고되고 재시도 여부는 호출자가 결정합니다.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use trader_core::Credential;

use crate::client::{InitRequest, TerminalClient, TerminalError};
use crate::error::{SessionError, SessionResult};
use crate::report::SessionReport;

/// 세션 상태.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// 연결 없음
    #[default]
    Disconnected,
    /// 초기화 진행 중
    Connecting,
    /// 연결됨
    Connected,
    /// 초기화 실패 (터미널이 보고한 결과)
    Failed(TerminalError),
}

impl SessionState {
    /// 연결 상태인지 확인.
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }

    /// 실패 상태인지 확인.
    pub fn is_failed(&self) -> bool {
        matches!(self, SessionState::Failed(_))
    }

    /// 실패 사유.
    pub fn failure(&self) -> Option<&TerminalError> {
        match self {
            SessionState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "DISCONNECTED"),
            SessionState::Connecting => write!(f, "CONNECTING"),
            SessionState::Connected => write!(f, "CONNECTED"),
            SessionState::Failed(reason) => write!(f, "FAILED {}", reason),
        }
    }
}

/// 단일 터미널 세션을 소유하는 매니저.
///
/// 매니저 하나당 활성 세션은 최대 하나입니다.
/// 드롭되면 암묵적으로 `disconnect`를 수행합니다.
pub struct SessionManager<C: TerminalClient> {
    client: C,
    state: SessionState,
    terminal_path: Option<PathBuf>,
    connected_at: Option<DateTime<Utc>>,
    report: Option<SessionReport>,
}

impl<C: TerminalClient> SessionManager<C> {
    /// 새 세션 매니저 생성 (`Disconnected` 상태).
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: SessionState::Disconnected,
            terminal_path: None,
            connected_at: None,
            report: None,
        }
    }

    /// 터미널 실행 파일 경로 설정.
    pub fn with_terminal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.terminal_path = Some(path.into());
        self
    }

    /// 설정된 터미널 실행 파일 경로.
    pub fn terminal_path(&self) -> Option<&Path> {
        self.terminal_path.as_deref()
    }

    /// 자격증명으로 터미널에 연결.
    ///
    /// 자격증명은 소비되며 반환 전에 드롭됩니다 (비밀번호 zeroize).
    /// 이미 연결된 상태면 기존 핸들을 먼저 해제합니다.
    pub fn connect(&mut self, credential: Credential, timeout_ms: u64, verbose: bool) -> SessionState {
        if self.state.is_connected() {
            debug!("Releasing existing terminal session before reconnecting");
            self.disconnect();
        }

        self.state = SessionState::Connecting;
        self.report = None;
        self.connected_at = None;

        let _span =
            trader_core::account_span!("terminal_connect", credential.identifier(), credential.endpoint())
                .entered();
        info!(
            login = %credential.identifier(),
            server = credential.endpoint(),
            timeout_ms,
            "Connecting to trading terminal"
        );

        let request = InitRequest {
            login: credential.identifier(),
            password: credential.secret(),
            server: credential.endpoint(),
            timeout: Duration::from_millis(timeout_ms),
            terminal_path: self.terminal_path.as_deref(),
        };
        let initialized = self.client.initialize(&request);
        drop(credential);

        if initialized {
            self.state = SessionState::Connected;
            self.connected_at = Some(Utc::now());
            info!("Terminal session connected");

            if verbose {
                let report = SessionReport::collect(&mut self.client);
                report.log();
                self.report = Some(report);
            }
        } else {
            let reason = self.client.last_error();
            self.client.shutdown();
            error!(code = reason.code, message = %reason.message, "Terminal initialization failed");
            self.state = SessionState::Failed(reason);
        }

        self.state.clone()
    }

    /// 세션 종료.
    ///
    /// `Disconnected` 상태에서는 아무 작업도 하지 않습니다.
    /// `Failed` 상태의 핸들은 실패 시점에 이미 해제되었습니다.
    pub fn disconnect(&mut self) {
        match self.state {
            SessionState::Disconnected => return,
            SessionState::Connected | SessionState::Connecting => {
                self.client.shutdown();
                info!("Terminal session disconnected");
            }
            SessionState::Failed(_) => {
                debug!("Clearing failed terminal session");
            }
        }

        self.state = SessionState::Disconnected;
        self.connected_at = None;
        self.report = None;
    }

    /// 현재 세션 상태.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// 연결 상태인지 확인.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// 연결 성공 시각.
    pub fn connected_since(&self) -> Option<DateTime<Utc>> {
        self.connected_at
    }

    /// 마지막 연결의 진단 리포트 (verbose 연결에서만 생성).
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    /// 연결 상태를 `Result`로 확인.
    pub fn ensure_connected(&self) -> SessionResult<()> {
        match &self.state {
            SessionState::Connected => Ok(()),
            SessionState::Failed(reason) => Err(SessionError::InitFailed(reason.clone())),
            SessionState::Disconnected | SessionState::Connecting => Err(SessionError::NotConnected),
        }
    }

    /// 클라이언트 참조.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// 클라이언트 가변 참조.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }
}

impl<C: TerminalClient> Drop for SessionManager<C> {
    fn drop(&mut self) {
        if self.state.is_connected() {
            warn!("Session manager dropped while connected, shutting down terminal");
        }
        self.disconnect();
    }
}

impl<C: TerminalClient> fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state)
            .field("terminal_path", &self.terminal_path)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::codes;

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Disconnected.to_string(), "DISCONNECTED");
        assert_eq!(SessionState::Connected.to_string(), "CONNECTED");

        let failed = SessionState::Failed(TerminalError::new(codes::AUTH_FAILED, "denied"));
        assert_eq!(failed.to_string(), "FAILED (-6, \"denied\")");
        assert!(failed.is_failed());
        assert_eq!(failed.failure().map(|r| r.code), Some(codes::AUTH_FAILED));
    }

    #[test]
    fn test_default_state() {
        assert_eq!(SessionState::default(), SessionState::Disconnected);
        assert!(!SessionState::Connecting.is_connected());
    }
}
