//! 메모리 내 시뮬레이션 터미널.
//!
//! 실제 터미널 없이 세션 흐름을 확인할 때 사용합니다.
//! 테스트와 `trader login --simulate`에서 쓰입니다.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::{codes, InitRequest, TerminalClient, TerminalError, TerminalStatus, TerminalVersion};

/// 로그인 허용 정책.
#[derive(Debug)]
enum Acceptance {
    /// 지정된 (login, password, server)만 허용
    Only {
        login: String,
        password: SecretString,
        server: String,
    },
    /// 모든 로그인 허용
    Any,
    /// 항상 지정된 결과로 거부
    Reject(TerminalError),
}

/// 시뮬레이션 터미널 클라이언트.
#[derive(Debug)]
pub struct SimulatedTerminal {
    acceptance: Acceptance,
    latency: Duration,
    version: TerminalVersion,
    status: TerminalStatus,
    last_error: TerminalError,
    connected: bool,
    initialize_calls: usize,
    shutdown_calls: usize,
    last_login: Option<String>,
    last_terminal_path: Option<PathBuf>,
}

impl SimulatedTerminal {
    fn with_acceptance(acceptance: Acceptance) -> Self {
        Self {
            acceptance,
            latency: Duration::ZERO,
            version: TerminalVersion {
                version: 500,
                build: 4150,
                release: "simulated".to_string(),
            },
            status: TerminalStatus::new()
                .with("name", "Simulated Terminal")
                .with("connected", "true")
                .with(TerminalStatus::DATA_PATH, "simulated-terminal"),
            last_error: TerminalError::success(),
            connected: false,
            initialize_calls: 0,
            shutdown_calls: 0,
            last_login: None,
            last_terminal_path: None,
        }
    }

    /// 지정된 자격증명만 허용하는 터미널.
    pub fn accepting(
        login: impl Into<String>,
        password: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self::with_acceptance(Acceptance::Only {
            login: login.into(),
            password: SecretString::from(password.into()),
            server: server.into(),
        })
    }

    /// 모든 로그인을 허용하는 터미널.
    pub fn permissive() -> Self {
        Self::with_acceptance(Acceptance::Any)
    }

    /// 항상 지정된 결과로 거부하는 터미널.
    pub fn rejecting(code: i32, message: impl Into<String>) -> Self {
        Self::with_acceptance(Acceptance::Reject(TerminalError::new(code, message)))
    }

    /// 초기화 지연 시간 설정. 요청 타임아웃보다 길면 `IPC_TIMEOUT`으로 실패합니다.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// 보고할 상태 정보 설정.
    pub fn with_status(mut self, status: TerminalStatus) -> Self {
        self.status = status;
        self
    }

    /// 보고할 버전 정보 설정.
    pub fn with_version(mut self, version: TerminalVersion) -> Self {
        self.version = version;
        self
    }

    /// `initialize` 호출 횟수.
    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls
    }

    /// `shutdown` 호출 횟수.
    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls
    }

    /// 현재 연결 여부.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// 마지막으로 시도한 로그인 식별자.
    pub fn last_login(&self) -> Option<&str> {
        self.last_login.as_deref()
    }

    /// 마지막 초기화 요청의 터미널 경로.
    pub fn last_terminal_path(&self) -> Option<&PathBuf> {
        self.last_terminal_path.as_ref()
    }

    fn authorize(&self, request: &InitRequest<'_>) -> TerminalError {
        match &self.acceptance {
            Acceptance::Any => TerminalError::success(),
            Acceptance::Reject(reason) => reason.clone(),
            Acceptance::Only {
                login,
                password,
                server,
            } => {
                if request.login.as_str() != login
                    || request.password.expose_secret() != password.expose_secret()
                {
                    TerminalError::new(codes::AUTH_FAILED, "Authorization failed")
                } else if request.server != server {
                    TerminalError::new(codes::IPC_INIT_FAILED, "Terminal: Invalid server")
                } else {
                    TerminalError::success()
                }
            }
        }
    }
}

impl TerminalClient for SimulatedTerminal {
    fn initialize(&mut self, request: &InitRequest<'_>) -> bool {
        self.initialize_calls += 1;
        self.last_login = Some(request.login.as_str().to_string());
        self.last_terminal_path = request.terminal_path.map(PathBuf::from);

        if !self.latency.is_zero() {
            thread::sleep(self.latency.min(request.timeout));
            if self.latency > request.timeout {
                debug!(timeout_ms = request.timeout.as_millis() as u64, "Simulated initialize timed out");
                self.last_error = TerminalError::new(codes::IPC_TIMEOUT, "IPC timeout");
                return false;
            }
        }

        self.last_error = self.authorize(request);
        self.connected = self.last_error.is_success();
        self.connected
    }

    fn last_error(&self) -> TerminalError {
        self.last_error.clone()
    }

    fn shutdown(&mut self) {
        self.shutdown_calls += 1;
        self.connected = false;
    }

    fn version_info(&mut self) -> Option<TerminalVersion> {
        if !self.connected {
            self.last_error = TerminalError::new(codes::NO_IPC, "No IPC connection");
            return None;
        }
        Some(self.version.clone())
    }

    fn terminal_status(&mut self) -> Option<TerminalStatus> {
        if !self.connected {
            self.last_error = TerminalError::new(codes::NO_IPC, "No IPC connection");
            return None;
        }
        Some(self.status.clone())
    }
}
