//! 프로세스 브리지 터미널 클라이언트.
//!
//! 실제 터미널 라이브러리를 감싼 브리지 실행 파일을 세션당 한 번 실행하고,
//! 표준 입출력으로 줄 단위 JSON 요청/응답을 주고받습니다.
//!
//! 요청 (`action` 태그):
//! - `{"action":"initialize","login":..,"password":..,"server":..,"timeout_ms":..,"path":..}`
//! - `{"action":"version"}`
//! - `{"action":"terminal_info"}`
//! - `{"action":"shutdown"}`
//!
//! 응답: `{"ok":true,"version":{..}}`, `{"ok":true,"status":{..}}`,
//! `{"ok":false,"error":{"code":-6,"message":".."}}`
//!
//! 비밀번호는 stdin으로만 전달되며 명령줄 인자에는 포함되지 않습니다.
//! 응답 대기 중 타임아웃이 나면 늦게 도착한 응답이 다음 요청에 섞이지 않도록
//! 프로세스를 종료하며, 다음 `initialize`에서 새로 실행합니다.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use trader_core::AccountId;
use zeroize::Zeroizing;

use crate::client::{codes, InitRequest, TerminalClient, TerminalError, TerminalStatus, TerminalVersion};

/// 초기화 타임아웃 이후 응답을 추가로 기다리는 시간
const RESPONSE_GRACE: Duration = Duration::from_secs(5);
/// 버전/상태 조회 응답 대기 시간 기본값
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// shutdown 요청 후 프로세스 종료 대기 시간 기본값
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);
/// 종료 대기 폴링 간격
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 브리지 요청. 비밀번호를 포함하므로 `Debug`를 구현하지 않습니다.
#[derive(Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum BridgeRequest<'a> {
    Initialize {
        login: &'a AccountId,
        password: &'a str,
        server: &'a str,
        timeout_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<&'a Path>,
    },
    Version,
    TerminalInfo,
    Shutdown,
}

/// 브리지 응답.
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    ok: bool,
    #[serde(default)]
    error: Option<TerminalError>,
    #[serde(default)]
    version: Option<TerminalVersion>,
    #[serde(default)]
    status: Option<TerminalStatus>,
}

/// 실행 중인 브리지 프로세스.
struct BridgeProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<std::io::Result<String>>,
}

impl BridgeProcess {
    fn spawn(program: &Path, args: &[String]) -> std::io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "bridge stdout not captured")
        })?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        Ok(Self {
            child,
            stdin,
            lines: rx,
        })
    }

    fn kill(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// 브리지 실행 파일과 통신하는 터미널 클라이언트.
pub struct BridgeTerminal {
    program: PathBuf,
    args: Vec<String>,
    query_timeout: Duration,
    shutdown_grace: Duration,
    process: Option<BridgeProcess>,
    last_error: TerminalError,
}

impl BridgeTerminal {
    /// 새 브리지 클라이언트 생성. 프로세스는 `initialize` 시점에 실행됩니다.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            process: None,
            last_error: TerminalError::success(),
        }
    }

    /// 브리지 실행 인자 설정.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// 조회 응답 대기 시간 설정.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// shutdown 후 프로세스 종료 대기 시간 설정.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// 브리지 실행 파일 경로.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// 브리지 프로세스 실행 여부.
    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    /// 브리지 프로세스 ID.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(|p| p.child.id())
    }

    fn ensure_process(&mut self) -> Result<&mut BridgeProcess, TerminalError> {
        if self.process.is_none() {
            let process = BridgeProcess::spawn(&self.program, &self.args).map_err(|e| {
                error!(program = %self.program.display(), error = %e, "Failed to spawn terminal bridge");
                TerminalError::new(
                    codes::IPC_INIT_FAILED,
                    format!("Failed to start bridge {}: {}", self.program.display(), e),
                )
            })?;
            info!(program = %self.program.display(), pid = process.child.id(), "Terminal bridge started");
            self.process = Some(process);
        }

        self.process
            .as_mut()
            .ok_or_else(|| TerminalError::new(codes::NO_IPC, "No IPC connection"))
    }

    /// 요청 전송 후 응답 한 줄 대기.
    ///
    /// 응답을 받지 못하면 (타임아웃, 파이프 종료) 브리지 프로세스를 종료합니다.
    /// 늦게 도착한 응답은 이후 요청의 응답으로 읽히지 않으며, 이후 조회는 `NO_IPC`로 실패합니다.
    fn call(&mut self, request: &BridgeRequest<'_>, timeout: Duration) -> Result<BridgeResponse, TerminalError> {
        let reply = match self.roundtrip(request, timeout) {
            Ok(reply) => reply,
            Err(err) => {
                if matches!(err.code, codes::IPC_TIMEOUT | codes::NO_IPC) {
                    self.discard_process(&err);
                }
                return Err(err);
            }
        };

        serde_json::from_str(&reply)
            .map_err(|e| TerminalError::new(codes::FAIL, format!("Invalid bridge response: {}", e)))
    }

    fn roundtrip(&mut self, request: &BridgeRequest<'_>, timeout: Duration) -> Result<String, TerminalError> {
        let process = self.ensure_process()?;

        let mut line = Zeroizing::new(Vec::<u8>::with_capacity(512));
        serde_json::to_writer(&mut *line, request)
            .map_err(|e| TerminalError::new(codes::INVALID_PARAMS, format!("Invalid bridge request: {}", e)))?;
        line.push(b'\n');

        let stdin = process
            .stdin
            .as_mut()
            .ok_or_else(|| TerminalError::new(codes::NO_IPC, "Bridge stdin closed"))?;
        stdin
            .write_all(&line)
            .and_then(|_| stdin.flush())
            .map_err(|e| TerminalError::new(codes::NO_IPC, format!("Bridge write failed: {}", e)))?;

        match process.lines.recv_timeout(timeout) {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(TerminalError::new(codes::NO_IPC, format!("Bridge read failed: {}", e))),
            Err(RecvTimeoutError::Timeout) => Err(TerminalError::new(codes::IPC_TIMEOUT, "IPC timeout")),
            Err(RecvTimeoutError::Disconnected) => {
                Err(TerminalError::new(codes::NO_IPC, "Bridge closed its output"))
            }
        }
    }

    fn discard_process(&mut self, reason: &TerminalError) {
        if let Some(process) = self.process.take() {
            warn!(
                pid = process.child.id(),
                code = reason.code,
                message = %reason.message,
                "Terminal bridge lost its reply stream, killing"
            );
            process.kill();
        }
    }

    /// 요청을 보내고 결과를 `last_error`에 반영.
    fn exchange(&mut self, request: &BridgeRequest<'_>, timeout: Duration) -> Option<BridgeResponse> {
        match self.call(request, timeout) {
            Ok(response) if response.ok => {
                self.last_error = TerminalError::success();
                Some(response)
            }
            Ok(response) => {
                self.last_error = response
                    .error
                    .unwrap_or_else(|| TerminalError::new(codes::FAIL, "Bridge reported failure"));
                None
            }
            Err(err) => {
                debug!(code = err.code, message = %err.message, "Bridge request failed");
                self.last_error = err;
                None
            }
        }
    }

    fn wait_for_exit(&self, process: &mut BridgeProcess) -> bool {
        let deadline = Instant::now() + self.shutdown_grace;
        loop {
            match process.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(%status, "Terminal bridge exited");
                    return true;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
                Ok(None) => return false,
                Err(e) => {
                    warn!(error = %e, "Failed to poll terminal bridge");
                    return false;
                }
            }
        }
    }
}

impl TerminalClient for BridgeTerminal {
    fn initialize(&mut self, request: &InitRequest<'_>) -> bool {
        let message = BridgeRequest::Initialize {
            login: request.login,
            password: request.password.expose_secret(),
            server: request.server,
            timeout_ms: u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX),
            path: request.terminal_path,
        };

        self.exchange(&message, request.timeout.saturating_add(RESPONSE_GRACE))
            .is_some()
    }

    fn last_error(&self) -> TerminalError {
        self.last_error.clone()
    }

    fn shutdown(&mut self) {
        if self.process.is_none() {
            return;
        }

        if let Err(err) = self.call(&BridgeRequest::Shutdown, self.shutdown_grace) {
            debug!(code = err.code, message = %err.message, "Bridge shutdown request not acknowledged");
        }

        if let Some(mut process) = self.process.take() {
            // stdin을 닫아 EOF 전달
            drop(process.stdin.take());

            if self.wait_for_exit(&mut process) {
                info!("Terminal bridge stopped");
            } else {
                warn!(pid = process.child.id(), "Terminal bridge did not exit, killing");
                process.kill();
            }
        }
    }

    fn version_info(&mut self) -> Option<TerminalVersion> {
        if self.process.is_none() {
            self.last_error = TerminalError::new(codes::NO_IPC, "No IPC connection");
            return None;
        }
        let timeout = self.query_timeout;
        self.exchange(&BridgeRequest::Version, timeout)
            .and_then(|response| response.version)
    }

    fn terminal_status(&mut self) -> Option<TerminalStatus> {
        if self.process.is_none() {
            self.last_error = TerminalError::new(codes::NO_IPC, "No IPC connection");
            return None;
        }
        let timeout = self.query_timeout;
        self.exchange(&BridgeRequest::TerminalInfo, timeout)
            .and_then(|response| response.status)
    }
}

impl Drop for BridgeTerminal {
    fn drop(&mut self) {
        if let Some(process) = self.process.take() {
            debug!("Killing terminal bridge on drop");
            process.kill();
        }
    }
}

impl std::fmt::Debug for BridgeTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeTerminal")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("running", &self.process.is_some())
            .field("last_error", &self.last_error)
            .finish()
    }
}
