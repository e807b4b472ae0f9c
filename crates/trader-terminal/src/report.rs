//! 연결 진단 리포트.
//!
//! 연결 성공 후 터미널 버전, 상태 필드, 데이터 교환 디렉토리를 수집합니다.
//! 정보 제공용이며 세션 상태에는 영향을 주지 않습니다.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::client::{TerminalClient, TerminalStatus, TerminalVersion};

/// 터미널 데이터 디렉토리 기준 파일 교환 디렉토리.
pub const EXCHANGE_SUBDIR: [&str; 2] = ["MQL5", "Files"];

/// 데이터 디렉토리에서 파일 교환 디렉토리 계산.
pub fn exchange_dir(data_path: &Path) -> PathBuf {
    EXCHANGE_SUBDIR
        .iter()
        .fold(data_path.to_path_buf(), |path, part| path.join(part))
}

/// 연결 진단 리포트.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// 터미널 버전
    pub version: Option<TerminalVersion>,
    /// 터미널 상태 필드
    pub status: Option<TerminalStatus>,
    /// 파일 교환 디렉토리
    pub exchange_dir: Option<PathBuf>,
}

impl SessionReport {
    /// 연결된 클라이언트에서 리포트 수집.
    pub fn collect<C: TerminalClient + ?Sized>(client: &mut C) -> Self {
        let version = client.version_info();
        let status = client.terminal_status();
        let exchange_dir = status
            .as_ref()
            .and_then(TerminalStatus::data_path)
            .map(exchange_dir);

        Self {
            version,
            status,
            exchange_dir,
        }
    }

    /// 리포트를 tracing 이벤트로 기록.
    pub fn log(&self) {
        match &self.version {
            Some(version) => info!(
                version = version.version,
                build = version.build,
                release = %version.release,
                "Terminal version"
            ),
            None => warn!("Terminal version unavailable"),
        }

        match &self.status {
            Some(status) => {
                for (key, value) in status.iter() {
                    info!(key, value, "Terminal status");
                }
            }
            None => warn!("Terminal status unavailable"),
        }

        match &self.exchange_dir {
            Some(dir) => info!(path = %dir.display(), "File exchange directory"),
            None => warn!("Terminal did not report a data path"),
        }
    }

    /// 사람이 읽을 수 있는 텍스트로 변환.
    pub fn render(&self) -> String {
        let mut out = String::new();

        match &self.version {
            Some(version) => {
                let _ = writeln!(out, "Terminal version: {}", version);
            }
            None => out.push_str("Terminal version: unavailable\n"),
        }

        match &self.status {
            Some(status) => {
                out.push_str("Terminal status:\n");
                let width = status.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                for (key, value) in status.iter() {
                    let _ = writeln!(out, "  {:<width$} = {}", key, value, width = width);
                }
            }
            None => out.push_str("Terminal status: unavailable\n"),
        }

        match &self.exchange_dir {
            Some(dir) => {
                let _ = writeln!(out, "File exchange directory: {}", dir.display());
            }
            None => out.push_str("File exchange directory: unknown\n"),
        }

        out
    }
}
