//! 외부 트레이딩 터미널 로그인 세션.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 터미널 클라이언트 인터페이스 (`TerminalClient`)
//! - 세션 상태 머신 (`SessionManager`, `SessionState`)
//! - 연결 진단 리포트
//! - 프로세스 브리지 클라이언트와 시뮬레이션 클라이언트

pub mod bridge;
pub mod client;
pub mod error;
pub mod report;
pub mod session;
pub mod simulated;

pub use bridge::BridgeTerminal;
pub use client::{codes, InitRequest, TerminalClient, TerminalError, TerminalStatus, TerminalVersion};
pub use error::{SessionError, SessionResult};
pub use report::SessionReport;
pub use session::{SessionManager, SessionState};
pub use simulated::SimulatedTerminal;
