//! 세션 에러 타입.

use thiserror::Error;

use crate::client::TerminalError;

/// 터미널 세션 관련 에러.
#[derive(Debug, Error)]
pub enum SessionError {
    /// 터미널이 초기화(로그인)를 거부했거나 타임아웃됨
    #[error("Terminal initialization failed: {0}")]
    InitFailed(TerminalError),

    /// 연결되지 않은 세션에서 연결이 필요한 작업 요청
    #[error("Terminal session is not connected")]
    NotConnected,
}

/// 세션 작업을 위한 Result 타입.
pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// 호출자가 같은 자격증명으로 재시도해 볼 만한 에러인지 확인.
    ///
    /// 세션 관리자는 재시도하지 않으며, 재시도 정책은 호출자가 결정합니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::InitFailed(err) => err.is_transient(),
            SessionError::NotConnected => false,
        }
    }

    /// 터미널이 보고한 결과 코드.
    pub fn code(&self) -> Option<i32> {
        match self {
            SessionError::InitFailed(err) => Some(err.code),
            SessionError::NotConnected => None,
        }
    }
}
