//! 자격증명 저장소의 에러 타입.
//!
//! 에러 메시지에는 경로와 필드 이름만 포함되며, 복호화된 값이나 키는 포함되지 않습니다.

use std::path::PathBuf;
use thiserror::Error;

/// 자격증명 레코드의 필드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    /// 계좌 식별자
    Identifier,
    /// 비밀번호
    Secret,
    /// 서버 주소
    Endpoint,
}

impl RecordField {
    /// 암호문에 바인딩되는 필드 레이블.
    pub fn label(&self) -> &'static [u8] {
        match self {
            RecordField::Identifier => b"identifier",
            RecordField::Secret => b"secret",
            RecordField::Endpoint => b"endpoint",
        }
    }
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordField::Identifier => write!(f, "identifier"),
            RecordField::Secret => write!(f, "secret"),
            RecordField::Endpoint => write!(f, "endpoint"),
        }
    }
}

/// 자격증명 저장소 에러.
#[derive(Debug, Error)]
pub enum VaultError {
    /// 파일 열기/읽기/쓰기 실패
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 레코드 줄 수 부족
    #[error("Malformed credential record: expected 4 lines, found {lines}")]
    Malformed { lines: usize },

    /// 키 줄이 올바른 키가 아님
    #[error("Invalid record key: {0}")]
    InvalidKey(String),

    /// 필드 인증 실패 (변조, 잘못된 키, 잘린 데이터)
    #[error("Decryption failed for {field}")]
    DecryptionFailed { field: RecordField },

    /// 암호화 실패
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// 경로 세그먼트로 쓸 수 없는 계좌 이름
    #[error("Invalid account name: {0:?}")]
    InvalidAccountName(String),
}

/// 저장소 작업을 위한 Result 타입.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// I/O 에러 생성 헬퍼.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VaultError::Io {
            path: path.into(),
            source,
        }
    }

    /// 재등록이 필요한 에러인지 확인합니다.
    ///
    /// 인증에 실패한 파일은 다시 읽어도 성공할 수 없으므로 자격증명을 새로 저장해야 합니다.
    pub fn requires_reenrollment(&self) -> bool {
        matches!(self, VaultError::DecryptionFailed { .. })
    }

    /// 호출자가 복구 가능한 에러인지 확인합니다 (재입력, 재시도 등).
    pub fn is_recoverable(&self) -> bool {
        !self.requires_reenrollment()
    }

    /// 파일이 존재하지 않는 경우인지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VaultError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decryption_failure_requires_reenrollment() {
        let err = VaultError::DecryptionFailed {
            field: RecordField::Secret,
        };
        assert!(err.requires_reenrollment());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Decryption failed for secret");
    }

    #[test]
    fn test_other_errors_are_recoverable() {
        let malformed = VaultError::Malformed { lines: 2 };
        assert!(malformed.is_recoverable());

        let key = VaultError::InvalidKey("bad length".to_string());
        assert!(key.is_recoverable());

        let io = VaultError::io(
            "/nonexistent",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(io.is_recoverable());
        assert!(io.is_not_found());
    }
}
