//! # Trader Core
//!
//! 터미널 로그인에 필요한 자격증명 저장소와 공통 인프라를 제공합니다:
//! - 자격증명 타입 (`Credential`, `AccountId`)
//! - 필드 단위 AES-256-GCM 암호화
//! - 암호화된 자격증명 파일 형식 및 계좌별 저장소
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod types;
pub mod vault;

pub use self::config::*;
pub use crypto::{CryptoError, FieldCipher};
pub use error::*;
pub use logging::*;
pub use types::*;
pub use vault::CredentialVault;
