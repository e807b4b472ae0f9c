//! 터미널 클라이언트 trait 정의.
//!
//! 외부 트레이딩 터미널 라이브러리를 감싸는 최소 기능 인터페이스입니다.
//! 이 계약을 만족하는 클라이언트는 모두 `SessionManager`에 연결할 수 있습니다.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use trader_core::AccountId;

/// 터미널이 보고하는 결과 코드 상수 모음.
pub mod codes {
    /// 성공
    pub const SUCCESS: i32 = 1;
    /// 일반 실패
    pub const FAIL: i32 = -1;
    /// 잘못된 인자
    pub const INVALID_PARAMS: i32 = -2;
    /// 메모리 부족
    pub const NO_MEMORY: i32 = -3;
    /// 항목 없음
    pub const NOT_FOUND: i32 = -4;
    /// 지원하지 않는 버전
    pub const INVALID_VERSION: i32 = -5;
    /// 인증 실패
    pub const AUTH_FAILED: i32 = -6;
    /// 지원하지 않는 메서드
    pub const UNSUPPORTED: i32 = -7;
    /// 내부 IPC 송신 실패
    pub const IPC_SEND_FAILED: i32 = -10001;
    /// 내부 IPC 수신 실패
    pub const IPC_RECEIVE_FAILED: i32 = -10002;
    /// IPC 초기화 실패
    pub const IPC_INIT_FAILED: i32 = -10003;
    /// IPC 연결 없음
    pub const NO_IPC: i32 = -10004;
    /// IPC 타임아웃
    pub const IPC_TIMEOUT: i32 = -10005;
}

/// 터미널이 보고한 마지막 결과 (코드 + 메시지).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalError {
    /// 결과 코드 (`codes` 참조)
    pub code: i32,
    /// 결과 메시지
    #[serde(default)]
    pub message: String,
}

impl TerminalError {
    /// 새 결과 생성.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 성공 결과.
    pub fn success() -> Self {
        Self::new(codes::SUCCESS, "Success")
    }

    /// 성공 코드인지 확인.
    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }

    /// 같은 요청을 다시 시도하면 성공할 수 있는 코드인지 확인.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code,
            codes::IPC_TIMEOUT | codes::NO_IPC | codes::IPC_SEND_FAILED | codes::IPC_RECEIVE_FAILED
        )
    }
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.code, self.message)
    }
}

/// 터미널 버전 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalVersion {
    /// 터미널 버전
    pub version: u32,
    /// 빌드 번호
    pub build: u32,
    /// 빌드 릴리스 날짜
    #[serde(default)]
    pub release: String,
}

impl fmt::Display for TerminalVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {:?})", self.version, self.build, self.release)
    }
}

/// 터미널 상태 정보 (키/값).
///
/// 데이터 교환 디렉토리 계산에 쓰이는 `data_path` 키를 포함합니다.
/// 역직렬화 시 문자열이 아닌 값(불리언, 숫자 등)은 문자열로 변환됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TerminalStatus {
    fields: BTreeMap<String, String>,
}

impl TerminalStatus {
    /// 데이터 디렉토리 키
    pub const DATA_PATH: &'static str = "data_path";

    /// 빈 상태 정보 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드 추가 (빌더).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// 필드 추가.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// 필드 조회.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// 터미널 데이터 디렉토리.
    pub fn data_path(&self) -> Option<&Path> {
        self.get(Self::DATA_PATH)
            .filter(|path| !path.is_empty())
            .map(Path::new)
    }

    /// 모든 필드 (키 순서).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 필드 수.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 필드가 없는지 확인.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'de> Deserialize<'de> for TerminalStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(key, value)| (key, status_value_to_string(value)))
            .collect())
    }
}

/// 상태 값을 문자열로 변환. `null`은 빈 문자열, 배열/객체는 JSON 텍스트.
fn status_value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TerminalStatus {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 터미널 초기화 요청.
#[derive(Debug, Clone, Copy)]
pub struct InitRequest<'a> {
    /// 계좌 식별자
    pub login: &'a AccountId,
    /// 비밀번호
    pub password: &'a SecretString,
    /// 서버 주소
    pub server: &'a str,
    /// 연결 타임아웃 (클라이언트가 적용)
    pub timeout: Duration,
    /// 터미널 실행 파일 경로 (선택)
    pub terminal_path: Option<&'a Path>,
}

/// 외부 터미널 클라이언트 인터페이스.
///
/// 모든 호출은 동기식이며 호출 스레드를 블록합니다.
/// 타임아웃은 `InitRequest::timeout`으로 전달되어 클라이언트가 적용합니다.
pub trait TerminalClient {
    /// 터미널 초기화 및 로그인. 성공하면 `true`.
    fn initialize(&mut self, request: &InitRequest<'_>) -> bool;

    /// 마지막 호출의 결과 코드.
    fn last_error(&self) -> TerminalError;

    /// 클라이언트 핸들 해제. 초기화되지 않은 상태에서도 호출할 수 있어야 합니다.
    fn shutdown(&mut self);

    /// 터미널 버전 정보 (연결된 경우).
    fn version_info(&mut self) -> Option<TerminalVersion>;

    /// 터미널 상태 정보 (연결된 경우).
    fn terminal_status(&mut self) -> Option<TerminalStatus>;
}

impl<T: TerminalClient + ?Sized> TerminalClient for Box<T> {
    fn initialize(&mut self, request: &InitRequest<'_>) -> bool {
        (**self).initialize(request)
    }

    fn last_error(&self) -> TerminalError {
        (**self).last_error()
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }

    fn version_info(&mut self) -> Option<TerminalVersion> {
        (**self).version_info()
    }

    fn terminal_status(&mut self) -> Option<TerminalStatus> {
        (**self).terminal_status()
    }
}
