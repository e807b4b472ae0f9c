//! 자격증명 타입 정의.
//!
//! 이 모듈은 터미널 로그인에 필요한 타입을 정의합니다:
//! - `AccountId` - 계좌 식별자 (문자열 + 선택적 숫자 형태)
//! - `Credential` - (식별자, 비밀번호, 서버) 자격증명 3요소

use secrecy::SecretString;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 계좌 식별자.
///
/// 원본 문자열은 항상 보존되며, 문자열 전체가 ASCII 10진 숫자로 이루어져 있고
/// `u64` 범위에 들어가는 경우에만 숫자 형태가 추가로 제공됩니다.
/// 터미널 API는 숫자 로그인을 받기 때문에 직렬화 시 숫자 형태를 우선합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId {
    raw: String,
    number: Option<u64>,
}

impl AccountId {
    /// 새 계좌 식별자를 생성합니다.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let number = parse_decimal(&raw);
        Self { raw, number }
    }

    /// 원본 문자열 반환.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 숫자 형태 반환 (숫자로만 구성된 경우).
    pub fn as_number(&self) -> Option<u64> {
        self.number
    }

    /// 숫자 계좌인지 확인합니다.
    pub fn is_numeric(&self) -> bool {
        self.number.is_some()
    }

    /// 원본 문자열로 변환합니다.
    pub fn into_string(self) -> String {
        self.raw
    }
}

fn parse_decimal(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for AccountId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for AccountId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for AccountId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<u64> for AccountId {
    fn from(number: u64) -> Self {
        Self {
            raw: number.to_string(),
            number: Some(number),
        }
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.number {
            Some(number) => serializer.serialize_u64(number),
            None => serializer.serialize_str(&self.raw),
        }
    }
}

/// 터미널 로그인 자격증명.
///
/// 비밀번호는 `SecretString`으로 보관되어 `Debug` 출력에 노출되지 않으며
/// drop 시 메모리가 0으로 덮어써집니다.
#[derive(Debug)]
pub struct Credential {
    identifier: AccountId,
    secret: SecretString,
    endpoint: String,
}

impl Credential {
    /// 새 자격증명을 생성합니다.
    pub fn new(
        identifier: impl Into<AccountId>,
        secret: SecretString,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            secret,
            endpoint: endpoint.into(),
        }
    }

    /// 계좌 식별자
    pub fn identifier(&self) -> &AccountId {
        &self.identifier
    }

    /// 비밀번호
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    /// 서버(브로커) 주소
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_numeric_account_id() {
        let id = AccountId::new("12345678");
        assert_eq!(id.as_str(), "12345678");
        assert_eq!(id.as_number(), Some(12345678));
        assert!(id.is_numeric());
    }

    #[test]
    fn test_alphanumeric_account_id() {
        let id = AccountId::new("abc123");
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(id.as_number(), None);
    }

    #[test]
    fn test_non_ascii_and_signed_digits_stay_strings() {
        assert_eq!(AccountId::new("").as_number(), None);
        assert_eq!(AccountId::new("-42").as_number(), None);
        assert_eq!(AccountId::new("+42").as_number(), None);
        assert_eq!(AccountId::new(" 42").as_number(), None);
        // 전각 숫자
        assert_eq!(AccountId::new("１２３").as_number(), None);
    }

    #[test]
    fn test_overflowing_digits_stay_strings() {
        let id = AccountId::new("123456789012345678901234567890");
        assert_eq!(id.as_number(), None);
        assert_eq!(id.as_str(), "123456789012345678901234567890");
    }

    #[test]
    fn test_leading_zeros_keep_raw_form() {
        let id = AccountId::new("00042");
        assert_eq!(id.as_number(), Some(42));
        assert_eq!(id.to_string(), "00042");
    }

    #[test]
    fn test_account_id_serialization() {
        let numeric = serde_json::to_string(&AccountId::new("5001234")).unwrap();
        assert_eq!(numeric, "5001234");

        let text = serde_json::to_string(&AccountId::new("demo-01")).unwrap();
        assert_eq!(text, "\"demo-01\"");
    }

    #[test]
    fn test_credential_debug_hides_secret() {
        let credential = Credential::new(
            "12345678",
            SecretString::new("hunter2".into()),
            "MetaQuotes-Demo",
        );

        let debug = format!("{:?}", credential);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("MetaQuotes-Demo"));
        assert_eq!(credential.secret().expose_secret(), "hunter2");
    }
}
