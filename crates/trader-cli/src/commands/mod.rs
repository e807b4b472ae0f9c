//! CLI 명령어 구현 모듈.

pub mod enroll;
pub mod inspect;
pub mod login;

use anyhow::Error;
use trader_core::VaultError;

/// 복호화 실패 시 재등록 안내를 덧붙인 에러 생성.
pub fn vault_error(account: &str, err: VaultError) -> Error {
    if err.requires_reenrollment() {
        let hint = format!(
            "Credentials for '{}' cannot be decrypted. Re-enroll with `trader enroll --account {}`",
            account, account
        );
        Error::new(err).context(hint)
    } else if err.is_not_found() {
        let hint = format!(
            "No credentials enrolled for '{}'. Run `trader enroll --account {}` first",
            account, account
        );
        Error::new(err).context(hint)
    } else {
        Error::new(err)
    }
}
