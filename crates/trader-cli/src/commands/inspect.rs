//! 저장된 자격증명 조회 및 관리 (show, list, remove).

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use trader_core::CredentialVault;

use super::vault_error;

/// 자격증명 요약 (비밀번호 제외).
#[derive(Debug, Serialize)]
pub struct CredentialSummary {
    /// 계좌 이름
    pub account: String,
    /// 로그인 식별자 (원본 문자열)
    pub login: String,
    /// 숫자 로그인 (숫자로만 구성된 경우)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_number: Option<u64>,
    /// 서버 주소
    pub server: String,
}

/// 계좌 자격증명 요약 조회.
pub fn show(vault: &CredentialVault, account: &str) -> Result<CredentialSummary> {
    let credential = vault.load(account).map_err(|e| vault_error(account, e))?;

    Ok(CredentialSummary {
        account: account.to_string(),
        login: credential.identifier().as_str().to_string(),
        login_number: credential.identifier().as_number(),
        server: credential.endpoint().to_string(),
    })
}

/// 요약 출력.
pub fn print_summary(summary: &CredentialSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Account: {}", summary.account);
    match summary.login_number {
        Some(number) => println!("Login:   {} (numeric {})", summary.login, number),
        None => println!("Login:   {}", summary.login),
    }
    println!("Server:  {}", summary.server);
    Ok(())
}

/// 등록된 계좌 목록 출력.
pub fn list(vault: &CredentialVault, json: bool) -> Result<Vec<String>> {
    let accounts = vault
        .accounts()
        .with_context(|| format!("Failed to list {}", vault.root().display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
    } else if accounts.is_empty() {
        println!("No credentials enrolled in {}", vault.root().display());
    } else {
        println!("{:<4} ACCOUNT", "#");
        println!("{}", "-".repeat(24));
        for (i, account) in accounts.iter().enumerate() {
            println!("{:<4} {}", i + 1, account);
        }
    }

    Ok(accounts)
}

/// 계좌 자격증명 삭제.
pub fn remove(vault: &CredentialVault, account: &str) -> Result<bool> {
    let existed = vault.exists(account)?;
    vault
        .remove(account)
        .with_context(|| format!("Failed to remove credentials for '{}'", account))?;

    if existed {
        info!(account, "Removed credentials");
        println!("Removed credentials for '{}'", account);
    } else {
        println!("No credentials enrolled for '{}'", account);
    }
    Ok(existed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_omits_secret() {
        let dir = tempfile::tempdir().unwrap();
        let vault = CredentialVault::new(dir.path());
        vault.store("demo", "12345678", "hunter2", "MetaQuotes-Demo").unwrap();

        let summary = show(&vault, "demo").unwrap();
        assert_eq!(summary.login_number, Some(12345678));

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"login_number\":12345678"));
    }

    #[test]
    fn test_show_missing_account() {
        let dir = tempfile::tempdir().unwrap();
        let vault = CredentialVault::new(dir.path());

        let err = show(&vault, "ghost").unwrap_err();
        assert!(err.to_string().contains("trader enroll --account ghost"));
    }

    #[test]
    fn test_list_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let vault = CredentialVault::new(dir.path().join("credentials"));
        assert!(list(&vault, true).unwrap().is_empty());

        vault.store("live", "1", "a", "Live").unwrap();
        vault.store("demo", "2", "b", "Demo").unwrap();
        assert_eq!(list(&vault, false).unwrap(), vec!["demo", "live"]);

        assert!(remove(&vault, "demo").unwrap());
        assert!(!remove(&vault, "demo").unwrap());
        assert_eq!(list(&vault, true).unwrap(), vec!["live"]);
    }
}
