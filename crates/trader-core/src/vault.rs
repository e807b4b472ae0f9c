//! # 자격증명 저장소
//!
//! 자격증명 3요소를 파일 하나에 암호화하여 저장하고 다시 읽어옵니다.
//!
//! ## 파일 형식 (v1, 개행 구분)
//!
//! ```text
//! 1행: 키 (URL-safe Base64, 32바이트)
//! 2행: 암호화된 계좌 식별자
//! 3행: 암호화된 비밀번호
//! 4행: 암호화된 서버 주소
//! ```
//!
//! 버전 필드나 메타데이터는 없습니다. 형식이 바뀌면 파일을 새로 만들어야 합니다.
//! 저장소 디렉토리에는 계좌 이름마다 파일 하나가 `<root>/<account>` 경로로 저장됩니다.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::{CryptoError, FieldCipher};
use crate::error::{RecordField, VaultError, VaultResult};
use crate::types::{AccountId, Credential};

/// 레코드 줄 구분자
const SEPARATOR: u8 = b'\n';

/// 레코드를 구성하는 줄 수 (키 + 필드 3개)
pub const RECORD_LINES: usize = 4;

/// 자격증명을 암호화하여 `destination`에 기록합니다.
///
/// 호출마다 새 키를 생성하며, 기존 파일은 덮어씁니다.
/// 레코드 전체를 한 번의 버퍼 쓰기로 기록합니다.
///
/// # Errors
/// 상위 디렉토리가 없거나 권한이 없으면 `VaultError::Io`를 반환합니다.
pub fn encrypt(
    identifier: &str,
    secret: &str,
    endpoint: &str,
    destination: impl AsRef<Path>,
) -> VaultResult<()> {
    let destination = destination.as_ref();
    let record = encode_record(identifier, secret, endpoint)?;

    write_record(destination, &record).map_err(|e| {
        warn!(path = %destination.display(), error = %e, "Failed to write credential record");
        VaultError::io(destination, e)
    })?;

    debug!(path = %destination.display(), "Credential record written");
    Ok(())
}

/// `source`의 자격증명 레코드를 복호화합니다.
///
/// # Errors
/// - `VaultError::Io`: 파일이 없거나 읽을 수 없음
/// - `VaultError::Malformed`: 4줄 미만
/// - `VaultError::InvalidKey`: 첫 줄이 올바른 키가 아님
/// - `VaultError::DecryptionFailed`: 필드 인증 실패 (재등록 필요)
pub fn decrypt(source: impl AsRef<Path>) -> VaultResult<Credential> {
    let source = source.as_ref();
    let data = Zeroizing::new(fs::read(source).map_err(|e| {
        warn!(path = %source.display(), error = %e, "Failed to read credential record");
        VaultError::io(source, e)
    })?);

    let credential = decode_record(&data).map_err(|e| {
        warn!(path = %source.display(), error = %e, "Failed to decode credential record");
        e
    })?;

    debug!(path = %source.display(), "Credential record decrypted");
    Ok(credential)
}

fn encode_record(identifier: &str, secret: &str, endpoint: &str) -> VaultResult<Zeroizing<Vec<u8>>> {
    let cipher = FieldCipher::generate();
    let key = cipher.encoded_key();

    let mut lines = Vec::with_capacity(RECORD_LINES);
    for (field, value) in [
        (RecordField::Identifier, identifier),
        (RecordField::Secret, secret),
        (RecordField::Endpoint, endpoint),
    ] {
        let token = cipher
            .seal(value, field.label())
            .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;
        lines.push(token);
    }

    let mut record = Zeroizing::new(Vec::new());
    record.extend_from_slice(key.as_bytes());
    for line in &lines {
        record.push(SEPARATOR);
        record.extend_from_slice(line.as_bytes());
    }

    Ok(record)
}

fn decode_record(data: &[u8]) -> VaultResult<Credential> {
    let lines = record_lines(data);
    if lines.len() < RECORD_LINES {
        return Err(VaultError::Malformed { lines: lines.len() });
    }
    if lines.len() > RECORD_LINES {
        debug!(
            extra = lines.len() - RECORD_LINES,
            "Ignoring trailing lines after credential record"
        );
    }

    let cipher = FieldCipher::from_encoded_key(lines[0]).map_err(|e| match e {
        CryptoError::InvalidKeyLength(len) => {
            VaultError::InvalidKey(format!("expected 32 bytes, got {}", len))
        }
        other => VaultError::InvalidKey(other.to_string()),
    })?;

    let open = |line: &[u8], field: RecordField| {
        cipher
            .open(line, field.label())
            .map_err(|_| VaultError::DecryptionFailed { field })
    };

    let identifier = open(lines[1], RecordField::Identifier)?;
    let secret = SecretString::new(open(lines[2], RecordField::Secret)?.into_boxed_str());
    let endpoint = open(lines[3], RecordField::Endpoint)?;

    Ok(Credential::new(AccountId::new(identifier), secret, endpoint))
}

/// 레코드를 줄 단위로 나눕니다.
///
/// 마지막 개행 뒤의 빈 조각은 줄로 세지 않으며, 각 줄 끝의 `\r`은 제거합니다.
fn record_lines(data: &[u8]) -> Vec<&[u8]> {
    if data.is_empty() {
        return Vec::new();
    }

    let body = data.strip_suffix(&[SEPARATOR]).unwrap_or(data);
    body.split(|b| *b == SEPARATOR)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}

#[cfg(unix)]
fn write_record(path: &Path, record: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(record)?;
    file.flush()
}

#[cfg(not(unix))]
fn write_record(path: &Path, record: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(record)?;
    file.flush()
}

/// 계좌 이름별 자격증명 파일 디렉토리.
#[derive(Debug, Clone)]
pub struct CredentialVault {
    root: PathBuf,
}

impl CredentialVault {
    /// 저장소 루트 디렉토리로 생성합니다. 디렉토리는 첫 저장 시 만들어집니다.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 저장소 루트 디렉토리
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 계좌 이름에 해당하는 파일 경로 (`<root>/<account>`).
    ///
    /// # Errors
    /// 이름이 비어 있거나 `.`/`..`이거나 경로 구분자를 포함하면
    /// `VaultError::InvalidAccountName`을 반환합니다.
    pub fn path_for(&self, account: &str) -> VaultResult<PathBuf> {
        validate_account_name(account)?;
        Ok(self.root.join(account))
    }

    /// 자격증명을 암호화하여 저장합니다. 루트 디렉토리가 없으면 생성합니다.
    pub fn store(
        &self,
        account: &str,
        identifier: &str,
        secret: &str,
        endpoint: &str,
    ) -> VaultResult<PathBuf> {
        let path = self.path_for(account)?;

        if !self.root.is_dir() {
            fs::create_dir_all(&self.root).map_err(|e| VaultError::io(&self.root, e))?;
            info!(root = %self.root.display(), "Created credential vault directory");
        }

        encrypt(identifier, secret, endpoint, &path)?;
        info!(account, path = %path.display(), "Credentials stored");
        Ok(path)
    }

    /// 저장된 자격증명을 복호화합니다.
    pub fn load(&self, account: &str) -> VaultResult<Credential> {
        let path = self.path_for(account)?;
        decrypt(&path)
    }

    /// 계좌 자격증명 파일이 존재하는지 확인합니다.
    pub fn exists(&self, account: &str) -> VaultResult<bool> {
        Ok(self.path_for(account)?.is_file())
    }

    /// 계좌 자격증명을 삭제합니다. 파일이 없어도 성공합니다.
    pub fn remove(&self, account: &str) -> VaultResult<()> {
        let path = self.path_for(account)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(account, "Credentials removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::io(path, e)),
        }
    }

    /// 저장된 계좌 이름 목록 (정렬됨). 루트가 없으면 빈 목록을 반환합니다.
    pub fn accounts(&self) -> VaultResult<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VaultError::io(&self.root, e)),
        };

        let mut accounts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VaultError::io(&self.root, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| VaultError::io(entry.path(), e))?
                .is_file();
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                accounts.push(name.to_string());
            }
        }

        accounts.sort();
        Ok(accounts)
    }
}

fn validate_account_name(account: &str) -> VaultResult<()> {
    let invalid = account.is_empty()
        || account == "."
        || account == ".."
        || account
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || std::path::is_separator(c));

    if invalid {
        return Err(VaultError::InvalidAccountName(account.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_record_lines_ignores_final_newline() {
        assert_eq!(record_lines(b"a\nb\nc\nd").len(), 4);
        assert_eq!(record_lines(b"a\nb\nc\nd\n").len(), 4);
        assert_eq!(record_lines(b"a\nb\n").len(), 2);
        assert!(record_lines(b"").is_empty());
    }

    #[test]
    fn test_record_lines_strips_carriage_return() {
        let lines = record_lines(b"key\r\none\r\ntwo\r\nthree\r\n");
        assert_eq!(lines, vec![&b"key"[..], b"one", b"two", b"three"]);
    }

    #[test]
    fn test_encode_decode_record() {
        let record = encode_record("12345678", "p@ss word", "Broker-Live").unwrap();
        assert_eq!(record_lines(&record).len(), RECORD_LINES);

        let credential = decode_record(&record).unwrap();
        assert_eq!(credential.identifier().as_number(), Some(12345678));
        assert_eq!(credential.secret().expose_secret(), "p@ss word");
        assert_eq!(credential.endpoint(), "Broker-Live");
    }

    #[test]
    fn test_each_record_uses_fresh_key() {
        let first = encode_record("1", "2", "3").unwrap();
        let second = encode_record("1", "2", "3").unwrap();

        assert_ne!(record_lines(&first)[0], record_lines(&second)[0]);
    }

    #[test]
    fn test_swapped_field_lines_fail() {
        // 필드 위치가 암호문에 바인딩되어 있으므로 줄을 바꾸면 인증 실패
        let record = encode_record("id", "secret", "server").unwrap();
        let lines = record_lines(&record);
        let swapped = [lines[0], lines[3], lines[2], lines[1]].join(&b'\n');

        let result = decode_record(&swapped);
        assert!(matches!(
            result,
            Err(VaultError::DecryptionFailed {
                field: RecordField::Identifier
            })
        ));
    }

    #[test]
    fn test_invalid_key_line() {
        let record = encode_record("id", "secret", "server").unwrap();
        let lines = record_lines(&record);
        let broken = [&b"short"[..], lines[1], lines[2], lines[3]].join(&b'\n');

        let result = decode_record(&broken);
        assert!(matches!(result, Err(VaultError::InvalidKey(_))));
    }

    #[test]
    fn test_account_name_validation() {
        let vault = CredentialVault::new("credentials");

        assert!(vault.path_for("demo_account").is_ok());
        assert!(vault.path_for("live.txt").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "nul\0byte"] {
            assert!(
                matches!(vault.path_for(bad), Err(VaultError::InvalidAccountName(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_path_for_joins_root() {
        let vault = CredentialVault::new("credentials");
        assert_eq!(
            vault.path_for("demo").unwrap(),
            Path::new("credentials").join("demo")
        );
    }
}
