//! # 필드 암호화 모듈
//!
//! AES-256-GCM을 사용해 자격증명 필드를 하나씩 암호화/복호화합니다.
//!
//! ## 보안 고려사항
//! - 자격증명 파일마다 새로운 256비트 키를 생성 (키 재사용 없음)
//! - 필드마다 고유한 nonce (12바이트) 사용
//! - 토큰 = URL-safe Base64(nonce || 암호문 || 태그), 개행 문자를 포함하지 않음
//! - 키 바이트는 drop 시 0으로 덮어씀

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// 암호화 에러
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(base64::DecodeError),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Malformed token: {0}")]
    MalformedToken(String),
}

/// AES-256-GCM nonce 크기 (바이트)
pub const NONCE_SIZE: usize = 12;

/// AES-256 키 크기 (바이트)
pub const KEY_SIZE: usize = 32;

/// GCM 인증 태그 크기 (바이트)
pub const TAG_SIZE: usize = 16;

/// 단일 키로 여러 필드를 암호화하는 암호기.
///
/// 자격증명 레코드 하나당 인스턴스 하나를 사용합니다.
pub struct FieldCipher {
    cipher: Aes256Gcm,
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl FieldCipher {
    /// 새로운 랜덤 키로 암호기 생성
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng.fill_bytes(&mut key[..]);
        Self::from_key(key)
    }

    /// Base64로 인코딩된 키에서 암호기 복원
    ///
    /// # Arguments
    /// * `encoded` - 자격증명 파일 첫 줄의 키 (URL-safe Base64, 32바이트)
    pub fn from_encoded_key(encoded: &[u8]) -> Result<Self, CryptoError> {
        let decoded = Zeroizing::new(
            URL_SAFE
                .decode(encoded)
                .map_err(CryptoError::InvalidKeyEncoding)?,
        );

        if decoded.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength(decoded.len()));
        }

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(&decoded);
        Ok(Self::from_key(key))
    }

    fn from_key(key: Zeroizing<[u8; KEY_SIZE]>) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
        Self { cipher, key }
    }

    /// 파일에 기록할 키 문자열 (URL-safe Base64)
    pub fn encoded_key(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(&self.key[..]))
    }

    /// 랜덤 nonce 생성
    pub fn generate_nonce() -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }

    /// 문자열 필드를 암호화하여 토큰으로 반환
    ///
    /// `aad`는 암호문에 바인딩되는 부가 데이터로, 복호화 시 같은 값을 넘겨야 합니다.
    pub fn seal(&self, plaintext: &str, aad: &[u8]) -> Result<String, CryptoError> {
        let nonce_bytes = Self::generate_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut token = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);

        Ok(URL_SAFE.encode(token))
    }

    /// 토큰을 복호화하여 원문 반환
    ///
    /// 토큰이 변조되었거나 다른 키로 암호화된 경우 `DecryptionFailed`를 반환하며,
    /// 변조된 평문을 돌려주는 일은 없습니다.
    pub fn open(&self, token: &[u8], aad: &[u8]) -> Result<String, CryptoError> {
        let decoded = URL_SAFE
            .decode(token)
            .map_err(|e| CryptoError::MalformedToken(e.to_string()))?;

        if decoded.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::MalformedToken(format!(
                "token too short: {} bytes",
                decoded.len()
            )));
        }

        let (nonce_bytes, ciphertext) = decoded.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            zeroize::Zeroize::zeroize(&mut bytes);
            CryptoError::DecryptionFailed("plaintext is not valid UTF-8".to_string())
        })
    }
}
