//! Optional at-rest obfuscation of save files.
//!
//! # Not a Security Boundary
//!
//! The passphrase is a constant compiled into every build. Anyone holding the
//! binary can recover it. Ciphering only keeps casual players from editing
//! their times in a text editor.
//!
//! # Format
//!
//! [`AesTextCipher`] output is `base64(iv || ciphertext)` where the key is
//! SHA-256 of the passphrase, the IV is 16 random bytes, and the plaintext is
//! AES-256-CBC encrypted with PKCS#7 padding.

use std::sync::Arc;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Embedded passphrase for stored profiles.
pub const PASS_PHRASE: &str = "_+$3a0-1!d";

const BLOCK_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("ciphertext length {0} is not a whole number of blocks")]
    Length(usize),

    #[error("bad padding")]
    Padding,

    #[error("plaintext is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Text-to-text symmetric cipher.
pub trait TextCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str, passphrase: &str) -> Result<String, CipherError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AesTextCipher;

impl TextCipher for AesTextCipher {
    fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<String, CipherError> {
        let key = Sha256::digest(passphrase.as_bytes());

        let mut iv = [0u8; BLOCK_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let body = Aes256CbcEnc::new(&key, &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut out = Vec::with_capacity(BLOCK_LEN + body.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&body);
        Ok(STANDARD.encode(out))
    }

    fn decrypt(&self, ciphertext: &str, passphrase: &str) -> Result<String, CipherError> {
        let key = Sha256::digest(passphrase.as_bytes());
        let raw = STANDARD.decode(ciphertext.trim())?;

        if raw.len() < 2 * BLOCK_LEN || raw.len() % BLOCK_LEN != 0 {
            return Err(CipherError::Length(raw.len()));
        }

        let (iv, body) = raw.split_at(BLOCK_LEN);
        let data = Aes256CbcDec::new(&key, iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(body)
            .map_err(|_| CipherError::Padding)?;

        Ok(String::from_utf8(data)?)
    }
}

/// Applies the cipher to stored text when ciphering is enabled.
///
/// Whether ciphering is enabled is fixed at construction; the stored format
/// does not record it.
#[derive(Clone)]
pub struct CipherAdapter {
    cipher: Arc<dyn TextCipher>,
    enabled: bool,
}

impl CipherAdapter {
    pub fn new(cipher: Arc<dyn TextCipher>, enabled: bool) -> Self {
        Self { cipher, enabled }
    }

    /// Adapter over [`AesTextCipher`].
    pub fn aes(enabled: bool) -> Self {
        Self::new(Arc::new(AesTextCipher), enabled)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn encode(&self, text: &str) -> Result<String, CipherError> {
        if !self.enabled {
            return Ok(text.to_string());
        }
        self.cipher.encrypt(text, PASS_PHRASE)
    }

    pub fn decode(&self, text: &str) -> Result<String, CipherError> {
        if !self.enabled {
            return Ok(text.to_string());
        }
        self.cipher.decrypt(text, PASS_PHRASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_roundtrip() {
        let cipher = AesTextCipher;
        let text = r#"{"profileName":"Ada","progressMetrics":[]}"#;

        let encrypted = cipher.encrypt(text, PASS_PHRASE).unwrap();
        assert_ne!(encrypted, text);
        assert_eq!(cipher.decrypt(&encrypted, PASS_PHRASE).unwrap(), text);
    }

    #[test]
    fn aes_handles_block_aligned_and_empty_input() {
        let cipher = AesTextCipher;
        for text in ["", "0123456789abcdef", "ünïcödé"] {
            let encrypted = cipher.encrypt(text, PASS_PHRASE).unwrap();
            assert_eq!(cipher.decrypt(&encrypted, PASS_PHRASE).unwrap(), text);
        }
    }

    #[test]
    fn aes_pads_aligned_input_with_full_block() {
        let cipher = AesTextCipher;
        let encrypted = cipher.encrypt("0123456789abcdef", PASS_PHRASE).unwrap();
        let raw = STANDARD.decode(encrypted).unwrap();

        // iv, one data block, one padding block
        assert_eq!(raw.len(), 3 * BLOCK_LEN);
    }

    #[test]
    fn aes_uses_fresh_iv() {
        let cipher = AesTextCipher;
        let a = cipher.encrypt("same", PASS_PHRASE).unwrap();
        let b = cipher.encrypt("same", PASS_PHRASE).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn aes_rejects_plain_json() {
        let cipher = AesTextCipher;
        assert!(cipher.decrypt(r#"{"profileName":"Ada"}"#, PASS_PHRASE).is_err());
    }

    #[test]
    fn aes_rejects_truncated_ciphertext() {
        let cipher = AesTextCipher;
        let short = STANDARD.encode([0u8; 20]);
        assert!(matches!(
            cipher.decrypt(&short, PASS_PHRASE),
            Err(CipherError::Length(20))
        ));
    }

    #[test]
    fn disabled_adapter_passes_through() {
        let adapter = CipherAdapter::aes(false);
        assert!(!adapter.is_enabled());
        assert_eq!(adapter.encode("plain").unwrap(), "plain");
        assert_eq!(adapter.decode("plain").unwrap(), "plain");
    }

    #[test]
    fn enabled_adapter_ciphers() {
        let adapter = CipherAdapter::aes(true);
        let encoded = adapter.encode("secret").unwrap();

        assert_ne!(encoded, "secret");
        assert_eq!(adapter.decode(&encoded).unwrap(), "secret");
    }
}
