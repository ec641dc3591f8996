//! Hash and cipher primitives behind the access controller.
//!
//! The controller only sees [`CryptoProvider`]: a 32-byte digest for PIN
//! comparison and a keyed cipher for audit lines leaving the device.
//! [`StandardCrypto`] backs it with SHA-256 and AES-256-GCM.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// AES-GCM nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// Digest size in bytes.
pub const DIGEST_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed")]
    Encryption,

    #[error("Decryption failed: {0}")]
    Decryption(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Key protecting audit lines in transit. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AuditKey([u8; KEY_SIZE]);

impl AuditKey {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self(key)
    }

    /// Fresh random key from the OS generator.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Parse 64 hex characters.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKey` on bad hex or a wrong length.
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut key = [0u8; KEY_SIZE];
        hex::decode_to_slice(s.trim(), &mut key).map_err(|e| {
            CryptoError::InvalidKey(format!("expected {} hex characters: {e}", KEY_SIZE * 2))
        })?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for AuditKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuditKey(..)")
    }
}

/// Cryptographic primitives used by the access controller.
pub trait CryptoProvider: Send + Sync {
    /// Collision-resistant 32-byte digest.
    fn hash(&self, data: &[u8]) -> [u8; DIGEST_SIZE];

    /// Encrypt `plaintext` under `key`. The output is self-contained: it
    /// carries whatever the receiving side needs besides the key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encryption` if the cipher refuses the input.
    fn cipher(&self, plaintext: &[u8], key: &AuditKey) -> Result<Vec<u8>>;
}

/// SHA-256 digests and AES-256-GCM sealing.
///
/// Sealed output is `nonce (12 bytes) || ciphertext || tag (16 bytes)`
/// with a fresh random nonce per call.
///
/// # Examples
///
/// ```
/// use securelock_crypto::{AuditKey, CryptoProvider, StandardCrypto};
///
/// let crypto = StandardCrypto;
/// let key = AuditKey::generate();
///
/// let sealed = crypto.cipher(b"User1: GRANTED - Access granted", &key).unwrap();
/// let opened = StandardCrypto::open(&sealed, &key).unwrap();
/// assert_eq!(opened, b"User1: GRANTED - Access granted");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCrypto;

impl StandardCrypto {
    /// Reverse [`cipher`](CryptoProvider::cipher).
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decryption` if the input is too short, was
    /// sealed under another key, or was tampered with.
    pub fn open(sealed: &[u8], key: &AuditKey) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_SIZE {
            return Err(CryptoError::Decryption(format!(
                "sealed message shorter than {NONCE_SIZE}-byte nonce"
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CryptoError::Decryption(e.to_string()))
    }
}

impl CryptoProvider for StandardCrypto {
    fn hash(&self, data: &[u8]) -> [u8; DIGEST_SIZE] {
        Sha256::digest(data).into()
    }

    fn cipher(&self, plaintext: &[u8], key: &AuditKey) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.as_bytes().into());

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(&Nonce::from(nonce), plaintext)
            .map_err(|_| CryptoError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }
}

/// Encrypt an audit line and hex-encode it for a line-oriented transport.
///
/// # Errors
///
/// Propagates the provider's cipher error.
pub fn seal_line<C: CryptoProvider + ?Sized>(
    crypto: &C,
    key: &AuditKey,
    line: &str,
) -> Result<String> {
    crypto.cipher(line.as_bytes(), key).map(hex::encode)
}

/// Reverse [`seal_line`] for a [`StandardCrypto`]-sealed line.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` on bad hex, a wrong key, tampering,
/// or a plaintext that is not UTF-8.
pub fn open_line(key: &AuditKey, sealed: &str) -> Result<String> {
    let bytes =
        hex::decode(sealed.trim()).map_err(|e| CryptoError::Decryption(e.to_string()))?;
    let plain = StandardCrypto::open(&bytes, key)?;
    String::from_utf8(plain).map_err(|e| CryptoError::Decryption(e.to_string()))
}
