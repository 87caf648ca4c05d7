//! Secret column codec.
//!
//! Values stored in the `password` column are AES-128-ECB ciphertexts (PKCS#7
//! padding, fixed empty IV), hex encoded. This is byte-compatible with
//! pgcrypto's `encrypt(data, key, 'aes-ecb')`, which the filter side relies on
//! to decrypt in SQL.

use aes::Aes128;
use ecb::cipher::block_padding::Pkcs7;
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use rand::RngCore;
use thiserror::Error;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

/// AES-128 key length in bytes.
pub const KEY_LEN: usize = 16;

/// Codec failures. Each one only affects the field being transformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("secret key must be {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("ciphertext is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("ciphertext could not be decrypted")]
    Decrypt,

    #[error("decrypted value is not valid UTF-8")]
    Utf8,

    #[error("random source failed: {0}")]
    Random(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Encryption capability used for the secret column.
pub trait SecretCodec: Send + Sync {
    /// Encrypt `plaintext` and return hex-encoded ciphertext.
    fn encrypt(&self, plaintext: &str) -> CodecResult<String>;

    /// Decrypt hex-encoded ciphertext.
    fn decrypt(&self, ciphertext: &str) -> CodecResult<String>;

    /// Return exactly `len` random lowercase hex characters.
    fn random_hex(&self, len: usize) -> CodecResult<String>;

    /// Raw key bytes, bound as a parameter when decrypting in SQL.
    fn key(&self) -> &[u8];
}

/// AES-128-ECB codec keyed by a fixed shared secret.
#[derive(Clone)]
pub struct AesCodec {
    key: [u8; KEY_LEN],
}

impl AesCodec {
    /// Create a codec from raw key bytes (must be exactly 16 bytes).
    pub fn new(key: &[u8]) -> CodecResult<Self> {
        let key: [u8; KEY_LEN] = key
            .try_into()
            .map_err(|_| CodecError::InvalidKeyLength(key.len()))?;
        Ok(Self { key })
    }
}

impl std::fmt::Debug for AesCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCodec").field("key", &"<redacted>").finish()
    }
}

impl SecretCodec for AesCodec {
    fn encrypt(&self, plaintext: &str) -> CodecResult<String> {
        let cipher = Aes128EcbEnc::new_from_slice(&self.key)
            .map_err(|_| CodecError::InvalidKeyLength(self.key.len()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Ok(hex::encode(ciphertext))
    }

    fn decrypt(&self, ciphertext: &str) -> CodecResult<String> {
        let bytes = hex::decode(ciphertext)?;
        let cipher = Aes128EcbDec::new_from_slice(&self.key)
            .map_err(|_| CodecError::InvalidKeyLength(self.key.len()))?;
        let plain = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .map_err(|_| CodecError::Decrypt)?;
        String::from_utf8(plain).map_err(|_| CodecError::Utf8)
    }

    fn random_hex(&self, len: usize) -> CodecResult<String> {
        let mut buf = vec![0u8; len.div_ceil(2)];
        rand::thread_rng()
            .try_fill_bytes(&mut buf)
            .map_err(|e| CodecError::Random(e.to_string()))?;
        let mut out = hex::encode(buf);
        out.truncate(len);
        Ok(out)
    }

    fn key(&self) -> &[u8] {
        &self.key
    }
}
