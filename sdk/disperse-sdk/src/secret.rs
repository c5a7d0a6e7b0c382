//! Deterministic secret derivation and seed encryption.
//!
//! The owner signs their own public key text; that signature, rendered as
//! text, salts a PBKDF2 derivation of an AES-256 key. The signature is never
//! stored, so the persisted blob is only readable by someone who can produce
//! the same signature again.
//!
//! # Limitations
//!
//! [`ZeroIvAesCbc`] uses a fixed password and an all-zero IV. Encryption is
//! therefore deterministic and not semantically secure. It is kept only so
//! that blobs written by earlier clients remain recoverable; do not use it for
//! anything other than this single local slot. New schemes plug in through
//! [`SeedCipher`].

use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::Sha256;
use std::fmt;

use crate::core::signer::OwnerSigner;
use crate::error::{DisperseError, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub const PBKDF2_ITERATIONS: u32 = 100_000;
pub const PBKDF2_PASSWORD: &[u8] = b"dummy-password";
pub const IV_LEN: usize = 16;

/// Secret text derived from an owner signature. Kept in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretMaterial(String);

impl SecretMaterial {
    /// Textual form of raw signature bytes: decimal values joined by commas.
    pub fn from_signature_bytes(bytes: &[u8]) -> Self {
        Self(join_decimal(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretMaterial(..)")
    }
}

/// Sign the owner's own public key text and turn the signature into secret material.
pub async fn derive_secret(owner_text: &str, signer: &dyn OwnerSigner) -> Result<SecretMaterial> {
    if owner_text.is_empty() {
        return Err(DisperseError::Signing("Owner public key text is empty".to_string()));
    }
    let signature = signer
        .sign_message(owner_text.as_bytes())
        .await
        .map_err(DisperseError::Signing)?;
    Ok(SecretMaterial::from_signature_bytes(signature.as_ref()))
}

/// Persisted form of an encrypted seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
}

impl EncryptedBlob {
    /// Storage encoding: base64 of the ciphertext. The IV is implied by the scheme.
    pub fn to_storage_string(&self) -> String {
        STANDARD.encode(&self.ciphertext)
    }

    pub fn from_storage_string(value: &str) -> Result<Self> {
        let ciphertext = STANDARD
            .decode(value.trim())
            .map_err(|e| {
                DisperseError::DecryptionFailed(format!("Stored blob is not base64: {}", e))
            })?;
        Ok(Self {
            ciphertext,
            iv: [0u8; IV_LEN],
        })
    }
}

/// Symmetric scheme protecting the persisted intermediary seed.
pub trait SeedCipher: Send + Sync {
    fn encrypt(&self, secret: &SecretMaterial, plaintext: &str) -> Result<EncryptedBlob>;

    /// Fails with [`DisperseError::DecryptionFailed`] when `secret` is not the
    /// one the blob was written with.
    fn decrypt(&self, secret: &SecretMaterial, blob: &EncryptedBlob) -> Result<String>;
}

/// PBKDF2-HMAC-SHA256 / AES-256-CBC / PKCS#7 with a zero IV.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroIvAesCbc;

impl ZeroIvAesCbc {
    pub fn derive_key(secret: &SecretMaterial) -> [u8; 32] {
        let mut key = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            PBKDF2_PASSWORD,
            secret.as_bytes(),
            PBKDF2_ITERATIONS,
            &mut key,
        );
        key
    }
}

impl SeedCipher for ZeroIvAesCbc {
    fn encrypt(&self, secret: &SecretMaterial, plaintext: &str) -> Result<EncryptedBlob> {
        let key = Self::derive_key(secret);
        let iv = [0u8; IV_LEN];
        let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Ok(EncryptedBlob { ciphertext, iv })
    }

    fn decrypt(&self, secret: &SecretMaterial, blob: &EncryptedBlob) -> Result<String> {
        if blob.ciphertext.is_empty() || blob.ciphertext.len() % IV_LEN != 0 {
            return Err(DisperseError::DecryptionFailed(format!(
                "Ciphertext length {} is not a positive multiple of {}",
                blob.ciphertext.len(),
                IV_LEN
            )));
        }
        let key = Self::derive_key(secret);
        let plaintext = Aes256CbcDec::new(&key.into(), &blob.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&blob.ciphertext)
            .map_err(|_| DisperseError::DecryptionFailed("Invalid padding".to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|_| DisperseError::DecryptionFailed("Plaintext is not UTF-8".to_string()))
    }
}

/// `[1, 22, 255]` -> `"1,22,255"`
pub(crate) fn join_decimal(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Inverse of [`join_decimal`].
pub(crate) fn split_decimal(text: &str) -> Option<Vec<u8>> {
    text.split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect()
}
