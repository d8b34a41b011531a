//! AES-256-GCM sealing of account secrets at rest.
//!
//! A sealed value is one BLOB: `nonce (12) || ciphertext || tag (16)`.
//! Every seal draws a fresh random nonce, so equal passwords never produce
//! equal blobs.

use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::{Zeroize, Zeroizing};

use crate::types::errors::CryptoError;

/// AES-256-GCM key length in bytes.
pub const KEY_LENGTH: usize = 32;

const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;

/// Yields its nonce once; each seal or open builds a fresh key around it.
struct SingleNonce {
    nonce: Option<[u8; NONCE_LENGTH]>,
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.nonce
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

/// Seals and opens secret columns with one database key.
pub struct SecretCipher {
    key: Zeroizing<Vec<u8>>,
    rng: SystemRandom,
}

impl SecretCipher {
    /// Creates a cipher over a fresh random key.
    pub fn generate() -> Result<Self, CryptoError> {
        let rng = SystemRandom::new();
        let mut key = Zeroizing::new(vec![0u8; KEY_LENGTH]);
        rng.fill(&mut key)
            .map_err(|_| CryptoError::RandomGeneration("failed to generate key".to_string()))?;
        Ok(Self { key, rng })
    }

    /// Creates a cipher over existing key material.
    pub fn from_key(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKey(format!(
                "key must be {} bytes, got {}",
                KEY_LENGTH,
                key.len()
            )));
        }
        Ok(Self { key: Zeroizing::new(key.to_vec()), rng: SystemRandom::new() })
    }

    /// Raw key bytes, for persisting to the key file.
    pub(crate) fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    fn unbound_key(&self) -> Result<UnboundKey, CryptoError> {
        UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|_| CryptoError::InvalidKey("rejected by AES-256-GCM".to_string()))
    }

    /// Encrypts `plaintext` into a self-contained blob.
    pub fn seal(&self, plaintext: &str) -> Result<Vec<u8>, CryptoError> {
        let mut nonce = [0u8; NONCE_LENGTH];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| CryptoError::RandomGeneration("failed to generate nonce".to_string()))?;

        let mut sealing_key = aead::SealingKey::new(self.unbound_key()?, SingleNonce { nonce: Some(nonce) });
        let mut in_out = plaintext.as_bytes().to_vec();
        sealing_key
            .seal_in_place_append_tag(Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Encryption("seal failed".to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LENGTH + in_out.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&in_out);
        in_out.zeroize();
        Ok(blob)
    }

    /// Decrypts a blob produced by [`SecretCipher::seal`].
    pub fn open(&self, blob: &[u8]) -> Result<String, CryptoError> {
        if blob.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CryptoError::Decryption(format!(
                "sealed value is {} bytes, need at least {}",
                blob.len(),
                NONCE_LENGTH + TAG_LENGTH
            )));
        }
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(&blob[..NONCE_LENGTH]);

        let mut opening_key = aead::OpeningKey::new(self.unbound_key()?, SingleNonce { nonce: Some(nonce) });
        let mut in_out = blob[NONCE_LENGTH..].to_vec();
        let plaintext = match opening_key.open_in_place(Aad::empty(), &mut in_out) {
            Ok(p) => p.to_vec(),
            Err(_) => {
                return Err(CryptoError::Decryption("invalid key or corrupted data".to_string()));
            }
        };
        in_out.zeroize();

        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            CryptoError::Decryption("sealed value is not UTF-8".to_string())
        })
    }
}
