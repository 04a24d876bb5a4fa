// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential encryption at rest.
//!
//! Secrets are sealed with AES-256-GCM under a single process-wide key. Each
//! call draws a fresh 96-bit nonce from the OS CSPRNG and the stored form is
//! standard padded Base64 of:
//!
//! ```text
//! nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! No associated data is bound. Decryption never yields partial plaintext:
//! either the tag verifies and the whole secret comes back, or the call fails
//! with [`AuthError::InvalidCiphertext`].

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

use crate::auth::AuthError;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Plaintext length of the decoy credential.
const DECOY_LEN: usize = 32;

/// Errors building the cipher or sealing a secret.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("credential key must be {len} bytes, got {0}", len = KEY_LEN)]
    KeyLength(usize),
    #[error("credential key is not valid Base64")]
    KeyEncoding,
    #[error("system random number generator unavailable")]
    Random,
    #[error("failed to seal credential")]
    Seal,
}

/// Symmetric AEAD over stored credentials.
pub struct CredentialCipher {
    key: LessSafeKey,
    rng: SystemRandom,
    decoy: String,
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}

impl CredentialCipher {
    /// Build a cipher from raw key bytes. The key must be exactly 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::KeyLength(key.len()));
        }
        let unbound =
            UnboundKey::new(&AES_256_GCM, key).map_err(|_| CipherError::KeyLength(key.len()))?;
        let mut cipher = Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
            decoy: String::new(),
        };
        cipher.decoy = cipher.encrypt(&[0u8; DECOY_LEN])?;
        Ok(cipher)
    }

    /// Build a cipher from a Base64-encoded key, as found in configuration.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let key = Base64::decode_vec(encoded.trim()).map_err(|_| CipherError::KeyEncoding)?;
        Self::new(&key)
    }

    /// Seal `plaintext` and return its encoded form.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CipherError::Random)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.to_vec();
        let tag = self
            .key
            .seal_in_place_separate_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CipherError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len() + TAG_LEN);
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        sealed.extend_from_slice(tag.as_ref());
        Ok(Base64::encode_string(&sealed))
    }

    /// Open an encoded credential.
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, AuthError> {
        let sealed = Base64::decode_vec(encoded).map_err(|_| AuthError::InvalidCiphertext)?;
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(AuthError::InvalidCiphertext);
        }

        let (nonce_bytes, body) = sealed.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| AuthError::InvalidCiphertext)?;

        let mut in_out = body.to_vec();
        let plaintext_len = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| AuthError::InvalidCiphertext)?
            .len();
        in_out.truncate(plaintext_len);
        Ok(in_out)
    }

    /// Open an encoded credential holding UTF-8 text.
    pub fn decrypt_to_string(&self, encoded: &str) -> Result<String, AuthError> {
        String::from_utf8(self.decrypt(encoded)?).map_err(|_| AuthError::InvalidCiphertext)
    }

    /// Check a presented secret against a stored one.
    ///
    /// A stored value that fails to open is an error, not a mismatch.
    pub fn compare(&self, candidate: &[u8], encoded: &str) -> Result<bool, AuthError> {
        let stored = self.decrypt(encoded)?;
        Ok(constant_time_eq::constant_time_eq(candidate, &stored))
    }

    /// Do the work of [`compare`](Self::compare) against a throwaway
    /// credential, for callers that have no stored secret to check.
    pub fn compare_decoy(&self, candidate: &[u8]) {
        let _ = self.compare(candidate, &self.decoy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> CredentialCipher {
        CredentialCipher::new(&[7u8; KEY_LEN]).unwrap()
    }

    #[test]
    fn rejects_wrong_key_length() {
        assert!(matches!(
            CredentialCipher::new(&[0u8; 16]),
            Err(CipherError::KeyLength(16))
        ));
        assert!(matches!(
            CredentialCipher::new(&[]),
            Err(CipherError::KeyLength(0))
        ));
    }

    #[test]
    fn from_base64_decodes_key() {
        let encoded = Base64::encode_string(&[1u8; KEY_LEN]);
        assert!(CredentialCipher::from_base64(&encoded).is_ok());
        assert!(matches!(
            CredentialCipher::from_base64("not base64!"),
            Err(CipherError::KeyEncoding)
        ));
        let short = Base64::encode_string(&[1u8; 31]);
        assert!(matches!(
            CredentialCipher::from_base64(&short),
            Err(CipherError::KeyLength(31))
        ));
    }

    #[test]
    fn round_trips_across_lengths() {
        let cipher = cipher();
        for len in [0usize, 1, 15, 16, 17, 255, 4096, 10_000] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let encoded = cipher.encrypt(&plaintext).unwrap();
            assert_eq!(cipher.decrypt(&encoded).unwrap(), plaintext, "len {len}");
        }
    }

    #[test]
    fn encoded_layout_is_nonce_ciphertext_tag() {
        let encoded = cipher().encrypt(b"hunter2").unwrap();
        let raw = Base64::decode_vec(&encoded).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + 7 + TAG_LEN);
    }

    #[test]
    fn nonces_are_fresh() {
        let cipher = cipher();
        let first = cipher.encrypt(b"same secret").unwrap();
        let second = cipher.encrypt(b"same secret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_non_base64() {
        assert_eq!(cipher().decrypt("%%%"), Err(AuthError::InvalidCiphertext));
    }

    #[test]
    fn rejects_truncated_input() {
        let cipher = cipher();
        let short = Base64::encode_string(&[0u8; NONCE_LEN + TAG_LEN - 1]);
        assert_eq!(cipher.decrypt(&short), Err(AuthError::InvalidCiphertext));

        let encoded = cipher.encrypt(b"secret").unwrap();
        let mut raw = Base64::decode_vec(&encoded).unwrap();
        raw.pop();
        assert_eq!(
            cipher.decrypt(&Base64::encode_string(&raw)),
            Err(AuthError::InvalidCiphertext)
        );
    }

    #[test]
    fn rejects_tampered_tag() {
        let cipher = cipher();
        let encoded = cipher.encrypt(b"secret").unwrap();
        let mut raw = Base64::decode_vec(&encoded).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        assert_eq!(
            cipher.decrypt(&Base64::encode_string(&raw)),
            Err(AuthError::InvalidCiphertext)
        );
    }

    #[test]
    fn rejects_other_key() {
        let encoded = cipher().encrypt(b"secret").unwrap();
        let other = CredentialCipher::new(&[8u8; KEY_LEN]).unwrap();
        assert_eq!(other.decrypt(&encoded), Err(AuthError::InvalidCiphertext));
    }

    #[test]
    fn decrypt_to_string_requires_utf8() {
        let cipher = cipher();
        let encoded = cipher.encrypt(&[0xff, 0xfe]).unwrap();
        assert_eq!(
            cipher.decrypt_to_string(&encoded),
            Err(AuthError::InvalidCiphertext)
        );
        let encoded = cipher.encrypt("pässword".as_bytes()).unwrap();
        assert_eq!(cipher.decrypt_to_string(&encoded).unwrap(), "pässword");
    }

    #[test]
    fn compare_matches_and_mismatches() {
        let cipher = cipher();
        let encoded = cipher.encrypt(b"correct horse").unwrap();
        assert_eq!(cipher.compare(b"correct horse", &encoded), Ok(true));
        assert_eq!(cipher.compare(b"correct hors", &encoded), Ok(false));
        assert_eq!(cipher.compare(b"", &encoded), Ok(false));
    }

    #[test]
    fn decoy_is_a_sealed_credential() {
        let c = cipher();
        assert_eq!(c.decrypt(&c.decoy), Ok(vec![0u8; DECOY_LEN]));
        assert_ne!(c.decoy, cipher().decoy);
        c.compare_decoy(b"whatever");
    }

    #[test]
    fn compare_propagates_corruption() {
        assert_eq!(
            cipher().compare(b"anything", "Zm9v"),
            Err(AuthError::InvalidCiphertext)
        );
    }
}
