//! Symmetric encryption of the pipeline environment.
//!
//! AES-256 in CFB mode keyed with the SHA-256 of the shared secret. The
//! output is standard base64 of `iv || ciphertext`.

use aes::Aes256;
use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use piper_core::{Error, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

const IV_LEN: usize = 16;

fn key_for(secret: &[u8]) -> [u8; 32] {
    Sha256::digest(secret).into()
}

/// Encrypt `plaintext` with `secret`.
///
/// # Errors
///
/// Returns [`Error::Encryption`] if the cipher cannot be initialized.
pub fn encrypt(secret: &[u8], plaintext: &[u8]) -> Result<String> {
    let key = key_for(secret);
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let cipher = Aes256CfbEnc::new_from_slices(&key, &iv)
        .map_err(|e| Error::encryption(format!("failed to create cipher: {e}")))?;
    let mut buf = Vec::with_capacity(IV_LEN + plaintext.len());
    buf.extend_from_slice(&iv);
    buf.extend_from_slice(plaintext);
    cipher.encrypt(&mut buf[IV_LEN..]);

    Ok(STANDARD.encode(buf))
}

/// Decrypt the output of [`encrypt`].
///
/// # Errors
///
/// Returns [`Error::Encryption`] for invalid base64 or input shorter than
/// the IV.
pub fn decrypt(secret: &[u8], encoded: &str) -> Result<Vec<u8>> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::encryption(format!("invalid base64: {e}")))?;
    if raw.len() < IV_LEN {
        return Err(Error::encryption("ciphertext shorter than IV"));
    }
    let (iv, ciphertext) = raw.split_at(IV_LEN);

    let key = key_for(secret);
    let cipher = Aes256CfbDec::new_from_slices(&key, iv)
        .map_err(|e| Error::encryption(format!("failed to create cipher: {e}")))?;
    let mut plaintext = ciphertext.to_vec();
    cipher.decrypt(&mut plaintext);
    Ok(plaintext)
}
