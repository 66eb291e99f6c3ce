//! AES-256-GCM sealing for stored tokens.
//!
//! A sealed value is `base64(nonce || ciphertext)`, so each token occupies a
//! single column. Every seal draws a fresh random nonce.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;

/// Decodes a base64 master key and checks it is 256 bits.
pub fn decode_key(key_base64: &str) -> Result<Vec<u8>> {
    let key = BASE64
        .decode(key_base64.trim())
        .context("Encryption key is not valid base64")?;
    if key.len() != KEY_SIZE {
        return Err(anyhow!(
            "Encryption key must be {} bytes, got {}",
            KEY_SIZE,
            key.len()
        ));
    }
    Ok(key)
}

pub fn seal(plaintext: &str, key: &[u8]) -> Result<String> {
    let cipher = cipher(key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(sealed))
}

pub fn open(sealed: &str, key: &[u8]) -> Result<String> {
    let cipher = cipher(key)?;
    let bytes = BASE64.decode(sealed).context("Sealed value is not valid base64")?;
    if bytes.len() <= NONCE_SIZE {
        return Err(anyhow!("Sealed value too short"));
    }
    let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow!("Decryption failed (wrong key or corrupted data): {}", e))?;
    String::from_utf8(plaintext).context("Decrypted token is not valid UTF-8")
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Invalid encryption key: {}", e))
}
