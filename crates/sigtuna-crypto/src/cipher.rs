#![forbid(unsafe_code)]

//! Block cipher algorithm implementations (AES-CBC, AES-GCM).
//!
//! Wire format per XML-Enc: the IV (16 bytes for CBC, 12 for GCM) is
//! prepended to the ciphertext; GCM appends the authentication tag.

use sigtuna_core::{algorithm, Error};

/// Trait for cipher algorithms.
pub trait CipherAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn key_size(&self) -> usize;
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error>;
    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Create a cipher algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn CipherAlgorithm>, Error> {
    match uri {
        algorithm::AES128_CBC => Ok(Box::new(AesCbc { key_size: 16, uri: algorithm::AES128_CBC })),
        algorithm::AES192_CBC => Ok(Box::new(AesCbc { key_size: 24, uri: algorithm::AES192_CBC })),
        algorithm::AES256_CBC => Ok(Box::new(AesCbc { key_size: 32, uri: algorithm::AES256_CBC })),
        algorithm::AES128_GCM => Ok(Box::new(AesGcm { key_size: 16, uri: algorithm::AES128_GCM })),
        algorithm::AES256_GCM => Ok(Box::new(AesGcm { key_size: 32, uri: algorithm::AES256_GCM })),
        _ => Err(Error::UnsupportedAlgorithm(format!("cipher: {uri}"))),
    }
}

/// The session key size in bytes required by a cipher URI.
pub fn key_size_for_uri(uri: &str) -> Result<usize, Error> {
    Ok(from_uri(uri)?.key_size())
}

// ── AES-CBC with XML-Enc padding ─────────────────────────────────────

struct AesCbc {
    key_size: usize,
    uri: &'static str,
}

impl CipherAlgorithm for AesCbc {
    fn uri(&self) -> &'static str {
        self.uri
    }
    fn key_size(&self) -> usize {
        self.key_size
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        use cbc::cipher::{BlockEncryptMut, KeyIvInit};
        use rand::RngCore;

        if key.len() != self.key_size {
            return Err(Error::Crypto(format!(
                "expected {} byte key, got {}",
                self.key_size,
                key.len()
            )));
        }

        let mut iv = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut iv);

        // Pad up front, then run the cipher with NoPadding.
        let mut buf = pkcs7_pad(plaintext, 16);
        let buf_len = buf.len();

        macro_rules! do_encrypt {
            ($aes:ty) => {{
                let enc = cbc::Encryptor::<$aes>::new_from_slices(key, &iv)
                    .map_err(|e| Error::Crypto(format!("AES-CBC init: {e}")))?;
                enc.encrypt_padded_mut::<cbc::cipher::block_padding::NoPadding>(&mut buf, buf_len)
                    .map_err(|e| Error::Crypto(format!("AES-CBC encrypt: {e}")))?;
            }};
        }

        match self.key_size {
            16 => do_encrypt!(aes::Aes128),
            24 => do_encrypt!(aes::Aes192),
            32 => do_encrypt!(aes::Aes256),
            _ => return Err(Error::Crypto("unsupported AES key size".into())),
        }

        let mut result = Vec::with_capacity(16 + buf.len());
        result.extend_from_slice(&iv);
        result.extend_from_slice(&buf);
        Ok(result)
    }

    fn decrypt(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
        use cbc::cipher::{BlockDecryptMut, KeyIvInit};

        if key.len() != self.key_size {
            return Err(Error::Crypto(format!(
                "expected {} byte key, got {}",
                self.key_size,
                key.len()
            )));
        }
        if data.len() < 32 || data.len() % 16 != 0 {
            return Err(Error::Crypto("AES-CBC data invalid length".into()));
        }

        let iv = &data[..16];
        let ciphertext = &data[16..];
        let mut buf = ciphertext.to_vec();

        macro_rules! do_decrypt {
            ($aes:ty) => {{
                let dec = cbc::Decryptor::<$aes>::new_from_slices(key, iv)
                    .map_err(|e| Error::Crypto(format!("AES-CBC init: {e}")))?;
                dec.decrypt_padded_mut::<cbc::cipher::block_padding::NoPadding>(&mut buf)
                    .map_err(|e| Error::Crypto(format!("AES-CBC decrypt: {e}")))?;
            }};
        }

        match self.key_size {
            16 => do_decrypt!(aes::Aes128),
            24 => do_decrypt!(aes::Aes192),
            32 => do_decrypt!(aes::Aes256),
            _ => return Err(Error::Crypto("unsupported AES key size".into())),
        }

        xmlenc_unpad(&buf, 16)
    }
}

// ── AES-GCM ──────────────────────────────────────────────────────────

struct AesGcm {
    key_size: usize,
    uri: &'static str,
}

impl CipherAlgorithm for AesGcm {
    fn uri(&self) -> &'static str {
        self.uri
    }
    fn key_size(&self) -> usize {
        self.key_size
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        use aes_gcm::aead::Aead;
        use aes_gcm::KeyInit;
        use rand::RngCore;

        let mut nonce = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = match self.key_size {
            16 => {
                let cipher = aes_gcm::Aes128Gcm::new_from_slice(key)
                    .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?;
                cipher
                    .encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext)
                    .map_err(|e| Error::Crypto(format!("AES-GCM encrypt: {e}")))?
            }
            32 => {
                let cipher = aes_gcm::Aes256Gcm::new_from_slice(key)
                    .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?;
                cipher
                    .encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext)
                    .map_err(|e| Error::Crypto(format!("AES-GCM encrypt: {e}")))?
            }
            _ => return Err(Error::Crypto("unsupported AES-GCM key size".into())),
        };

        let mut result = Vec::with_capacity(12 + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn decrypt(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
        use aes_gcm::aead::Aead;
        use aes_gcm::KeyInit;

        if data.len() < 12 + 16 {
            return Err(Error::Crypto("AES-GCM data too short".into()));
        }
        let nonce = &data[..12];
        let ciphertext = &data[12..];

        match self.key_size {
            16 => {
                let cipher = aes_gcm::Aes128Gcm::new_from_slice(key)
                    .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?;
                cipher
                    .decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext)
                    .map_err(|_| Error::Crypto("AES-GCM authentication failed".into()))
            }
            32 => {
                let cipher = aes_gcm::Aes256Gcm::new_from_slice(key)
                    .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?;
                cipher
                    .decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext)
                    .map_err(|_| Error::Crypto("AES-GCM authentication failed".into()))
            }
            _ => Err(Error::Crypto("unsupported AES-GCM key size".into())),
        }
    }
}

// ── Padding helpers ──────────────────────────────────────────────────

fn pkcs7_pad(data: &[u8], block: usize) -> Vec<u8> {
    let pad = block - (data.len() % block);
    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);
    out.extend(std::iter::repeat(pad as u8).take(pad));
    out
}

/// Strip XML-Enc block padding: the last byte is the padding length, the
/// padding bytes themselves are arbitrary.
fn xmlenc_unpad(data: &[u8], block: usize) -> Result<Vec<u8>, Error> {
    let pad = *data
        .last()
        .ok_or_else(|| Error::Crypto("empty decryption output".into()))? as usize;
    if pad == 0 || pad > block || pad > data.len() {
        return Err(Error::Crypto("invalid cipher padding".into()));
    }
    Ok(data[..data.len() - pad].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_cbc_roundtrip() {
        for (uri, size) in [
            (algorithm::AES128_CBC, 16),
            (algorithm::AES256_CBC, 32),
        ] {
            let cipher = from_uri(uri).unwrap();
            let key = vec![7u8; size];
            let ct = cipher.encrypt(&key, b"attribute plaintext").unwrap();
            assert_ne!(&ct[16..], b"attribute plaintext");
            let pt = cipher.decrypt(&key, &ct).unwrap();
            assert_eq!(pt, b"attribute plaintext");
        }
    }

    #[test]
    fn aes_cbc_block_aligned_input() {
        let cipher = from_uri(algorithm::AES256_CBC).unwrap();
        let key = vec![1u8; 32];
        let plaintext = vec![b'x'; 32];
        let ct = cipher.encrypt(&key, &plaintext).unwrap();
        assert_eq!(cipher.decrypt(&key, &ct).unwrap(), plaintext);
    }

    #[test]
    fn aes_gcm_roundtrip_and_tamper() {
        let cipher = from_uri(algorithm::AES256_GCM).unwrap();
        let key = vec![9u8; 32];
        let mut ct = cipher.encrypt(&key, b"secret").unwrap();
        assert_eq!(cipher.decrypt(&key, &ct).unwrap(), b"secret");
        let last = ct.len() - 1;
        ct[last] ^= 0xff;
        assert!(cipher.decrypt(&key, &ct).is_err());
    }

    #[test]
    fn wrong_key_size_rejected() {
        let cipher = from_uri(algorithm::AES256_CBC).unwrap();
        assert!(cipher.encrypt(&[0u8; 16], b"x").is_err());
    }

    #[test]
    fn padding_roundtrip() {
        let padded = pkcs7_pad(b"abc", 16);
        assert_eq!(padded.len(), 16);
        assert_eq!(xmlenc_unpad(&padded, 16).unwrap(), b"abc");
    }
}
