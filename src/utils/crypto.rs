//! # Cipher Engine
//!
//! AES-128-CBC with key material derived from the device token.
//!
//! ```text
//! key = MD5(token)
//! iv  = MD5(key || token)
//! ```
//!
//! Padding is PKCS#7 over 16-byte blocks and is applied by [`pad`] and checked
//! by [`unpad`] rather than by the block mode, so that every malformed tail
//! surfaces the same [`ProtocolError::InvalidPadding`].

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::token::Token;
use crate::error::{ProtocolError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// MD5 of a byte slice
pub fn md5(data: &[u8]) -> [u8; 16] {
    Md5::digest(data).into()
}

/// Derive the `(key, iv)` pair for a token
pub fn derive_key_material(token: &Token) -> ([u8; 16], [u8; 16]) {
    let key: [u8; 16] = md5(token.as_bytes());
    let iv: [u8; 16] = Md5::new()
        .chain_update(key)
        .chain_update(token.as_bytes())
        .finalize()
        .into();
    (key, iv)
}

/// PKCS#7 pad to a multiple of [`BLOCK_SIZE`].
///
/// Block-aligned input gains a full block of `0x10`.
pub fn pad(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyPayload);
    }

    let n = BLOCK_SIZE - (data.len() % BLOCK_SIZE);
    let mut padded = Vec::with_capacity(data.len() + n);
    padded.extend_from_slice(data);
    padded.resize(data.len() + n, n as u8);
    Ok(padded)
}

/// Strip PKCS#7 padding
pub fn unpad(data: &[u8]) -> Result<&[u8]> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(ProtocolError::InvalidPadding);
    }

    let pad_byte = data[data.len() - 1];
    let n = pad_byte as usize;
    if n == 0 || n > data.len() {
        return Err(ProtocolError::InvalidPadding);
    }

    let (body, tail) = data.split_at(data.len() - n);
    if tail.iter().any(|&b| b != pad_byte) {
        return Err(ProtocolError::InvalidPadding);
    }

    Ok(body)
}

/// Per-client cipher state. Key and IV never change after construction.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Cipher {
    key: [u8; 16],
    iv: [u8; 16],
}

impl Cipher {
    pub fn new(token: &Token) -> Self {
        let (key, iv) = derive_key_material(token);
        Self { key, iv }
    }

    /// Encrypt a block-aligned buffer in place
    pub fn encrypt(&self, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        if len == 0 || len % BLOCK_SIZE != 0 {
            return Err(ProtocolError::InvalidPadding);
        }

        Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_mut::<NoPadding>(buf, len)
            .map_err(|_| ProtocolError::InvalidPadding)?;
        Ok(())
    }

    /// Decrypt a block-aligned buffer in place
    pub fn decrypt(&self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() || buf.len() % BLOCK_SIZE != 0 {
            return Err(ProtocolError::InvalidPadding);
        }

        Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_mut::<NoPadding>(buf)
            .map_err(|_| ProtocolError::InvalidPadding)?;
        Ok(())
    }

    /// Pad then encrypt
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut buf = pad(plaintext)?;
        self.encrypt(&mut buf)?;
        Ok(buf)
    }

    /// Decrypt then unpad
    pub fn open(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut buf = ciphertext.to_vec();
        self.decrypt(&mut buf)?;
        let len = unpad(&buf)?.len();
        buf.truncate(len);
        Ok(buf)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cipher(aes-128-cbc)")
    }
}
