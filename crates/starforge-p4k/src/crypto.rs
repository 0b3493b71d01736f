//! AES unwrap for encrypted archive entries.
//!
//! Encrypted entries are AES-128-CBC with a zero IV and no padding scheme;
//! the producer pads the final block with zero bytes, so those are trimmed
//! after decryption. The key is a fixed constant distributed with the
//! archive format.

use aes::Aes128;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};

use crate::error::{P4kError, P4kResult};

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// AES block size in bytes.
const BLOCK: usize = 16;

/// Fixed entry key distributed with the archive format.
pub const ARCHIVE_KEY: [u8; 16] = [
    0x5E, 0x7A, 0x20, 0x02, 0x30, 0x2E, 0xEB, 0x1A, 0x3B, 0xB6, 0x17, 0xC3, 0x0F, 0xDE, 0x1E,
    0x47,
];

/// Decrypt an AES-wrapped entry payload and trim the zero-padded tail.
pub fn decrypt_entry(data: &[u8]) -> P4kResult<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() % BLOCK != 0 {
        return Err(P4kError::Decryption(format!(
            "ciphertext length {} is not a multiple of the AES block size",
            data.len()
        )));
    }

    let mut buf = data.to_vec();
    let cipher = Aes128CbcDec::new_from_slices(&ARCHIVE_KEY, &[0u8; BLOCK])
        .map_err(|e| P4kError::Decryption(e.to_string()))?;
    let len = cipher
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|e| P4kError::Decryption(e.to_string()))?
        .len();
    buf.truncate(len);

    while buf.last() == Some(&0) {
        buf.pop();
    }
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cbc::cipher::{BlockEncryptMut, block_padding::NoPadding as EncNoPadding};

    type Aes128CbcEnc = cbc::Encryptor<Aes128>;

    fn encrypt_fixture(plain: &[u8]) -> Vec<u8> {
        let mut padded = plain.to_vec();
        while padded.len() % BLOCK != 0 {
            padded.push(0);
        }
        let len = padded.len();
        let cipher = Aes128CbcEnc::new_from_slices(&ARCHIVE_KEY, &[0u8; BLOCK]).unwrap();
        cipher
            .encrypt_padded_mut::<EncNoPadding>(&mut padded, len)
            .expect("fixture encryption")
            .to_vec()
    }

    #[test]
    fn round_trip_trims_zero_padding() {
        let plain = b"seventeen bytes!!"; // forces 15 bytes of zero padding
        let wrapped = encrypt_fixture(plain);
        assert_eq!(wrapped.len(), 32);
        assert_eq!(decrypt_entry(&wrapped).unwrap(), plain);
    }

    #[test]
    fn round_trip_exact_block() {
        let plain = b"exactly 16 b.. Z"; // ends nonzero, nothing trimmed
        let wrapped = encrypt_fixture(plain);
        assert_eq!(decrypt_entry(&wrapped).unwrap(), plain);
    }

    #[test]
    fn rejects_ragged_ciphertext() {
        let result = decrypt_entry(&[0u8; 17]);
        assert!(matches!(result, Err(P4kError::Decryption(_))));
    }

    #[test]
    fn empty_payload_is_empty() {
        assert!(decrypt_entry(&[]).unwrap().is_empty());
    }
}
