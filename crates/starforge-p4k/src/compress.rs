//! Entry decompression.

use std::io::Read;

use crate::error::{P4kError, P4kResult};

/// Compression method of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Method 0: stored as-is
    Store,
    /// Method 8: raw Deflate stream
    Deflate,
    /// Methods 93 and 100: Zstandard frame
    Zstd,
}

impl CompressionMethod {
    /// Map a ZIP method id onto a supported method.
    pub fn from_id(id: u16) -> P4kResult<Self> {
        match id {
            0 => Ok(Self::Store),
            8 => Ok(Self::Deflate),
            93 | 100 => Ok(Self::Zstd),
            other => Err(P4kError::UnknownCompression(other)),
        }
    }
}

/// Decompress an entry payload to its declared uncompressed size.
pub fn decompress(
    method: CompressionMethod,
    data: &[u8],
    uncompressed_size: u64,
) -> P4kResult<Vec<u8>> {
    let expected = usize::try_from(uncompressed_size)
        .map_err(|_| P4kError::Decompression("uncompressed size exceeds usize".into()))?;

    match method {
        CompressionMethod::Store => {
            if data.len() != expected {
                return Err(P4kError::Decompression(format!(
                    "stored entry size mismatch: expected {expected}, got {}",
                    data.len()
                )));
            }
            Ok(data.to_vec())
        }
        CompressionMethod::Deflate => {
            let mut out = Vec::with_capacity(expected);
            flate2::read::DeflateDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| P4kError::Decompression(e.to_string()))?;
            Ok(out)
        }
        CompressionMethod::Zstd => {
            zstd::bulk::decompress(data, expected)
                .map_err(|e| P4kError::Decompression(e.to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn method_ids() {
        assert_eq!(CompressionMethod::from_id(0).unwrap(), CompressionMethod::Store);
        assert_eq!(CompressionMethod::from_id(8).unwrap(), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_id(93).unwrap(), CompressionMethod::Zstd);
        assert_eq!(CompressionMethod::from_id(100).unwrap(), CompressionMethod::Zstd);
        assert!(matches!(
            CompressionMethod::from_id(14),
            Err(P4kError::UnknownCompression(14))
        ));
    }

    #[test]
    fn store_checks_length() {
        let data = b"abcd";
        assert_eq!(
            decompress(CompressionMethod::Store, data, 4).unwrap(),
            data
        );
        assert!(decompress(CompressionMethod::Store, data, 5).is_err());
    }

    #[test]
    fn deflate_round_trip() {
        let plain = b"deflate me, deflate me, deflate me";
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(plain).unwrap();
        let packed = encoder.finish().unwrap();

        let out = decompress(CompressionMethod::Deflate, &packed, plain.len() as u64).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn zstd_round_trip() {
        let plain = vec![7u8; 4096];
        let packed = zstd::bulk::compress(&plain, 3).unwrap();
        let out = decompress(CompressionMethod::Zstd, &packed, plain.len() as u64).unwrap();
        assert_eq!(out, plain);
    }
}
