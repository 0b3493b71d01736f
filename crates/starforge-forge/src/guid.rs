//! Record GUIDs.
//!
//! Stored as a little-endian composite: u32, u16, u16, then 8 raw bytes.
//! Rendered in the canonical hyphenated lowercase form.

use std::fmt;

use serde::{Serialize, Serializer};

/// A 16-byte record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    /// Decode from 16 on-disk bytes.
    pub fn from_bytes(raw: &[u8; 16]) -> Self {
        Self {
            data1: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            data2: u16::from_le_bytes([raw[4], raw[5]]),
            data3: u16::from_le_bytes([raw[6], raw[7]]),
            data4: [
                raw[8], raw[9], raw[10], raw[11], raw[12], raw[13], raw[14], raw[15],
            ],
        }
    }

    /// The all-zero GUID used as an absent marker.
    pub fn nil() -> Self {
        Self::default()
    }

    /// Whether this is the all-zero GUID.
    pub fn is_nil(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{}-{}",
            self.data1,
            self.data2,
            self.data3,
            hex::encode(&self.data4[..2]),
            hex::encode(&self.data4[2..]),
        )
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_rendering() {
        let raw: [u8; 16] = [
            0x78, 0x56, 0x34, 0x12, // data1, little-endian
            0xCD, 0xAB, // data2
            0x01, 0xEF, // data3
            0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88,
        ];
        let guid = Guid::from_bytes(&raw);
        assert_eq!(guid.to_string(), "12345678-abcd-ef01-1122-334455667788");
    }

    #[test]
    fn nil_detection() {
        assert!(Guid::from_bytes(&[0u8; 16]).is_nil());
        assert!(!Guid::from_bytes(&[1u8; 16]).is_nil());
        assert_eq!(Guid::nil().to_string(), "00000000-0000-0000-0000-000000000000");
    }
}
