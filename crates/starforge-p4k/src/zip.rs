//! ZIP64 on-disk records.
//!
//! Everything here is little-endian. The fixed-layout records carry their
//! signatures as binrw magics; variable-length trailers (file name, extra
//! field, comment) are read by the caller, which knows the lengths.

use binrw::BinRead;

/// Local file header signature
pub const LOCAL_HEADER_SIG: u32 = 0x0403_4B50;
/// Central directory file header signature
pub const CENTRAL_HEADER_SIG: u32 = 0x0201_4B50;
/// End-of-central-directory signature
pub const EOCD_SIG: u32 = 0x0605_4B50;
/// ZIP64 end-of-central-directory locator signature
pub const ZIP64_LOCATOR_SIG: u32 = 0x0706_4B50;
/// ZIP64 end-of-central-directory signature
pub const ZIP64_EOCD_SIG: u32 = 0x0606_4B50;

/// ZIP64 extended-information extra field header id
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Zstandard frame magic, read little-endian from the first 4 payload bytes
pub const ZSTD_MAGIC: u32 = 0xFD2F_B528;

/// Offset of the encryption sentinel byte within the extra field
pub const ENCRYPTION_FLAG_OFFSET: usize = 168;

/// Maximum EOCD distance from the end of file: 22-byte record + 65,535-byte
/// comment + the 1-byte worst-case scan overlap.
pub const EOCD_SEARCH_SPAN: usize = 65_558;

/// End-of-central-directory record (fields after the signature).
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = 0x0605_4B50u32)]
pub struct EocdRecord {
    /// Number of this disk
    pub disk_number: u16,
    /// Disk where the central directory starts
    pub directory_start_disk: u16,
    /// Directory entries on this disk
    pub entries_on_disk: u16,
    /// Total directory entries
    pub entries_total: u16,
    /// Central directory size in bytes
    pub directory_size: u32,
    /// Central directory offset from the start of the archive
    pub directory_offset: u32,
    /// Archive comment length
    pub comment_length: u16,
}

impl EocdRecord {
    /// Whether any 16/32-bit field is saturated and the ZIP64 record must be
    /// consulted instead.
    pub fn needs_zip64(&self) -> bool {
        self.entries_total == u16::MAX
            || self.entries_on_disk == u16::MAX
            || self.directory_offset == u32::MAX
    }
}

/// ZIP64 end-of-central-directory locator.
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = 0x0706_4B50u32)]
pub struct Zip64Locator {
    /// Disk holding the ZIP64 EOCD record
    pub eocd_disk: u32,
    /// Absolute offset of the ZIP64 EOCD record
    pub eocd_offset: u64,
    /// Total number of disks
    pub disk_count: u32,
}

/// ZIP64 end-of-central-directory record.
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = 0x0606_4B50u32)]
pub struct Zip64EocdRecord {
    /// Size of the remainder of this record
    pub record_size: u64,
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// Number of this disk
    pub disk_number: u32,
    /// Disk where the central directory starts
    pub directory_start_disk: u32,
    /// Directory entries on this disk
    pub entries_on_disk: u64,
    /// Total directory entries
    pub entries_total: u64,
    /// Central directory size in bytes
    pub directory_size: u64,
    /// Central directory offset from the start of the archive
    pub directory_offset: u64,
}

/// Central directory file header (fields after the signature).
///
/// Followed on disk by file name, extra field and comment, in that order.
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = 0x0201_4B50u32)]
pub struct CentralHeader {
    /// Version made by
    pub version_made_by: u16,
    /// Version needed to extract
    pub version_needed: u16,
    /// General-purpose bit flags
    pub flags: u16,
    /// Compression method id
    pub method: u16,
    /// DOS modification time
    pub mod_time: u16,
    /// DOS modification date
    pub mod_date: u16,
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    /// Compressed size, or 0xFFFFFFFF when carried in the ZIP64 extra field
    pub compressed_size: u32,
    /// Uncompressed size, or 0xFFFFFFFF when carried in the ZIP64 extra field
    pub uncompressed_size: u32,
    /// File name length
    pub name_length: u16,
    /// Extra field length
    pub extra_length: u16,
    /// Comment length
    pub comment_length: u16,
    /// Disk on which the entry starts
    pub disk_start: u16,
    /// Internal attributes
    pub internal_attributes: u16,
    /// External attributes
    pub external_attributes: u32,
    /// Local header offset, or 0xFFFFFFFF when carried in the ZIP64 extra field
    pub local_header_offset: u32,
}

impl CentralHeader {
    /// Total on-disk record length including signature and trailers.
    pub fn record_len(&self) -> usize {
        46 + self.name_length as usize + self.extra_length as usize + self.comment_length as usize
    }
}

/// Local file header (fields after the signature).
#[derive(Debug, Clone, BinRead)]
#[br(little, magic = 0x0403_4B50u32)]
pub struct LocalHeader {
    /// Version needed to extract
    pub version_needed: u16,
    /// General-purpose bit flags
    pub flags: u16,
    /// Compression method id
    pub method: u16,
    /// DOS modification time
    pub mod_time: u16,
    /// DOS modification date
    pub mod_date: u16,
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    /// Compressed size
    pub compressed_size: u32,
    /// Uncompressed size
    pub uncompressed_size: u32,
    /// File name length
    pub name_length: u16,
    /// Extra field length
    pub extra_length: u16,
}

/// Size of the local header on disk, including the signature.
pub const LOCAL_HEADER_LEN: u64 = 30;

/// Values recovered from a ZIP64 extended-information extra field.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zip64Extra {
    /// 64-bit uncompressed size, present when the 32-bit slot was saturated
    pub uncompressed_size: Option<u64>,
    /// 64-bit compressed size, present when the 32-bit slot was saturated
    pub compressed_size: Option<u64>,
    /// 64-bit local header offset, present when the 32-bit slot was saturated
    pub local_header_offset: Option<u64>,
}

/// Walk the extra-field blob and decode the ZIP64 field, if present.
///
/// The ZIP64 sub-fields appear in a fixed order but only for the slots that
/// read saturated in the fixed header, so the header is needed to know which
/// 64-bit values to expect.
pub fn parse_zip64_extra(extra: &[u8], header: &CentralHeader) -> Zip64Extra {
    let mut out = Zip64Extra::default();
    let mut pos = 0usize;

    while pos + 4 <= extra.len() {
        let id = u16::from_le_bytes([extra[pos], extra[pos + 1]]);
        let size = u16::from_le_bytes([extra[pos + 2], extra[pos + 3]]) as usize;
        let body_start = pos + 4;
        let body_end = body_start.saturating_add(size).min(extra.len());
        let body = &extra[body_start..body_end];

        if id == ZIP64_EXTRA_ID {
            let mut cursor = 0usize;
            let mut next_u64 = |expected: bool| -> Option<u64> {
                if !expected || cursor + 8 > body.len() {
                    return None;
                }
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&body[cursor..cursor + 8]);
                cursor += 8;
                Some(u64::from_le_bytes(raw))
            };

            out.uncompressed_size = next_u64(header.uncompressed_size == u32::MAX);
            out.compressed_size = next_u64(header.compressed_size == u32::MAX);
            out.local_header_offset = next_u64(header.local_header_offset == u32::MAX);
            break;
        }

        pos = body_start + size;
    }

    out
}

/// Whether the extra field carries the vendor encryption sentinel.
///
/// The sentinel lives at byte offset 168 and is only meaningful when the
/// extra field is at least 169 bytes long.
pub fn extra_field_encrypted(extra: &[u8]) -> bool {
    extra.len() > ENCRYPTION_FLAG_OFFSET && extra[ENCRYPTION_FLAG_OFFSET] != 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    fn central_header_with(
        compressed: u32,
        uncompressed: u32,
        offset: u32,
    ) -> CentralHeader {
        let mut raw = Vec::new();
        raw.extend_from_slice(&CENTRAL_HEADER_SIG.to_le_bytes());
        raw.extend_from_slice(&[0u8; 12]); // versions, flags, method, times
        raw.extend_from_slice(&0u32.to_le_bytes()); // crc
        raw.extend_from_slice(&compressed.to_le_bytes());
        raw.extend_from_slice(&uncompressed.to_le_bytes());
        raw.extend_from_slice(&[0u8; 10]); // lengths, disk start, internal attrs
        raw.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        raw.extend_from_slice(&offset.to_le_bytes());
        CentralHeader::read(&mut Cursor::new(raw)).unwrap()
    }

    #[test]
    fn zip64_extra_reads_only_saturated_slots() {
        let header = central_header_with(u32::MAX, 100, u32::MAX);

        let mut extra = Vec::new();
        extra.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
        extra.extend_from_slice(&16u16.to_le_bytes());
        // Order is uncompressed, compressed, offset; uncompressed is not
        // saturated here so only the latter two are present.
        extra.extend_from_slice(&0x1_0000_0001u64.to_le_bytes());
        extra.extend_from_slice(&0x2_0000_0002u64.to_le_bytes());

        let parsed = parse_zip64_extra(&extra, &header);
        assert_eq!(parsed.uncompressed_size, None);
        assert_eq!(parsed.compressed_size, Some(0x1_0000_0001));
        assert_eq!(parsed.local_header_offset, Some(0x2_0000_0002));
    }

    #[test]
    fn zip64_extra_skips_foreign_fields() {
        let header = central_header_with(u32::MAX, u32::MAX, 10);

        let mut extra = Vec::new();
        // A vendor field first
        extra.extend_from_slice(&0x5000u16.to_le_bytes());
        extra.extend_from_slice(&4u16.to_le_bytes());
        extra.extend_from_slice(&[0xAA; 4]);
        // Then the ZIP64 field
        extra.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
        extra.extend_from_slice(&16u16.to_le_bytes());
        extra.extend_from_slice(&7u64.to_le_bytes());
        extra.extend_from_slice(&9u64.to_le_bytes());

        let parsed = parse_zip64_extra(&extra, &header);
        assert_eq!(parsed.uncompressed_size, Some(7));
        assert_eq!(parsed.compressed_size, Some(9));
        assert_eq!(parsed.local_header_offset, None);
    }

    #[test]
    fn encryption_sentinel_requires_long_extra() {
        let mut extra = vec![0u8; 169];
        assert!(!extra_field_encrypted(&extra));
        extra[ENCRYPTION_FLAG_OFFSET] = 1;
        assert!(extra_field_encrypted(&extra));
        assert!(!extra_field_encrypted(&extra[..168]));
    }

    #[test]
    fn eocd_zip64_detection() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&EOCD_SIG.to_le_bytes());
        raw.extend_from_slice(&[0u8; 4]);
        raw.extend_from_slice(&u16::MAX.to_le_bytes());
        raw.extend_from_slice(&u16::MAX.to_le_bytes());
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.extend_from_slice(&u32::MAX.to_le_bytes());
        raw.extend_from_slice(&0u16.to_le_bytes());

        let eocd = EocdRecord::read(&mut Cursor::new(raw)).unwrap();
        assert!(eocd.needs_zip64());
    }
}
