//! Archive open/index/read operations.
//!
//! One file handle is shared behind a mutex; every read seeks under the
//! lock and fills its own buffer, so independent entry reads may run from
//! multiple threads. The directory index is built once by [`P4kArchive::load_all`]
//! and is read-only afterwards.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use binrw::BinRead;
use binrw::io::Cursor;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::compress::{CompressionMethod, decompress};
use crate::crypto::decrypt_entry;
use crate::error::{P4kError, P4kResult};
use crate::zip::{
    CentralHeader, EOCD_SEARCH_SPAN, EocdRecord, LOCAL_HEADER_LEN, LOCAL_HEADER_SIG, LocalHeader,
    ZIP64_EOCD_SIG, ZIP64_LOCATOR_SIG, ZSTD_MAGIC, Zip64EocdRecord, Zip64Locator, EOCD_SIG,
    extra_field_encrypted, parse_zip64_extra,
};

/// Directory-scan progress callback: `(entries_done, entries_total)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Directory entries are reported every this many records.
const PROGRESS_INTERVAL: u64 = 50_000;

/// Central directory streaming chunk size.
const DIRECTORY_CHUNK: usize = 64 * 1024 * 1024;

/// One archive entry, immutable after the directory scan.
#[derive(Debug, Clone)]
pub struct P4kEntry {
    /// Entry path with `\` separators
    pub path: String,
    /// Uncompressed payload size
    pub uncompressed_size: u64,
    /// On-disk payload size
    pub compressed_size: u64,
    /// Raw ZIP method id; resolved when the entry is read
    pub method_id: u16,
    /// Whether the path names a directory
    pub is_directory: bool,
    /// Whether the extra field carried the encryption sentinel
    pub is_encrypted: bool,
    /// Absolute offset of the local header
    pub local_header_offset: u64,
}

impl P4kEntry {
    /// Resolve the method id against the supported set.
    pub fn method(&self) -> P4kResult<CompressionMethod> {
        CompressionMethod::from_id(self.method_id)
    }
}

#[derive(Debug, Clone, Copy)]
struct DirectoryLocation {
    entries_total: u64,
    offset: u64,
    size: u64,
}

/// Read-only archive handle with a lazily built directory index.
pub struct P4kArchive {
    file: Mutex<File>,
    file_len: u64,
    directory: DirectoryLocation,
    entries: Vec<P4kEntry>,
    by_path: HashMap<String, usize>,
    by_folded_path: HashMap<String, usize>,
    loaded: bool,
}

impl P4kArchive {
    /// Open an archive and locate its central directory.
    ///
    /// The directory itself is not scanned until [`Self::load_all`].
    pub fn open<P: AsRef<Path>>(path: P) -> P4kResult<Self> {
        let mut file = File::open(path)?;
        let file_len = file.seek(SeekFrom::End(0))?;
        let directory = Self::locate_directory(&mut file, file_len)?;

        debug!(
            entries = directory.entries_total,
            directory_offset = directory.offset,
            "archive opened"
        );

        Ok(Self {
            file: Mutex::new(file),
            file_len,
            directory,
            entries: Vec::new(),
            by_path: HashMap::new(),
            by_folded_path: HashMap::new(),
            loaded: false,
        })
    }

    /// Archive size in bytes.
    pub fn len(&self) -> u64 {
        self.file_len
    }

    /// Whether the archive holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.directory.entries_total == 0
    }

    /// Whether [`Self::load_all`] has run.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of entries declared by the end-of-central-directory record.
    pub fn entry_count(&self) -> u64 {
        self.directory.entries_total
    }

    /// Indexed entries; empty before [`Self::load_all`].
    pub fn entries(&self) -> &[P4kEntry] {
        &self.entries
    }

    /// Stream the central directory and build the path indexes.
    pub fn load_all(&mut self, progress: Option<ProgressFn<'_>>) -> P4kResult<()> {
        if self.loaded {
            return Ok(());
        }

        let total = self.directory.entries_total;
        let mut stream = DirectoryStream::new(&self.file, self.directory.offset, self.directory.size);

        self.entries.reserve(usize::try_from(total).unwrap_or(0));

        for done in 0..total {
            let entry = Self::read_directory_entry(&mut stream)?;
            let index = self.entries.len();
            self.by_folded_path
                .entry(entry.path.to_lowercase())
                .or_insert(index);
            self.by_path.entry(entry.path.clone()).or_insert(index);
            self.entries.push(entry);

            let done = done + 1;
            if done % PROGRESS_INTERVAL == 0 {
                if let Some(report) = progress {
                    report(done, total);
                }
            }
        }

        if let Some(report) = progress {
            report(total, total);
        }
        self.loaded = true;
        Ok(())
    }

    /// Look up an entry by path.
    ///
    /// Both separators are accepted; the exact-case index is probed first,
    /// the case-folded duplicate second.
    pub fn find(&self, path: &str) -> Option<&P4kEntry> {
        let probe = path.replace('/', "\\");
        self.by_path
            .get(&probe)
            .or_else(|| self.by_folded_path.get(&probe.to_lowercase()))
            .map(|&i| &self.entries[i])
    }

    /// Read, unwrap and decompress a single entry.
    ///
    /// A failure here is local to the entry; the handle and the index stay
    /// usable for further reads.
    pub fn read_entry(&self, entry: &P4kEntry) -> P4kResult<Vec<u8>> {
        if entry.is_directory || entry.uncompressed_size == 0 {
            return Ok(Vec::new());
        }

        let method = entry.method()?;

        let header_raw = self.read_at(entry.local_header_offset, LOCAL_HEADER_LEN as usize)?;
        let sig = u32::from_le_bytes([header_raw[0], header_raw[1], header_raw[2], header_raw[3]]);
        if sig != LOCAL_HEADER_SIG {
            return Err(P4kError::InvalidSignature {
                expected: LOCAL_HEADER_SIG,
                actual: sig,
            });
        }
        let header = LocalHeader::read(&mut Cursor::new(&header_raw))?;

        let data_offset = entry.local_header_offset
            + LOCAL_HEADER_LEN
            + u64::from(header.name_length)
            + u64::from(header.extra_length);
        let compressed = self.read_at(
            data_offset,
            usize::try_from(entry.compressed_size)
                .map_err(|_| P4kError::Decompression("entry exceeds addressable memory".into()))?,
        )?;

        // The directory sentinel misses some wrapped entries; a Zstd entry
        // that does not open with the frame magic is wrapped too.
        let encrypted = entry.is_encrypted
            || (method == CompressionMethod::Zstd
                && compressed.len() >= 4
                && u32::from_le_bytes([compressed[0], compressed[1], compressed[2], compressed[3]])
                    != ZSTD_MAGIC);

        let payload = if encrypted {
            decrypt_entry(&compressed)?
        } else {
            compressed
        };

        decompress(method, &payload, entry.uncompressed_size)
    }

    fn read_at(&self, offset: u64, len: usize) -> P4kResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn locate_directory(file: &mut File, file_len: u64) -> P4kResult<DirectoryLocation> {
        let span = usize::try_from(file_len.min(EOCD_SEARCH_SPAN as u64)).unwrap_or(0);
        if span < 22 {
            return Err(P4kError::EocdNotFound(span));
        }

        let tail_start = file_len - span as u64;
        let mut tail = vec![0u8; span];
        file.seek(SeekFrom::Start(tail_start))?;
        file.read_exact(&mut tail)?;

        let sig = EOCD_SIG.to_le_bytes();
        let eocd_pos = (0..=span - 22)
            .rev()
            .find(|&i| tail[i..i + 4] == sig)
            .ok_or(P4kError::EocdNotFound(span))?;

        let eocd = EocdRecord::read(&mut Cursor::new(&tail[eocd_pos..]))?;
        if !eocd.needs_zip64() {
            return Ok(DirectoryLocation {
                entries_total: u64::from(eocd.entries_total),
                offset: u64::from(eocd.directory_offset),
                size: u64::from(eocd.directory_size),
            });
        }

        // Saturated totals: the ZIP64 locator sits before the EOCD.
        let locator_sig = ZIP64_LOCATOR_SIG.to_le_bytes();
        let locator_pos = (0..eocd_pos)
            .rev()
            .find(|&i| tail[i..i + 4] == locator_sig)
            .ok_or(P4kError::Zip64EocdNotFound)?;
        let locator = Zip64Locator::read(&mut Cursor::new(&tail[locator_pos..]))?;

        let mut eocd64_raw = vec![0u8; 56];
        file.seek(SeekFrom::Start(locator.eocd_offset))?;
        file.read_exact(&mut eocd64_raw)?;

        let sig64 =
            u32::from_le_bytes([eocd64_raw[0], eocd64_raw[1], eocd64_raw[2], eocd64_raw[3]]);
        if sig64 != ZIP64_EOCD_SIG {
            return Err(P4kError::InvalidSignature {
                expected: ZIP64_EOCD_SIG,
                actual: sig64,
            });
        }
        let eocd64 = Zip64EocdRecord::read(&mut Cursor::new(&eocd64_raw))?;

        Ok(DirectoryLocation {
            entries_total: eocd64.entries_total,
            offset: eocd64.directory_offset,
            size: eocd64.directory_size,
        })
    }

    fn read_directory_entry(stream: &mut DirectoryStream<'_>) -> P4kResult<P4kEntry> {
        stream.ensure(46)?;
        let header = {
            let raw = stream.peek(46);
            let sig = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            if sig != crate::zip::CENTRAL_HEADER_SIG {
                return Err(P4kError::InvalidSignature {
                    expected: crate::zip::CENTRAL_HEADER_SIG,
                    actual: sig,
                });
            }
            CentralHeader::read(&mut Cursor::new(raw))?
        };

        let record_len = header.record_len();
        stream.ensure(record_len)?;
        let record = stream.peek(record_len);

        let name_end = 46 + header.name_length as usize;
        let extra_end = name_end + header.extra_length as usize;
        let name = String::from_utf8_lossy(&record[46..name_end]).into_owned();
        let extra = &record[name_end..extra_end];

        let zip64 = parse_zip64_extra(extra, &header);
        let uncompressed_size = zip64
            .uncompressed_size
            .unwrap_or(u64::from(header.uncompressed_size));
        let compressed_size = zip64
            .compressed_size
            .unwrap_or(u64::from(header.compressed_size));
        let local_header_offset = zip64
            .local_header_offset
            .unwrap_or(u64::from(header.local_header_offset));
        let is_encrypted = extra_field_encrypted(extra);

        if CompressionMethod::from_id(header.method).is_err() {
            warn!(method = header.method, path = %name, "entry uses an unsupported method");
        }

        let path = name.replace('/', "\\");
        let is_directory = path.ends_with('\\');

        stream.advance(record_len);

        Ok(P4kEntry {
            path,
            uncompressed_size,
            compressed_size,
            method_id: header.method,
            is_directory,
            is_encrypted,
            local_header_offset,
        })
    }
}

impl std::fmt::Debug for P4kArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P4kArchive")
            .field("len", &self.file_len)
            .field("declared_entries", &self.directory.entries_total)
            .field("indexed_entries", &self.entries.len())
            .finish()
    }
}

/// Chunked view over the central directory region.
///
/// Keeps at most one chunk plus one partial record in memory; records that
/// straddle a chunk boundary trigger a refill that slides the unconsumed
/// tail to the front.
struct DirectoryStream<'a> {
    file: &'a Mutex<File>,
    next_offset: u64,
    remaining: u64,
    buf: Vec<u8>,
    pos: usize,
}

impl<'a> DirectoryStream<'a> {
    fn new(file: &'a Mutex<File>, offset: u64, size: u64) -> Self {
        Self {
            file,
            next_offset: offset,
            remaining: size,
            buf: Vec::new(),
            pos: 0,
        }
    }

    fn ensure(&mut self, need: usize) -> P4kResult<()> {
        while self.buf.len() - self.pos < need && self.remaining > 0 {
            if self.pos > 0 {
                self.buf.drain(..self.pos);
                self.pos = 0;
            }
            let take = usize::try_from(self.remaining.min(DIRECTORY_CHUNK as u64)).unwrap_or(0);
            let start = self.buf.len();
            self.buf.resize(start + take, 0);
            {
                let mut file = self.file.lock();
                file.seek(SeekFrom::Start(self.next_offset))?;
                file.read_exact(&mut self.buf[start..])?;
            }
            self.next_offset += take as u64;
            self.remaining -= take as u64;
        }

        let available = self.buf.len() - self.pos;
        if available < need {
            return Err(P4kError::TruncatedDirectory {
                needed: need,
                available,
            });
        }
        Ok(())
    }

    fn peek(&self, len: usize) -> &[u8] {
        &self.buf[self.pos..self.pos + len]
    }

    fn advance(&mut self, len: usize) {
        self.pos += len;
    }
}
