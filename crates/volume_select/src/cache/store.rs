//! Append-only record logs, one per namespace
//!
//! File layout: an 8 byte header (`VSNS` magic, format version) followed by
//! records. Each record is `VSR1` magic, key length, value length and the
//! CRC32 of key and value (all little-endian `u32`), then the key and value
//! bytes. The newest record of a key wins. Opening a log rebuilds the key
//! index and truncates a torn or corrupted tail.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use log::{debug, warn};

use crate::cache::namespace::Namespace;

const LOG_MAGIC: &[u8; 4] = b"VSNS";
const LOG_VERSION: u32 = 1;
const LOG_HEADER_LEN: u64 = 8;
const RECORD_MAGIC: &[u8; 4] = b"VSR1";
const RECORD_HEADER_LEN: u64 = 16;

#[derive(Debug, Clone, Copy)]
struct RecordSpan {
    value_offset: u64,
    value_len: u32,
    record_len: u64,
}

/// Sizes of one namespace log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Live keys
    pub entries: usize,
    /// Bytes taken by the newest record of each key
    pub live_bytes: u64,
    /// Bytes on disk, superseded records included
    pub file_bytes: u64,
}

/// Record log of a single namespace
#[derive(Debug)]
pub struct NamespaceLog {
    path: PathBuf,
    index: HashMap<String, RecordSpan>,
    live_bytes: u64,
    file_len: u64,
    // Bytes past `file_len` a failed rollback left on disk
    stale_tail: bool,
}

impl NamespaceLog {
    /// Open or create the log at `path`
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if !path.exists() {
            write_empty_log(&path)?;
            return Ok(Self {
                path,
                index: HashMap::new(),
                live_bytes: 0,
                file_len: LOG_HEADER_LEN,
                stale_tail: false,
            });
        }

        let mut log = Self {
            path,
            index: HashMap::new(),
            live_bytes: 0,
            file_len: LOG_HEADER_LEN,
            stale_tail: false,
        };
        log.rebuild_index()?;
        Ok(log)
    }

    fn rebuild_index(&mut self) -> io::Result<()> {
        let file = File::open(&self.path)?;
        let disk_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut header = [0u8; 8];
        if reader.read_exact(&mut header).is_err() || &header[0..4] != LOG_MAGIC {
            warn!("Cache log {} has no valid header, starting it over", self.path.display());
            return self.reset();
        }
        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != LOG_VERSION {
            warn!(
                "Cache log {} has format version {version}, expected {LOG_VERSION}; starting it over",
                self.path.display()
            );
            return self.reset();
        }

        let mut offset = LOG_HEADER_LEN;
        loop {
            match read_record(&mut reader, offset) {
                Ok(Some((key, span))) => {
                    offset += span.record_len;
                    self.insert_span(key, span);
                }
                Ok(None) => break,
                Err(error) => {
                    warn!(
                        "Cache log {} is damaged at byte {offset} ({error}); dropping {} trailing bytes",
                        self.path.display(),
                        disk_len.saturating_sub(offset)
                    );
                    break;
                }
            }
        }

        if offset < disk_len {
            OpenOptions::new().write(true).open(&self.path)?.set_len(offset)?;
        }
        self.file_len = offset;
        debug!("Opened cache log {} with {} entries", self.path.display(), self.index.len());
        Ok(())
    }

    fn insert_span(&mut self, key: String, span: RecordSpan) {
        self.live_bytes += span.record_len;
        if let Some(previous) = self.index.insert(key, span) {
            self.live_bytes -= previous.record_len;
        }
    }

    /// Drop every entry and shrink the file to its header
    pub fn reset(&mut self) -> io::Result<()> {
        write_empty_log(&self.path)?;
        self.index.clear();
        self.live_bytes = 0;
        self.file_len = LOG_HEADER_LEN;
        self.stale_tail = false;
        Ok(())
    }

    fn truncate_to_known_len(&self) -> io::Result<()> {
        OpenOptions::new().write(true).open(&self.path)?.set_len(self.file_len)
    }

    /// Append a batch of records and make it durable
    ///
    /// Either the whole batch lands or the file is rolled back to its
    /// previous length and the index is untouched. When the rollback
    /// itself fails, the leftover bytes are cut before the next append.
    pub fn append(&mut self, entries: &[(String, Vec<u8>)]) -> io::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        if self.stale_tail {
            self.truncate_to_known_len()?;
            self.stale_tail = false;
            debug!("Dropped the unfinished tail of cache log {}", self.path.display());
        }

        let mut spans = Vec::with_capacity(entries.len());
        let written = (|| -> io::Result<()> {
            let file = OpenOptions::new().append(true).open(&self.path)?;
            let mut writer = BufWriter::new(file);
            let mut offset = self.file_len;
            for (key, value) in entries {
                let span = write_record(&mut writer, offset, key, value)?;
                offset += span.record_len;
                spans.push(span);
            }
            writer.flush()?;
            let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
            file.sync_data()
        })();

        if let Err(error) = written {
            if let Err(rollback) = self.truncate_to_known_len() {
                warn!(
                    "Could not roll cache log {} back to {} bytes after a failed append: {rollback}",
                    self.path.display(),
                    self.file_len
                );
                self.stale_tail = true;
            }
            return Err(error);
        }

        for ((key, _), span) in entries.iter().zip(spans) {
            self.file_len += span.record_len;
            self.insert_span(key.clone(), span);
        }
        Ok(())
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let Some(span) = self.index.get(key) else {
            return Ok(None);
        };
        let mut file = File::open(&self.path)?;
        read_value(&mut file, span).map(Some)
    }

    /// Whether `key` has an entry
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Every live key, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.index.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Every live entry, read in file order with a single handle
    pub fn entries(&self) -> io::Result<Vec<(String, Vec<u8>)>> {
        let mut spans: Vec<(&String, &RecordSpan)> = self.index.iter().collect();
        spans.sort_by_key(|(_, span)| span.value_offset);

        let mut file = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::with_capacity(spans.len());
        for (key, span) in spans {
            entries.push((key.clone(), read_value(&mut file, span)?));
        }
        Ok(entries)
    }

    /// Current sizes
    pub fn stats(&self) -> LogStats {
        LogStats {
            entries: self.index.len(),
            live_bytes: self.live_bytes,
            file_bytes: self.file_len,
        }
    }
}

/// The four namespace logs of one cache directory
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    logs: [NamespaceLog; 4],
}

impl Store {
    /// Open every namespace log under `root`, creating what is missing
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let [baseline_content, added_content, baseline_bounds, added_bounds] =
            Namespace::ALL.map(|namespace| NamespaceLog::open(root.join(namespace.file_name())));
        Ok(Self {
            root,
            logs: [baseline_content?, added_content?, baseline_bounds?, added_bounds?],
        })
    }

    /// Directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Log of `namespace`
    pub fn log(&self, namespace: Namespace) -> &NamespaceLog {
        &self.logs[namespace.slot()]
    }

    /// Mutable log of `namespace`
    pub fn log_mut(&mut self, namespace: Namespace) -> &mut NamespaceLog {
        &mut self.logs[namespace.slot()]
    }

    /// Whether every namespace is empty
    pub fn is_empty(&self) -> bool {
        self.logs.iter().all(|log| log.index.is_empty())
    }
}

fn write_empty_log(path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(LOG_MAGIC)?;
    file.write_all(&LOG_VERSION.to_le_bytes())?;
    file.sync_all()
}

fn checksum(key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

fn write_record(writer: &mut impl Write, offset: u64, key: &str, value: &[u8]) -> io::Result<RecordSpan> {
    let key_len = u32::try_from(key.len())
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "cache key too long"))?;
    let value_len = u32::try_from(value.len())
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "cache value too large"))?;

    writer.write_all(RECORD_MAGIC)?;
    writer.write_all(&key_len.to_le_bytes())?;
    writer.write_all(&value_len.to_le_bytes())?;
    writer.write_all(&checksum(key.as_bytes(), value).to_le_bytes())?;
    writer.write_all(key.as_bytes())?;
    writer.write_all(value)?;

    Ok(RecordSpan {
        value_offset: offset + RECORD_HEADER_LEN + u64::from(key_len),
        value_len,
        record_len: RECORD_HEADER_LEN + u64::from(key_len) + u64::from(value_len),
    })
}

/// Next record at `offset`; `Ok(None)` at a clean end of file
fn read_record(reader: &mut impl Read, offset: u64) -> io::Result<Option<(String, RecordSpan)>> {
    let mut header = [0u8; RECORD_HEADER_LEN as usize];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..])? {
            0 if filled == 0 => return Ok(None),
            0 => return Err(io::Error::new(ErrorKind::UnexpectedEof, "torn record header")),
            read => filled += read,
        }
    }
    if &header[0..4] != RECORD_MAGIC {
        return Err(io::Error::new(ErrorKind::InvalidData, "bad record magic"));
    }
    let key_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    let value_len = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    let crc = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);

    let mut key = vec![0u8; key_len as usize];
    reader.read_exact(&mut key)?;
    let mut value = vec![0u8; value_len as usize];
    reader.read_exact(&mut value)?;
    if checksum(&key, &value) != crc {
        return Err(io::Error::new(ErrorKind::InvalidData, "record checksum mismatch"));
    }
    let key = String::from_utf8(key)
        .map_err(|_| io::Error::new(ErrorKind::InvalidData, "record key is not UTF-8"))?;

    Ok(Some((
        key,
        RecordSpan {
            value_offset: offset + RECORD_HEADER_LEN + u64::from(key_len),
            value_len,
            record_len: RECORD_HEADER_LEN + u64::from(key_len) + u64::from(value_len),
        },
    )))
}

fn read_value(reader: &mut (impl Read + Seek), span: &RecordSpan) -> io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(span.value_offset))?;
    let mut value = vec![0u8; span.value_len as usize];
    reader.read_exact(&mut value)?;
    Ok(value)
}
