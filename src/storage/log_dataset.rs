use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use crc32fast::Hasher;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::core::config::{Config, SyncMode};
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::dataset::Dataset;

const FRAME_HEADER_SIZE: u64 = 8;
/// Hard frame size limit, enforced on replay and reads
pub const MAX_RECORD_SIZE: usize = 256 * 1024 * 1024;
const SYNC_BATCH_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct LogOptions {
    pub compression: bool,
    pub compression_threshold: usize,
    pub sync_mode: SyncMode,
    pub max_record_size: usize,
}

impl From<&Config> for LogOptions {
    fn from(config: &Config) -> Self {
        LogOptions {
            compression: config.compression,
            compression_threshold: config.compression_threshold,
            sync_mode: config.sync_mode,
            max_record_size: config.max_value_size.min(MAX_RECORD_SIZE),
        }
    }
}

// [ LEN u32 ][ CRC32 u32 ][ bincode(LogRecord) ]
#[derive(Debug, Serialize, Deserialize)]
enum LogRecord {
    Put { key: String, value: Vec<u8>, compressed: bool },
    Delete { key: String },
}

#[derive(Debug, Clone, Copy)]
struct RecordPointer {
    offset: u64,
}

struct LogFile {
    file: File,
    position: u64,
    unsynced: u64,
    dead_records: u64,
}

/// Append-only, file-backed dataset. The key directory lives in memory and
/// points at the latest `Put` frame of every live key.
pub struct LogDataset {
    name: String,
    path: PathBuf,
    compaction_path: PathBuf,
    options: LogOptions,
    log: Mutex<LogFile>,
    keys: RwLock<BTreeMap<String, RecordPointer>>,
}

impl LogDataset {
    pub fn open(
        name: &str,
        path: PathBuf,
        compaction_path: PathBuf,
        options: LogOptions,
    ) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let (keys, position, dead_records) = Self::replay(name, &mut file)?;
        debug!(target: "db:stored", dataset = name, keys = keys.len(), dead_records, "dataset opened");

        Ok(LogDataset {
            name: name.to_string(),
            path,
            compaction_path,
            options,
            log: Mutex::new(LogFile {
                file,
                position,
                unsynced: 0,
                dead_records,
            }),
            keys: RwLock::new(keys),
        })
    }

    /// Rebuild the key directory, truncating a torn or corrupt tail
    fn replay(name: &str, file: &mut File) -> Result<(BTreeMap<String, RecordPointer>, u64, u64)> {
        let file_len = file.metadata()?.len();
        file.seek(SeekFrom::Start(0))?;

        let mut keys = BTreeMap::new();
        let mut position = 0u64;
        let mut dead_records = 0u64;

        {
            let mut reader = BufReader::new(&mut *file);
            loop {
                let payload = match read_frame(&mut reader) {
                    Ok(Some(payload)) => payload,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(target: "db:stored", dataset = name, offset = position, error = %e, "corrupt log record, truncating");
                        break;
                    }
                };

                let record: LogRecord = match bincode::deserialize(&payload) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(target: "db:stored", dataset = name, offset = position, error = %e, "undecodable log record, truncating");
                        break;
                    }
                };

                match record {
                    LogRecord::Put { key, .. } => {
                        if keys.insert(key, RecordPointer { offset: position }).is_some() {
                            dead_records += 1;
                        }
                    }
                    LogRecord::Delete { key } => {
                        if keys.remove(&key).is_some() {
                            dead_records += 1;
                        }
                        dead_records += 1;
                    }
                }

                position += FRAME_HEADER_SIZE + payload.len() as u64;
            }
        }

        if position < file_len {
            warn!(target: "db:stored", dataset = name, dropped_bytes = file_len - position, "log tail discarded");
            file.set_len(position)?;
        }
        file.seek(SeekFrom::Start(position))?;

        Ok((keys, position, dead_records))
    }

    /// Frames that replay would reject are never written
    fn check_record_size(&self, record: &LogRecord) -> Result<()> {
        let size = bincode::serialized_size(record)?;
        let limit = self.options.max_record_size.min(MAX_RECORD_SIZE);
        if size > limit as u64 {
            return Err(Error::validation(format!(
                "Record of {} bytes exceeds the {} byte limit",
                size, limit
            )));
        }
        Ok(())
    }

    fn append(&self, log: &mut LogFile, record: &LogRecord) -> Result<u64> {
        let payload = bincode::serialize(record)?;
        let frame = encode_frame(&payload)?;
        let offset = log.position;

        log.file.seek(SeekFrom::Start(offset))?;
        log.file.write_all(&frame)?;

        log.position += frame.len() as u64;
        log.unsynced += frame.len() as u64;

        match self.options.sync_mode {
            SyncMode::Immediate => {
                log.file.sync_data()?;
                log.unsynced = 0;
            }
            SyncMode::Batch if log.unsynced >= SYNC_BATCH_BYTES => {
                log.file.sync_data()?;
                log.unsynced = 0;
            }
            _ => {}
        }

        Ok(offset)
    }

    fn read_value(log: &mut LogFile, pointer: RecordPointer) -> Result<Vec<u8>> {
        let payload = read_frame_at(&mut log.file, pointer.offset)?;
        match bincode::deserialize(&payload)? {
            LogRecord::Put { value, compressed, .. } => {
                if compressed {
                    lz4_flex::decompress_size_prepended(&value)
                        .map_err(|e| Error::new(ErrorKind::Parse, format!("lz4: {}", e)))
                } else {
                    Ok(value)
                }
            }
            LogRecord::Delete { key } => Err(Error::new(
                ErrorKind::Internal,
                format!("Key directory points at a delete record for \"{}\"", key),
            )),
        }
    }

    fn encode_value(&self, value: &[u8]) -> (Vec<u8>, bool) {
        if self.options.compression && value.len() >= self.options.compression_threshold {
            (lz4_flex::compress_prepend_size(value), true)
        } else {
            (value.to_vec(), false)
        }
    }

    pub fn dead_records(&self) -> u64 {
        self.log.lock().dead_records
    }

    pub fn size_bytes(&self) -> u64 {
        self.log.lock().position
    }

    pub fn sync(&self) -> Result<()> {
        let mut log = self.log.lock();
        log.file
            .sync_all()
            .map_err(|e| Error::storage(&self.name, "sync", "*", e))?;
        log.unsynced = 0;
        Ok(())
    }
}

impl Dataset for LogDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut log = self.log.lock();
        let pointer = match self.keys.read().get(key) {
            Some(pointer) => *pointer,
            None => return Ok(None),
        };
        Self::read_value(&mut log, pointer)
            .map(Some)
            .map_err(|e| Error::storage(&self.name, "get", key, e))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let (value, compressed) = self.encode_value(value);
        let record = LogRecord::Put {
            key: key.to_string(),
            value,
            compressed,
        };

        self.check_record_size(&record)?;

        let mut log = self.log.lock();
        let offset = self
            .append(&mut log, &record)
            .map_err(|e| Error::storage(&self.name, "put", key, e))?;

        if self
            .keys
            .write()
            .insert(key.to_string(), RecordPointer { offset })
            .is_some()
        {
            log.dead_records += 1;
        }
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.keys.read().contains_key(key))
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut log = self.log.lock();
        if !self.keys.read().contains_key(key) {
            return Ok(false);
        }

        let record = LogRecord::Delete { key: key.to_string() };
        self.append(&mut log, &record)
            .map_err(|e| Error::storage(&self.name, "remove", key, e))?;

        self.keys.write().remove(key);
        log.dead_records += 2;
        Ok(true)
    }

    fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let mut log = self.log.lock();
        let directory = self.keys.read();
        keys.iter()
            .map(|key| match directory.get(key) {
                Some(pointer) => Self::read_value(&mut log, *pointer)
                    .map(Some)
                    .map_err(|e| Error::storage(&self.name, "get", key, e)),
                None => Ok(None),
            })
            .collect()
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.keys.read().keys().cloned().collect())
    }

    fn keys_count(&self) -> Result<usize> {
        Ok(self.keys.read().len())
    }

    fn compact(&self) -> Result<()> {
        let mut log = self.log.lock();
        let mut directory = self.keys.write();

        let compacted = (|| -> Result<(File, BTreeMap<String, RecordPointer>, u64)> {
            // The handle follows the inode through the rename, so the live
            // log is never swapped for a file that failed to open
            let mut out = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.compaction_path)?;
            let mut new_directory = BTreeMap::new();
            let mut position = 0u64;

            // Frames are copied verbatim, values are never re-encoded
            for (key, pointer) in directory.iter() {
                let payload = read_frame_at(&mut log.file, pointer.offset)?;
                let frame = encode_frame(&payload)?;
                out.write_all(&frame)?;
                new_directory.insert(key.clone(), RecordPointer { offset: position });
                position += frame.len() as u64;
            }
            out.sync_all()?;

            fs::rename(&self.compaction_path, &self.path)?;
            Ok((out, new_directory, position))
        })();

        let (file, new_directory, position) =
            compacted.map_err(|e| Error::storage(&self.name, "compact", "*", e))?;

        let reclaimed = log.position.saturating_sub(position);
        log.file = file;
        log.position = position;
        log.unsynced = 0;
        log.dead_records = 0;
        *directory = new_directory;

        info!(target: "db:stored", dataset = %self.name, reclaimed_bytes = reclaimed, "dataset compacted");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.sync()
    }
}

fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len as usize <= MAX_RECORD_SIZE)
        .ok_or_else(|| Error::validation(format!("Log record too large ({} bytes)", payload.len())))?;

    let mut hasher = Hasher::new();
    hasher.update(payload);
    let checksum = hasher.finalize();

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE as usize + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&checksum.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Ok(None) on a clean end of log, or when not even a full header is left
fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut header = [0u8; FRAME_HEADER_SIZE as usize];
    match reader.read_exact(&mut header) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    if len > MAX_RECORD_SIZE {
        return Err(Error::new(ErrorKind::Parse, format!("Log record too large ({} bytes), possibly corrupted", len)));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    if hasher.finalize() != expected {
        return Err(Error::new(ErrorKind::Parse, "Log record checksum mismatch".to_string()));
    }

    Ok(Some(payload))
}

fn read_frame_at(file: &mut File, offset: u64) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    read_frame(file)?.ok_or_else(|| {
        Error::new(ErrorKind::Internal, format!("No log record at offset {}", offset))
    })
}
