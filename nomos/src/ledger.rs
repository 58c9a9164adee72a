//! Append-only, hash-chained JSONL ledger.
//!
//! Each line is one self-contained record:
//!
//! ```text
//! {"ts": <unix seconds>, "hash": <hex sha256>, "prev": <hex sha256 | null>, "obj": <payload>}
//! ```
//!
//! `hash = SHA-256(canonical_json({"obj": obj, "prev": prev}))`, the same
//! bytes `json.dumps(..., sort_keys=True)` produces, so journals written by the
//! Python tooling verify here. Record `i`'s `prev` is record `i-1`'s `hash`.
//!
//! A record is written with one `write_all` of the full line including its
//! newline, then synced. A failed write is cut back to the previous end of
//! the journal; if that fails too the handle halts and refuses every later
//! append. On reopen, a final line without newline is kept if it parses and
//! cut off otherwise.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

use logos_charter::{canonical_json, compute_hash};

/// Error types for the ledger. All of them are fatal to the caller.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Reading or writing the journal failed
    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded
    #[error("Ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored hashes do not chain
    #[error("Ledger chain broken at record {index}: {reason}")]
    ChainBroken { index: usize, reason: String },

    /// A writer panicked while holding the ledger
    #[error("Ledger lock poisoned")]
    Poisoned,

    /// An earlier append failed and its partial record could not be removed
    #[error("Ledger halted: a failed append could not be rolled back")]
    Halted,
}

/// One journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Wall-clock time of the append, unix seconds
    pub ts: f64,
    /// Hash over `obj` and `prev`
    pub hash: String,
    /// Hash of the previous record, absent for the first
    pub prev: Option<String>,
    /// Payload
    pub obj: Value,
}

impl LedgerRecord {
    /// Whether the stored hash matches the payload and predecessor.
    pub fn is_intact(&self) -> Result<bool, LedgerError> {
        Ok(hash_record(&self.obj, self.prev.as_deref())? == self.hash)
    }
}

/// Hash a payload together with its predecessor's hash.
pub fn hash_record(obj: &Value, prev: Option<&str>) -> Result<String, LedgerError> {
    let envelope = canonical_json(&json!({ "obj": obj, "prev": prev }))?;
    Ok(compute_hash(envelope.as_bytes()))
}

/// Check that `records` form one unbroken chain from the genesis record.
///
/// Reports the first index whose hash or back-link does not hold.
pub fn verify_chain(records: &[LedgerRecord]) -> Result<(), LedgerError> {
    let mut expected_prev: Option<&str> = None;
    for (index, record) in records.iter().enumerate() {
        if record.prev.as_deref() != expected_prev {
            return Err(LedgerError::ChainBroken {
                index,
                reason: format!(
                    "prev is {:?}, expected {:?}",
                    record.prev.as_deref(),
                    expected_prev
                ),
            });
        }
        if !record.is_intact()? {
            return Err(LedgerError::ChainBroken {
                index,
                reason: "stored hash does not match contents".to_string(),
            });
        }
        expected_prev = Some(record.hash.as_str());
    }
    Ok(())
}

/// Durable byte store behind a ledger handle.
trait Journal: Send {
    /// Current length in bytes.
    fn size(&mut self) -> io::Result<u64>;

    /// Write `bytes` at the end and make them durable.
    fn append_durable(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Cut the journal back to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl Journal for File {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn append_durable(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_data()
    }
}

struct LedgerState {
    journal: Box<dyn Journal>,
    last_hash: Option<String>,
    len: usize,
    halted: bool,
}

/// Single-writer ledger handle.
///
/// `append` is the only write operation; it reads the chain head and writes
/// the next record under one lock.
pub struct Ledger {
    path: PathBuf,
    state: Mutex<LedgerState>,
}

/// What to do with bytes after the last newline.
enum Tail {
    None,
    Terminate,
    Truncate(usize),
}

impl Ledger {
    /// Open or create the ledger at `path`.
    ///
    /// The existing chain is verified. A final unterminated line that parses
    /// as a record is kept and terminated; one that does not is an
    /// interrupted write and is truncated away.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut content = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let complete_len = content
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let tail = if complete_len == content.len() {
            Tail::None
        } else if serde_json::from_slice::<LedgerRecord>(&content[complete_len..]).is_ok() {
            Tail::Terminate
        } else {
            let dropped = content.len() - complete_len;
            content.truncate(complete_len);
            Tail::Truncate(dropped)
        };

        let records = parse_records(&content)?;
        verify_chain(&records)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        match tail {
            Tail::None => {}
            Tail::Terminate => {
                info!(path = %path.display(), "Terminating final ledger record");
                file.append_durable(b"\n")?;
            }
            Tail::Truncate(dropped_bytes) => {
                warn!(
                    path = %path.display(),
                    dropped_bytes,
                    "Truncating interrupted trailing ledger write"
                );
                file.truncate(complete_len as u64)?;
            }
        }

        let last_hash = records.last().map(|r| r.hash.clone());
        info!(path = %path.display(), records = records.len(), "Ledger opened");

        Ok(Self {
            path,
            state: Mutex::new(LedgerState {
                journal: Box::new(file),
                last_hash,
                len: records.len(),
                halted: false,
            }),
        })
    }

    /// Append a payload and return its record hash.
    ///
    /// On error nothing of the record remains in the journal and the chain
    /// head is unchanged.
    pub fn append<T: Serialize + ?Sized>(&self, obj: &T) -> Result<String, LedgerError> {
        let obj = serde_json::to_value(obj)?;
        let mut state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        if state.halted {
            return Err(LedgerError::Halted);
        }

        let prev = state.last_hash.clone();
        let hash = hash_record(&obj, prev.as_deref())?;
        let record = LedgerRecord {
            ts: unix_seconds(),
            hash: hash.clone(),
            prev,
            obj,
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let start = state.journal.size()?;
        if let Err(e) = state.journal.append_durable(line.as_bytes()) {
            match state.journal.truncate(start) {
                Ok(()) => warn!(error = %e, len = start, "Ledger append failed, rolled back"),
                Err(rollback) => {
                    state.halted = true;
                    error!(
                        error = %e,
                        rollback_error = %rollback,
                        path = %self.path.display(),
                        "Ledger append failed and could not be rolled back, halting"
                    );
                }
            }
            return Err(e.into());
        }

        state.last_hash = Some(hash.clone());
        state.len += 1;
        debug!(hash = %hash, index = state.len - 1, "Ledger record appended");
        Ok(hash)
    }

    /// Hash of the newest record.
    pub fn last_hash(&self) -> Result<Option<String>, LedgerError> {
        let state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.last_hash.clone())
    }

    /// Number of records.
    pub fn len(&self) -> Result<usize, LedgerError> {
        let state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.len)
    }

    /// Whether no record has been written.
    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Journal location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back from disk.
    pub fn records(&self) -> Result<Vec<LedgerRecord>, LedgerError> {
        let _state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        let content = fs::read(&self.path)?;
        parse_records(&content)
    }

    /// Re-read the journal and verify the whole chain.
    pub fn verify(&self) -> Result<(), LedgerError> {
        verify_chain(&self.records()?)
    }
}

fn parse_records(content: &[u8]) -> Result<Vec<LedgerRecord>, LedgerError> {
    let mut records = Vec::new();
    for (index, line) in content.split(|&b| b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let record = serde_json::from_slice(line).map_err(|e| LedgerError::ChainBroken {
            index,
            reason: format!("unparsable record: {}", e),
        })?;
        records.push(record);
    }
    Ok(records)
}

fn unix_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
