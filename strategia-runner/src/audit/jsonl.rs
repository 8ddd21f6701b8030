//! JSONL decision log — one `DecisionRecord` per line, append-only.
//!
//! Each line is an independent JSON object, so a torn final write loses at
//! most that one record and never corrupts earlier ones. A failed append is
//! truncated back off the file, and an append after an unterminated final
//! line starts a fresh line first. Malformed lines are skipped on read with a
//! warning.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use strategia_core::Decision;

use super::{into_stored, newest_first, AuditStore, DecisionRecord, PersistenceError, StoredDecision};

pub struct JsonlAuditStore {
    path: PathBuf,
    /// Next id to assign. Held for the whole append so ids and line order agree.
    next_id: Mutex<u64>,
}

impl JsonlAuditStore {
    /// Open (or lazily create) the log at `path`, resuming id assignment after
    /// the highest id already present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let last_id = read_records(&path)?.iter().map(|r| r.id).max().unwrap_or(0);
        debug!(path = %path.display(), last_id, "opened audit log");
        Ok(Self {
            path,
            next_id: Mutex::new(last_id + 1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All readable records in file order.
    pub fn records(&self) -> Result<Vec<DecisionRecord>, PersistenceError> {
        read_records(&self.path)
    }
}

impl AuditStore for JsonlAuditStore {
    fn record(&self, decision: &Decision) -> Result<u64, PersistenceError> {
        let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        let id = *next_id;
        let record = DecisionRecord::from_decision(id, decision)?;
        let json = serde_json::to_string(&record)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        let start = file.metadata()?.len();

        let mut line = String::with_capacity(json.len() + 2);
        if start > 0 && !ends_with_newline(&mut file, start)? {
            warn!(path = %self.path.display(), "audit log ends mid-line, starting a new line");
            line.push('\n');
        }
        line.push_str(&json);
        line.push('\n');

        if let Err(e) = write_line(&mut file, &line) {
            // Drop any partial line so a retry appends to a clean end.
            if let Err(trunc) = file.set_len(start) {
                warn!(path = %self.path.display(), error = %trunc, "failed to truncate partial audit write");
            }
            return Err(e.into());
        }

        *next_id += 1;
        Ok(id)
    }

    fn history(&self, limit: usize) -> Result<Vec<StoredDecision>, PersistenceError> {
        let mut records = read_records(&self.path)?;
        newest_first(&mut records);
        into_stored(records, limit)
    }
}

fn write_line(file: &mut fs::File, line: &str) -> io::Result<()> {
    file.write_all(line.as_bytes())?;
    file.flush()?;
    file.sync_data()
}

fn ends_with_newline(file: &mut fs::File, len: u64) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn read_records(path: &Path) -> Result<Vec<DecisionRecord>, PersistenceError> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for (lineno, line) in io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<DecisionRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(path = %path.display(), line = lineno + 1, error = %e, "skipping malformed audit line"),
        }
    }
    Ok(records)
}
