use crate::error::{LedgerError, Result};
use crate::events::{EventSink, LedgerEvent};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Append-only file of committed ledger events, for indexers that rebuild ownership history
pub struct FileEventJournal {
    path: PathBuf,
    file: BufWriter<File>,
}

impl FileEventJournal {
    /// Create or open the journal at `path`; new events are appended
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, event: &LedgerEvent) -> Result<()> {
        let serialized = bincode::serialize(event)?;

        // Write the entry length and data
        let entry_len = serialized.len() as u64;
        self.file.write_all(&entry_len.to_le_bytes())?;
        self.file.write_all(&serialized)?;
        self.file.flush()?;
        Ok(())
    }

    /// Iterate over every event in the journal file, oldest first
    pub fn iter(&self) -> Result<JournalIterator> {
        let file = File::open(&self.path)?;
        Ok(JournalIterator {
            reader: BufReader::new(file),
        })
    }
}

impl EventSink for FileEventJournal {
    fn publish(&mut self, event: &LedgerEvent) -> Result<()> {
        self.append(event)
    }
}

/// Iterator over journal entries
pub struct JournalIterator {
    reader: BufReader<File>,
}

impl Iterator for JournalIterator {
    type Item = Result<LedgerEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut len_buf = [0u8; 8];
        match self.reader.read_exact(&mut len_buf) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return None,
            Err(e) => return Some(Err(LedgerError::from(e))),
        }

        let entry_len = u64::from_le_bytes(len_buf);
        let mut entry_data = vec![0u8; entry_len as usize];
        if let Err(e) = self.reader.read_exact(&mut entry_data) {
            return Some(Err(LedgerError::from(e)));
        }

        Some(bincode::deserialize(&entry_data).map_err(LedgerError::from))
    }
}
