use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::{Source, SourceError};
use crate::shutdown::Shutdown;

/// Tails a newline delimited text file.
///
/// Every fetch reads, one line at a time, the complete lines appended since
/// the last consumed byte offset; a trailing line without its newline is left
/// for a later fetch. If the file shrinks below the offset it is assumed to
/// have been truncated and is read again from the start.
pub struct FileSource {
    path: PathBuf,
    filter: Option<String>,
    offset: Arc<AtomicU64>,
    capacity: u64,
    over_capacity: bool,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource {
            path: path.into(),
            filter: None,
            offset: Arc::new(AtomicU64::new(0)),
            capacity: 0,
            over_capacity: false,
        }
    }

    /// Only yield lines containing `pattern`.
    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    /// Start reading at `offset` instead of the beginning of the file.
    pub fn starting_at(self, offset: u64) -> Self {
        self.offset.store(offset, Ordering::Release);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset just past the last line handed out.
    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::Acquire)
    }

    fn check_capacity(&mut self, len: u64) {
        if self.capacity == 0 || self.over_capacity || len <= self.capacity {
            return;
        }
        self.over_capacity = true;
        warn!(
            path = %self.path.display(),
            len,
            capacity = self.capacity,
            "tailed file grew past its provisioned capacity"
        );
    }
}

impl Source for FileSource {
    type Item = String;
    type Batch = FileBatch;

    fn open(&mut self, _stop: &Shutdown) -> Result<Self::Batch, SourceError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::Missing { name: self.name() })
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata()?.len();
        self.check_capacity(len);

        let mut start = self.offset();
        if len < start {
            warn!(
                path = %self.path.display(),
                len,
                offset = start,
                "file truncated, rereading from start"
            );
            start = 0;
            self.offset.store(0, Ordering::Release);
        }
        file.seek(SeekFrom::Start(start))?;
        trace!(path = %self.path.display(), from = start, len, "opened file batch");

        Ok(FileBatch {
            reader: BufReader::new(file),
            buf: Vec::new(),
            end: start,
            offset: self.offset.clone(),
            filter: self.filter.clone(),
            done: false,
        })
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> Result<bool, SourceError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn provision(&mut self, capacity_bytes: u64) -> Result<(), SourceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.capacity = capacity_bytes;
        debug!(path = %self.path.display(), capacity_bytes, "created tailed file");
        Ok(())
    }
}

/// Lines read one at a time from an open file handle.
///
/// The source offset advances as lines are yielded, so lines left in an
/// abandoned batch are read again by the next fetch. A line that is not valid
/// UTF-8 is skipped and yielded as an `InvalidData` error.
pub struct FileBatch {
    reader: BufReader<File>,
    buf: Vec<u8>,
    end: u64,
    offset: Arc<AtomicU64>,
    filter: Option<String>,
    done: bool,
}

impl FileBatch {
    /// Next complete line, or `None` at end of data or on a partial line.
    fn read_line(&mut self) -> Option<Result<String, SourceError>> {
        self.buf.clear();
        let read = match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(read) => read,
            Err(e) => return Some(Err(e.into())),
        };
        if read == 0 || self.buf.last() != Some(&b'\n') {
            return None;
        }
        self.end += read as u64;
        self.offset.store(self.end, Ordering::Release);

        let bytes = std::mem::take(&mut self.buf);
        match String::from_utf8(bytes) {
            Ok(mut line) => {
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Some(Ok(line))
            }
            Err(_) => Some(Err(SourceError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line ending at byte {} is not valid UTF-8", self.end),
            )))),
        }
    }
}

impl Iterator for FileBatch {
    type Item = Result<String, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.read_line() {
                None => self.done = true,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(line)) => match &self.filter {
                    Some(pattern) if !line.contains(pattern.as_str()) => continue,
                    _ => return Some(Ok(line)),
                },
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[fixture]
    fn dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn append(path: &Path, text: &str) {
        append_bytes(path, text.as_bytes());
    }

    fn append_bytes(path: &Path, bytes: &[u8]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(bytes).unwrap();
    }

    fn drain(source: &mut FileSource) -> Vec<String> {
        source.open(&Shutdown::new()).unwrap().map(|line| line.unwrap()).collect()
    }

    #[rstest]
    fn test_reads_only_new_lines(dir: TempDir) {
        let path = dir.path().join("feed.log");
        append(&path, "one\ntwo\n");
        let mut source = FileSource::new(&path);

        assert_eq!(drain(&mut source), vec!["one", "two"]);
        assert!(drain(&mut source).is_empty());

        append(&path, "three\r\n");
        assert_eq!(drain(&mut source), vec!["three"]);
        assert_eq!(source.offset(), 15);
    }

    #[rstest]
    fn test_partial_line_waits_for_newline(dir: TempDir) {
        let path = dir.path().join("feed.log");
        append(&path, "complete\nparti");
        let mut source = FileSource::new(&path);

        assert_eq!(drain(&mut source), vec!["complete"]);
        append(&path, "al\n");
        assert_eq!(drain(&mut source), vec!["partial"]);
    }

    #[rstest]
    fn test_abandoned_batch_resumes_after_last_yielded_line(dir: TempDir) {
        let path = dir.path().join("feed.log");
        append(&path, "a\nb\nc\n");
        let mut source = FileSource::new(&path);

        let mut batch = source.open(&Shutdown::new()).unwrap();
        assert_eq!(batch.next().unwrap().unwrap(), "a");
        drop(batch);

        assert_eq!(drain(&mut source), vec!["b", "c"]);
    }

    #[rstest]
    fn test_filter(dir: TempDir) {
        let path = dir.path().join("feed.log");
        append(&path, "INFO up\nERROR down\nINFO again\n");
        let mut source = FileSource::new(&path).with_filter("INFO");

        assert_eq!(drain(&mut source), vec!["INFO up", "INFO again"]);
        assert_eq!(source.offset(), 30);
    }

    #[rstest]
    fn test_truncation_rereads_from_start(dir: TempDir) {
        let path = dir.path().join("feed.log");
        append(&path, "first line\n");
        let mut source = FileSource::new(&path);
        assert_eq!(drain(&mut source), vec!["first line"]);

        std::fs::write(&path, "new\n").unwrap();
        assert_eq!(drain(&mut source), vec!["new"]);
    }

    #[rstest]
    fn test_missing_file_then_provision(dir: TempDir) {
        let path = dir.path().join("nested").join("feed.log");
        let mut source = FileSource::new(&path);

        assert!(!source.exists().unwrap());
        assert!(matches!(
            source.open(&Shutdown::new()),
            Err(SourceError::Missing { .. })
        ));

        source.provision(4096).unwrap();
        assert!(source.exists().unwrap());
        assert!(drain(&mut source).is_empty());
    }

    #[rstest]
    fn test_starting_offset(dir: TempDir) {
        let path = dir.path().join("feed.log");
        append(&path, "old\nnew\n");
        let mut source = FileSource::new(&path).starting_at(4);

        assert_eq!(drain(&mut source), vec!["new"]);
    }

    #[rstest]
    fn test_batch_reads_lazily(dir: TempDir) {
        let path = dir.path().join("feed.log");
        append(&path, "first\n");
        let mut source = FileSource::new(&path);

        let mut batch = source.open(&Shutdown::new()).unwrap();
        assert_eq!(source.offset(), 0);
        assert_eq!(batch.next().unwrap().unwrap(), "first");
        assert_eq!(source.offset(), 6);

        append(&path, "second\n");
        assert_eq!(batch.next().unwrap().unwrap(), "second");
        assert!(batch.next().is_none());
        assert_eq!(source.offset(), 13);
    }

    #[rstest]
    fn test_invalid_utf8_line_is_reported_and_skipped(dir: TempDir) {
        let path = dir.path().join("feed.log");
        append(&path, "ok\n");
        append_bytes(&path, b"\xff\xfe\n");
        append(&path, "after\n");
        let mut source = FileSource::new(&path);

        let mut batch = source.open(&Shutdown::new()).unwrap();
        assert_eq!(batch.next().unwrap().unwrap(), "ok");
        match batch.next() {
            Some(Err(SourceError::Io(e))) => {
                assert_eq!(e.kind(), io::ErrorKind::InvalidData)
            }
            other => panic!("expected invalid data error, got {:?}", other),
        }
        assert!(batch.next().is_none());
        drop(batch);

        assert_eq!(drain(&mut source), vec!["after"]);
    }
}
