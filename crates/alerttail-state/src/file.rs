//! File-backed [`StateIo`].
//!
//! Saves go through a temporary file in the same directory followed by a
//! rename, so readers only ever see a complete previous or complete new
//! state file.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error;
use crate::io::{StateIo, StateSink};

/// State persisted in a single file at `path`.
#[derive(Debug, Clone)]
pub struct FileStateIo {
    path: PathBuf,
}

impl FileStateIo {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl StateIo for FileStateIo {
    fn open_read(&self) -> error::Result<Option<Box<dyn Read + Send + '_>>> {
        match File::open(&self.path) {
            Ok(f) => Ok(Some(Box::new(f))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn open_write(&self) -> error::Result<Box<dyn StateSink + '_>> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        Ok(Box::new(FileSink {
            tmp,
            target: &self.path,
        }))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

struct FileSink<'a> {
    tmp: NamedTempFile,
    target: &'a Path,
}

impl Write for FileSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tmp.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tmp.flush()
    }
}

impl StateSink for FileSink<'_> {
    fn commit(self: Box<Self>) -> error::Result<()> {
        let FileSink { mut tmp, target } = *self;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(target).map_err(|e| e.error)?;
        Ok(())
    }
}
