//! PID file for the running orchestrator
//!
//! `devstack up` records its own PID so that `devstack stop` and
//! `devstack status` can find it, and so a second `up` refuses to start
//! while the first one is alive.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::process;

/// A PID file at a fixed location
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Refer to the PID file at `path` (nothing is touched on disk)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the recorded PID
    ///
    /// Returns `Ok(None)` when the file does not exist and an
    /// `InvalidData` error when it does not hold a PID.
    pub fn read(&self) -> io::Result<Option<u32>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        contents
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// The recorded PID, if that process is still alive
    ///
    /// Stale or unreadable files count as "not running".
    pub fn live_pid(&self) -> Option<u32> {
        match self.read() {
            Ok(Some(pid)) if process::is_process_alive(pid) => Some(pid),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Ignoring unreadable PID file {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Write `pid`, creating parent directories as needed
    pub fn write(&self, pid: u32) -> io::Result<()> {
        self.create_parent()?;
        fs::write(&self.path, format!("{}\n", pid))
    }

    fn create_parent(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    /// Create the file with the current PID, failing if it already exists
    fn create_exclusive(&self) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;
        writeln!(file, "{}", std::process::id())
    }

    /// Remove the file; a missing file is not an error
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Record the current process and remove the file again on drop
    ///
    /// The file is created exclusively, so of two concurrent callers only
    /// one succeeds. A file naming a live process fails with
    /// `AlreadyExists`; a stale one is replaced.
    pub fn acquire(self) -> io::Result<PidFileGuard> {
        self.create_parent()?;

        match self.create_exclusive() {
            Ok(()) => return Ok(PidFileGuard { file: self }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }

        let contents = fs::read_to_string(&self.path).unwrap_or_default();
        let contents = contents.trim();
        if contents.is_empty() {
            // Created by another process that has not written its PID yet
            return Err(self.contended());
        }
        if let Ok(pid) = contents.parse::<u32>() {
            if process::is_process_alive(pid) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("PID {}", pid),
                ));
            }
        }

        tracing::debug!("Replacing stale PID file {:?}", self.path);
        self.remove()?;
        match self.create_exclusive() {
            Ok(()) => Ok(PidFileGuard { file: self }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(self.contended()),
            Err(e) => Err(e),
        }
    }

    fn contended(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "another instance is starting; remove {:?} if that is not the case",
                self.path
            ),
        )
    }
}

/// Removes the PID file when dropped
#[derive(Debug)]
pub struct PidFileGuard {
    file: PidFile,
}

impl PidFileGuard {
    /// Location of the guarded file
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.remove() {
            tracing::warn!("Failed to remove PID file {:?}: {}", self.file.path, e);
        }
    }
}
