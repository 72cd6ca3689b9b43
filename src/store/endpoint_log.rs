// src/store/endpoint_log.rs
// =============================================================================
// The durable, append-only endpoint log.
//
// One "<path> (Source: <url>)" line per discovered endpoint. The file is read
// once at startup to seed the in-memory dedup set, and afterwards only ever
// appended to. Each append opens, writes and closes the file, so no handle
// is held between cycles and a crash can at worst leave one partial line
// (which the loader skips).
// =============================================================================

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{MonitorError, Result};

#[derive(Debug, Clone)]
pub struct EndpointLog {
    path: PathBuf,
}

impl EndpointLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every line of the log. A missing file is an empty log.
    pub fn load(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(MonitorError::Read {
                what: "endpoint log",
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Appends `lines`, one per line, creating the file if needed.
    pub fn append(&self, lines: &[String]) -> Result<()> {
        let write = || -> io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            let mut buf = String::new();
            for line in lines {
                buf.push_str(line);
                buf.push('\n');
            }
            file.write_all(buf.as_bytes())
        };
        write().map_err(|source| MonitorError::Write {
            what: "endpoint log",
            path: self.path.clone(),
            source,
        })
    }
}
