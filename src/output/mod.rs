use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub mod json_lines;
pub mod memory;

pub use json_lines::JsonLines;
pub use memory::MemorySink;

/// An append-only destination for serialized records
pub trait Sink {
    /// Append one record
    fn append(&mut self, record: &str) -> Result<(), SinkError>;

    /// Flush and close the sink
    ///
    /// Called exactly once, at the end of a clean run.
    fn finish(&mut self) -> Result<(), SinkError>;

    /// Serialize a record as json and append it
    fn append_record(&mut self, record: &impl Serialize) -> Result<(), SinkError>
    where
        Self: Sized,
    {
        self.append(&serde_json::to_string(record)?)
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create {path:?}")]
    Create {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
    #[error("failed to append to {path:?}")]
    Append {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
    #[error("failed to flush {path:?}")]
    Flush {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
    #[error("failed to encode record")]
    Encode(#[from] serde_json::Error),
}

/// File names used by [SinkSet::in_dir]
pub const FEATURES_FILE: &str = "features.jsonl";
pub const POINTS_FILE: &str = "points.jsonl";
pub const ERRORS_FILE: &str = "errors.jsonl";

/// The three output streams of one analyzer run
#[derive(Debug)]
pub struct SinkSet<S> {
    pub features: S,
    pub points: S,
    pub errors: S,
}

impl<S: Sink> SinkSet<S> {
    pub fn finish(&mut self) -> Result<(), SinkError> {
        self.features.finish()?;
        self.points.finish()?;
        self.errors.finish()
    }
}

impl SinkSet<JsonLines> {
    /// Create the three standard files inside `dir`, creating `dir` if needed
    pub fn in_dir(dir: &Path) -> Result<Self, SinkError> {
        create_dir_all(dir).map_err(|source| SinkError::Create {
            source,
            path: dir.to_path_buf(),
        })?;
        Ok(SinkSet {
            features: JsonLines::create(dir.join(FEATURES_FILE))?,
            points: JsonLines::create(dir.join(POINTS_FILE))?,
            errors: JsonLines::create(dir.join(ERRORS_FILE))?,
        })
    }
}

impl SinkSet<MemorySink> {
    /// Three in-memory sinks, for tests and embedding callers
    pub fn buffered() -> Self {
        SinkSet {
            features: MemorySink::default(),
            points: MemorySink::default(),
            errors: MemorySink::default(),
        }
    }
}
