use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::output::{Sink, SinkError};

/// A file of newline separated json records
///
/// Writes are buffered; nothing is guaranteed to hit the disk before
/// [finish](Sink::finish).
#[derive(Debug)]
pub struct JsonLines {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLines {
    pub fn create(path: PathBuf) -> Result<Self, SinkError> {
        let file = File::create(&path).map_err(|source| SinkError::Create {
            source,
            path: path.clone(),
        })?;
        Ok(JsonLines {
            writer: BufWriter::new(file),
            path,
        })
    }
}

impl Sink for JsonLines {
    fn append(&mut self, record: &str) -> Result<(), SinkError> {
        writeln!(self.writer, "{record}").map_err(|source| SinkError::Append {
            source,
            path: self.path.clone(),
        })
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(|source| SinkError::Flush {
            source,
            path: self.path.clone(),
        })
    }
}
