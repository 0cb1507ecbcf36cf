use crate::output::{Sink, SinkError};

/// Sink collecting its records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<String>,
    pub finished: bool,
}

impl Sink for MemorySink {
    fn append(&mut self, record: &str) -> Result<(), SinkError> {
        self.records.push(record.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
