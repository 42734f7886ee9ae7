use std::io::{self, Write};

use thiserror::Error;

use crate::types::RawRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Downstream consumer of accepted records.
///
/// Within one run the collector guarantees no duplicate identities. Across
/// runs a sink must tolerate re-delivery (upsert by key, or deduplicate
/// downstream): a restarted run re-fetches from the beginning and rebuilds
/// its seen set from scratch.
pub trait RecordSink {
    fn deliver(&mut self, record: &RawRecord) -> Result<(), SinkError>;
}

/// Buffers accepted records in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    records: Vec<RawRecord>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }
}

impl RecordSink for VecSink {
    fn deliver(&mut self, record: &RawRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Writes each accepted record as one JSON line, matching the bulk JSONL
/// artifacts the downstream report builders consume.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W, SinkError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn deliver(&mut self, record: &RawRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn jsonl_sink_writes_one_line_per_record() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.deliver(&json!({"unique_id": "a", "amount": 100}))
            .unwrap();
        sink.deliver(&json!({"unique_id": "b", "amount": 250}))
            .unwrap();

        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: RawRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["unique_id"], "a");
        assert_eq!(first["amount"], 100);
    }

    #[test]
    fn vec_sink_keeps_delivery_order() {
        let mut sink = VecSink::new();
        sink.deliver(&json!({"unique_id": "first"})).unwrap();
        sink.deliver(&json!({"unique_id": "second"})).unwrap();

        let ids: Vec<&str> = sink
            .records()
            .iter()
            .map(|r| r["unique_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
