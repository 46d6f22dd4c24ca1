//! Memory-mapped JSON-lines samples.

use std::collections::HashMap;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::{debug, info};

use crate::{Batch, DatasetError, SampleFetcher, SampleRequest};

struct PreparedSample {
    path: PathBuf,
    mmap: Mmap,
    /// 1-based line number and byte range of every non-blank line.
    records: Vec<(usize, Range<usize>)>,
    batch_size: usize,
    cursor: usize,
}

impl PreparedSample {
    fn open(path: &Path, batch_size: usize) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(DatasetError::Empty(path.to_path_buf()));
        }
        let mmap = unsafe { Mmap::map(&file)? };
        let text = std::str::from_utf8(&mmap).map_err(|_| DatasetError::Utf8 {
            path: path.to_path_buf(),
        })?;

        let mut records = Vec::new();
        let mut offset = 0usize;
        for (index, line) in text.split_inclusive('\n').enumerate() {
            if !line.trim().is_empty() {
                records.push((index + 1, offset..offset + line.len()));
            }
            offset += line.len();
        }
        if records.is_empty() {
            return Err(DatasetError::Empty(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            records,
            batch_size,
            cursor: 0,
        })
    }

    fn parse(&self, index: usize) -> Result<serde_json::Value, DatasetError> {
        let (line, range) = &self.records[index];
        serde_json::from_slice(&self.mmap[range.clone()]).map_err(|source| DatasetError::Json {
            path: self.path.clone(),
            line: *line,
            source,
        })
    }

    fn next_batch(&mut self) -> Result<Batch, DatasetError> {
        let mut batch = Batch {
            records: Vec::with_capacity(self.batch_size),
            epoch_wrapped: false,
        };
        for _ in 0..self.batch_size {
            batch.records.push(self.parse(self.cursor)?);
            self.cursor += 1;
            if self.cursor == self.records.len() {
                self.cursor = 0;
                batch.epoch_wrapped = true;
            }
        }
        Ok(batch)
    }
}

/// Fetcher serving records from JSON-lines files, one record per line.
#[derive(Default)]
pub struct JsonlFetcher {
    samples: HashMap<String, PreparedSample>,
}

impl JsonlFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SampleFetcher for JsonlFetcher {
    fn prepare_sample(&mut self, request: &SampleRequest) -> Result<usize, DatasetError> {
        if request.batch_size == 0 {
            return Err(DatasetError::ZeroBatchSize(request.name.clone()));
        }
        let sample = PreparedSample::open(&request.input_file, request.batch_size)?;
        let size = sample.records.len();
        info!(
            sample = %request.name,
            path = %request.input_file.display(),
            size,
            batch_size = request.batch_size,
            "prepared sample"
        );
        self.samples.insert(request.name.clone(), sample);
        Ok(size)
    }

    fn next_batch(&mut self, name: &str) -> Result<Batch, DatasetError> {
        self.samples
            .get_mut(name)
            .ok_or_else(|| DatasetError::UnknownSample(name.to_string()))?
            .next_batch()
    }

    fn stop(&mut self) {
        debug!(samples = self.samples.len(), "releasing prepared samples");
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_records(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn prepare_counts_non_blank_records() {
        let file = write_records(&[r#"{"event": 1}"#, "", r#"{"event": 2}"#, "  ", r#"{"event": 3}"#]);
        let mut fetcher = JsonlFetcher::new();
        let size = fetcher
            .prepare_sample(&SampleRequest::new("primary", file.path(), 2))
            .unwrap();
        assert_eq!(size, 3);
    }

    #[test]
    fn batches_cycle_and_flag_epoch_wrap() {
        let file = write_records(&[r#"{"event": 1}"#, r#"{"event": 2}"#, r#"{"event": 3}"#]);
        let mut fetcher = JsonlFetcher::new();
        fetcher
            .prepare_sample(&SampleRequest::new("primary", file.path(), 2))
            .unwrap();

        let first = fetcher.next_batch("primary").unwrap();
        assert_eq!(first.len(), 2);
        assert!(!first.epoch_wrapped);
        assert_eq!(first.records[1]["event"], 2);

        let second = fetcher.next_batch("primary").unwrap();
        assert!(second.epoch_wrapped);
        assert_eq!(second.records[0]["event"], 3);
        assert_eq!(second.records[1]["event"], 1);
    }

    #[test]
    fn malformed_record_reports_line_number() {
        let file = write_records(&[r#"{"event": 1}"#, "", "not json"]);
        let mut fetcher = JsonlFetcher::new();
        fetcher
            .prepare_sample(&SampleRequest::new("primary", file.path(), 2))
            .unwrap();
        match fetcher.next_batch("primary") {
            Err(DatasetError::Json { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected json error, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_and_unknown_sample_are_errors() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut fetcher = JsonlFetcher::new();
        assert!(matches!(
            fetcher.prepare_sample(&SampleRequest::new("primary", file.path(), 1)),
            Err(DatasetError::Empty(_))
        ));
        assert!(matches!(
            fetcher.next_batch("val"),
            Err(DatasetError::UnknownSample(name)) if name == "val"
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let file = write_records(&[r#"{"event": 1}"#]);
        let mut fetcher = JsonlFetcher::new();
        assert!(matches!(
            fetcher.prepare_sample(&SampleRequest::new("primary", file.path(), 0)),
            Err(DatasetError::ZeroBatchSize(_))
        ));
    }
}
