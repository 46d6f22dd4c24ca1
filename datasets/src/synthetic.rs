use std::collections::HashMap;

use tracing::info;

use crate::{Batch, DatasetError, SampleFetcher, SampleRequest};

/// Fetcher that never touches the filesystem. Every prepared sample reports
/// the same size and yields batches of `null` records.
#[derive(Clone, Debug)]
pub struct SyntheticFetcher {
    sample_size: usize,
    cursors: HashMap<String, (usize, usize)>,
}

impl SyntheticFetcher {
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            cursors: HashMap::new(),
        }
    }
}

impl SampleFetcher for SyntheticFetcher {
    fn prepare_sample(&mut self, request: &SampleRequest) -> Result<usize, DatasetError> {
        if request.batch_size == 0 {
            return Err(DatasetError::ZeroBatchSize(request.name.clone()));
        }
        if self.sample_size == 0 {
            return Err(DatasetError::Empty(request.input_file.clone()));
        }
        info!(sample = %request.name, size = self.sample_size, "prepared synthetic sample");
        self.cursors
            .insert(request.name.clone(), (0, request.batch_size));
        Ok(self.sample_size)
    }

    fn next_batch(&mut self, name: &str) -> Result<Batch, DatasetError> {
        let sample_size = self.sample_size;
        let (cursor, batch_size) = self
            .cursors
            .get_mut(name)
            .ok_or_else(|| DatasetError::UnknownSample(name.to_string()))?;
        let advanced = *cursor + *batch_size;
        *cursor = advanced % sample_size;
        Ok(Batch {
            records: vec![serde_json::Value::Null; *batch_size],
            epoch_wrapped: advanced >= sample_size,
        })
    }
}
