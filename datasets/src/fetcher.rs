use std::path::PathBuf;

use crate::DatasetError;

/// Request to prepare a named sample from a dataset file.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRequest {
    /// Handle used for later [`SampleFetcher::next_batch`] calls.
    pub name: String,
    pub input_file: PathBuf,
    pub batch_size: usize,
}

impl SampleRequest {
    pub fn new(name: impl Into<String>, input_file: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            name: name.into(),
            input_file: input_file.into(),
            batch_size,
        }
    }
}

/// One minibatch of records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    pub records: Vec<serde_json::Value>,
    /// Set when the batch reached the end of the sample and restarted it.
    pub epoch_wrapped: bool,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Source of training samples.
pub trait SampleFetcher {
    /// Prepares `request` and returns the number of samples in one epoch.
    fn prepare_sample(&mut self, request: &SampleRequest) -> Result<usize, DatasetError>;

    /// Returns the next minibatch of a prepared sample.
    fn next_batch(&mut self, name: &str) -> Result<Batch, DatasetError>;

    /// Releases any resources held for prepared samples.
    fn stop(&mut self) {}
}

impl<T: SampleFetcher + ?Sized> SampleFetcher for Box<T> {
    fn prepare_sample(&mut self, request: &SampleRequest) -> Result<usize, DatasetError> {
        (**self).prepare_sample(request)
    }

    fn next_batch(&mut self, name: &str) -> Result<Batch, DatasetError> {
        (**self).next_batch(name)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}
