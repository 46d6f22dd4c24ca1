//! Sample fetching for training runs: dataset locations, file-backed and
//! synthetic fetchers.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod jsonl;
pub mod synthetic;

pub use config::DatasetConfig;
pub use error::DatasetError;
pub use fetcher::{Batch, SampleFetcher, SampleRequest};
pub use jsonl::JsonlFetcher;
pub use synthetic::SyntheticFetcher;
