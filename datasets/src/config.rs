use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Locations of the training and validation files for a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub data_directory: PathBuf,
    pub train_file: PathBuf,
    pub val_file: PathBuf,
}

impl DatasetConfig {
    pub fn train_path(&self) -> PathBuf {
        self.data_directory.join(&self.train_file)
    }

    pub fn val_path(&self) -> PathBuf {
        self.data_directory.join(&self.val_file)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("data"),
            train_file: PathBuf::from("train.jsonl"),
            val_file: PathBuf::from("val.jsonl"),
        }
    }
}
