//! Error taxonomy of the generation pipeline
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Inconsistent user choices (model source, generation mode, output
    /// settings), detected before any sampling.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required model file is missing or cannot be parsed.
    #[error("Model file error ({}): {reason}", path.display())]
    ModelFile { path: PathBuf, reason: String },

    /// The model could not produce a new accepted sequence within the
    /// configured number of attempts.
    #[error(
        "Generation error: no new sequence accepted after {attempts} attempts \
         ({accepted} sequences accepted so far), the model parameters are probably degenerate"
    )]
    Generation { attempts: usize, accepted: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn model_file(path: &Path, err: anyhow::Error) -> Error {
        Error::ModelFile {
            path: path.to_path_buf(),
            reason: format!("{:#}", err),
        }
    }

    pub fn missing_file(path: &Path) -> Error {
        Error::ModelFile {
            path: path.to_path_buf(),
            reason: "cannot find the file".to_string(),
        }
    }
}

/// Check that a model file exists before trying to read it
pub fn check_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::missing_file(path))
    }
}
