//! Persistence contract. The canvas only sees [`DocumentBundle`]s; how they are stored
//! is up to the backend.

use std::fmt;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::document::DocumentBundle;

#[derive(Debug)]
pub enum BackendError {
    Io(std::io::Error),
    Format(serde_json::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Io(err) => write!(f, "{err}"),
            BackendError::Format(err) => write!(f, "malformed document: {err}"),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Io(err) => Some(err),
            BackendError::Format(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err)
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Format(err)
    }
}

pub trait DocumentBackend: Send + Sync {
    fn get_nodes(&self, path: &Path) -> Result<DocumentBundle, BackendError>;
    fn send_nodes(&self, bundle: &DocumentBundle, path: &Path) -> Result<(), BackendError>;
}

/// Stores a bundle as pretty-printed JSON in the wire shape
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFileBackend;

impl DocumentBackend for JsonFileBackend {
    fn get_nodes(&self, path: &Path) -> Result<DocumentBundle, BackendError> {
        let file = fs::File::open(path)?;
        let bundle = serde_json::from_reader(BufReader::new(file))?;
        Ok(bundle)
    }

    fn send_nodes(&self, bundle: &DocumentBundle, path: &Path) -> Result<(), BackendError> {
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, bundle)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
