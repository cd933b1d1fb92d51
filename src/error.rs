// Error taxonomy shared by samplers and listeners.

use std::path::PathBuf;

/// Failure of one unit's sample or one listener's stream.
///
/// Never fatal: the scheduler stores the most recent one in its error slot
/// and keeps running.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Opening or reading a kernel/sysfs file failed.
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content did not have the expected shape.
    #[error("parse: {0}")]
    Parse(String),

    /// A required key was not found after the whole input was consumed.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A listener's subprocess could not be started, died, or produced
    /// undecodable output.
    #[error("stream: {0}")]
    Stream(String),

    /// A sampling pass died before reporting (a sampler panicked).
    #[error("aborted: {0}")]
    Aborted(String),
}

impl SourceError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }
}

/// Reads a whole file, mapping I/O failures to [`SourceError::Read`].
pub fn read_to_string(path: &std::path::Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|e| SourceError::read(path, e))
}
