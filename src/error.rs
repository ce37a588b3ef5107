use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read input failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    S3(#[from] s3::error::S3Error),

    #[error("load credentials failed: {0}")]
    Credentials(String),

    #[error("invalid region: {0}")]
    Region(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("client is bound to bucket {expected}, request targets {actual}")]
    BucketMismatch { expected: String, actual: String },

    #[error("unexpected status code: {code}")]
    UnexpectedStatus { code: u16 },

    #[error("input needs more than {max} parts, increase the part size")]
    TooManyParts { max: u64 },
}

pub type Result<T> = std::result::Result<T, UploadError>;
