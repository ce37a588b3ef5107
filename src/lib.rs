//! upload a file or stdin to an s3 bucket
use flexi_logger::{Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle};
use std::path::Path;

pub mod basic;
pub mod cli;
pub mod error;
pub mod storage;
pub mod upload;

pub use basic::{CannedAcl, Source, UploadParams};
pub use error::UploadError;
pub use storage::S3StorageClient;
pub use upload::{open_source, run_upload, StorageClient, UploadOutcome, UploadRequest};

/// init logger
/// logs go to stderr unless `log_path` is set, stdout is kept for the result line
/// keep the returned handle alive until the program exits
pub fn init_logger(log_path: Option<&Path>) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = match log_path {
        Some(log_path) => Logger::try_with_env_or_str("info")?
            .log_to_file(FileSpec::default().directory(log_path).basename("s3-upload"))
            .duplicate_to_stderr(Duplicate::Warn)
            .format(flexi_logger::detailed_format),
        None => Logger::try_with_env_or_str("warn")?,
    };
    logger.start()
}
