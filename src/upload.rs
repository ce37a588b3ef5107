use crate::basic::{CannedAcl, Source, UploadParams};
use crate::error::{Result, UploadError};
use async_trait::async_trait;
use log::{error, info};
use std::{collections::HashMap, fmt, process::ExitCode};
use tokio::io::{AsyncRead, BufReader};

/// Metadata key that mirrors the declared content type.
pub const CONTENT_TYPE_METADATA_KEY: &str = "Content-Type";

pub type InputStream = Box<dyn AsyncRead + Send + Unpin>;

pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
    pub acl: CannedAcl,
    pub body: InputStream,
}

impl UploadRequest {
    pub fn new(params: &UploadParams, body: InputStream) -> Self {
        // readers of either the header or the user metadata see the same value
        let mut metadata = HashMap::new();
        metadata.insert(
            CONTENT_TYPE_METADATA_KEY.to_string(),
            params.content_type.clone(),
        );
        Self {
            bucket: params.bucket.clone(),
            key: params.target.clone(),
            content_type: params.content_type.clone(),
            metadata,
            acl: params.acl,
            body,
        }
    }
}

/// Anything that can store a stream under a key and tell where it ended up.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Returns the location of the stored object.
    async fn upload(&self, request: UploadRequest) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { location: String },
    Failed { message: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Uploaded { location } => write!(f, "Uploaded to {}", location),
            UploadOutcome::Failed { message } => write!(f, "failed to upload file, {}", message),
        }
    }
}

/// Opens the upload source. Must run before any client is created so a
/// missing file never reaches the network.
pub async fn open_source(source: &Source) -> Result<InputStream> {
    match source {
        Source::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
        Source::Path(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| UploadError::Open {
                    path: path.clone(),
                    source,
                })?;
            Ok(Box::new(file))
        }
    }
}

pub async fn run_upload<C>(client: &C, params: &UploadParams, body: InputStream) -> UploadOutcome
where
    C: StorageClient + ?Sized,
{
    let request = UploadRequest::new(params, body);
    info!(
        "upload begin, source: {}, bucket: {}, key: {}, acl: {}",
        params.source, request.bucket, request.key, request.acl
    );
    match client.upload(request).await {
        Ok(location) => {
            info!("upload finished: {}", location);
            UploadOutcome::Uploaded { location }
        }
        Err(err) => {
            error!("upload failed: {}", err);
            UploadOutcome::Failed {
                message: err.to_string(),
            }
        }
    }
}
