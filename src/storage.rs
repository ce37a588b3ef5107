use crate::basic::{self, UploadParams};
use crate::error::{Result, UploadError};
use crate::upload::{StorageClient, UploadRequest};
use async_trait::async_trait;
use http::{HeaderName, HeaderValue};
use log::{info, warn};
use s3::{serde_types::Part, Bucket};
use tokio::io::{AsyncRead, AsyncReadExt};

pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024 * 5;
const MAX_CHUNK_COUNT: u64 = 10000;
const BYTES_PER_MB: u64 = 1024 * 1024;

pub fn part_size_bytes(part_size_mb: u64) -> u64 {
    part_size_mb.saturating_mul(BYTES_PER_MB)
}

/// Reads until `part_size` bytes are buffered or the stream ends.
async fn read_part<R>(reader: &mut R, part_size: u64) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut chunk = Vec::new();
    (&mut *reader).take(part_size).read_to_end(&mut chunk).await?;
    Ok(chunk)
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Headers set on the calls that create the object. Parts and completion
/// don't carry them. Checked here because `Bucket::add_header` panics on
/// anything that isn't a valid header.
fn object_headers(request: &UploadRequest) -> Result<Vec<(String, String)>> {
    let mut headers = vec![("x-amz-acl".to_string(), request.acl.as_str().to_string())];
    let mut metadata: Vec<_> = request.metadata.iter().collect();
    metadata.sort();
    for (key, value) in metadata {
        headers.push((
            format!("x-amz-meta-{}", key.to_ascii_lowercase()),
            value.clone(),
        ));
    }
    for (name, value) in &headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|err| UploadError::InvalidHeader {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        HeaderValue::from_str(value).map_err(|err| UploadError::InvalidHeader {
            name: name.clone(),
            reason: err.to_string(),
        })?;
    }
    Ok(headers)
}

fn check_status(code: u16) -> Result<()> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(UploadError::UnexpectedStatus { code })
    }
}

pub struct S3StorageClient {
    bucket: Box<Bucket>,
    chunk_size: u64,
}

impl S3StorageClient {
    pub fn new(bucket: Box<Bucket>, part_size_mb: Option<u64>) -> Self {
        let chunk_size = part_size_mb
            .map(part_size_bytes)
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        Self { bucket, chunk_size }
    }

    pub fn from_params(params: &UploadParams) -> Result<Self> {
        let bucket = basic::get_s3_bucket(params)?;
        Ok(Self::new(bucket, params.part_size))
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn location(&self, key: &str) -> String {
        format!("{}/{}", self.bucket.url(), encode_key(key))
    }

    fn object_bucket(&self, request: &UploadRequest) -> Result<Box<Bucket>> {
        let mut bucket = self.bucket.clone();
        for (key, value) in object_headers(request)? {
            bucket.add_header(&key, &value);
        }
        Ok(bucket)
    }

    async fn upload_parts(
        &self,
        request: &mut UploadRequest,
        upload_id: &str,
        first_chunk: Vec<u8>,
    ) -> Result<Vec<Part>> {
        let mut parts = Vec::new();
        let mut chunk = first_chunk;
        loop {
            // part numbers start at 1
            let part_number = parts.len() as u64 + 1;
            if part_number > MAX_CHUNK_COUNT {
                return Err(UploadError::TooManyParts {
                    max: MAX_CHUNK_COUNT,
                });
            }
            info!("upload part {}, size: {}", part_number, chunk.len());
            let part = self
                .bucket
                .put_multipart_chunk(
                    chunk,
                    &request.key,
                    part_number as u32,
                    upload_id,
                    &request.content_type,
                )
                .await?;
            parts.push(part);
            chunk = read_part(&mut request.body, self.chunk_size).await?;
            if chunk.is_empty() {
                return Ok(parts);
            }
        }
    }
}

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn upload(&self, mut request: UploadRequest) -> Result<String> {
        if request.bucket != self.bucket.name() {
            return Err(UploadError::BucketMismatch {
                expected: self.bucket.name(),
                actual: request.bucket,
            });
        }
        let object_bucket = self.object_bucket(&request)?;
        let first_chunk = read_part(&mut request.body, self.chunk_size).await?;
        if (first_chunk.len() as u64) < self.chunk_size {
            info!("put object {}, size: {}", request.key, first_chunk.len());
            let response = object_bucket
                .put_object_with_content_type(&request.key, &first_chunk, &request.content_type)
                .await?;
            check_status(response.status_code())?;
            return Ok(self.location(&request.key));
        }

        let initiated = object_bucket
            .initiate_multipart_upload(&request.key, &request.content_type)
            .await?;
        let upload_id = initiated.upload_id;
        info!("multipart upload {} initiated for {}", upload_id, request.key);
        let completed = match self
            .upload_parts(&mut request, &upload_id, first_chunk)
            .await
        {
            Ok(parts) => {
                info!("upload_parts finished, count: {}", parts.len());
                self.bucket
                    .complete_multipart_upload(&request.key, &upload_id, parts)
                    .await
                    .map_err(UploadError::from)
                    .and_then(|response| check_status(response.status_code()))
            }
            Err(err) => Err(err),
        };
        if let Err(err) = completed {
            if let Err(abort_err) = self.bucket.abort_upload(&request.key, &upload_id).await {
                warn!("abort multipart upload {} failed: {}", upload_id, abort_err);
            }
            return Err(err);
        }
        Ok(self.location(&request.key))
    }
}
