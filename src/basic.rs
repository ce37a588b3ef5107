use crate::error::{Result, UploadError};
use clap::ValueEnum;
use s3::{creds::Credentials, region::Region, Bucket};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, path::PathBuf, str::FromStr};

pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";
pub const DEFAULT_PART_SIZE_MB: u64 = 64;
/// S3 rejects non-final parts below 5 MiB.
pub const MIN_PART_SIZE_MB: u64 = 5;
pub const STDIN_SOURCE: &str = "-";

/// Canned ACLs accepted by the `x-amz-acl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
    AwsExecRead,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
    LogDeliveryWrite,
}

impl CannedAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AwsExecRead => "aws-exec-read",
            CannedAcl::AuthenticatedRead => "authenticated-read",
            CannedAcl::BucketOwnerRead => "bucket-owner-read",
            CannedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
            CannedAcl::LogDeliveryWrite => "log-delivery-write",
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the bytes to upload come from: `-` reads stdin, anything else is a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Stdin,
    Path(PathBuf),
}

impl FromStr for Source {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == STDIN_SOURCE {
            Ok(Source::Stdin)
        } else {
            Ok(Source::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => f.write_str(STDIN_SOURCE),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadParams {
    pub acl: CannedAcl,
    pub content_type: String,
    /// Part size in megabytes, `None` leaves the client default in place.
    pub part_size: Option<u64>,
    pub region: String,
    pub bucket: String,
    pub source: Source,
    pub target: String,
    pub endpoint: Option<String>,
    pub path_style: bool,
    pub access_key_id: Option<String>,
    #[serde(skip_serializing, default)]
    pub secret_access_key: Option<String>,
    #[serde(skip_serializing, default)]
    pub session_token: Option<String>,
}

impl UploadParams {
    pub fn new(region: &str, bucket: &str, source: Source, target: &str) -> Self {
        Self {
            acl: CannedAcl::default(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            part_size: None,
            region: region.to_string(),
            bucket: bucket.to_string(),
            source,
            target: target.to_string(),
            endpoint: None,
            path_style: false,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

fn get_region(params: &UploadParams) -> Result<Region> {
    match &params.endpoint {
        Some(endpoint) => Ok(Region::Custom {
            region: params.region.clone(),
            endpoint: endpoint.clone(),
        }),
        None => params
            .region
            .parse::<Region>()
            .map_err(|err| UploadError::Region(format!("{}: {}", params.region, err))),
    }
}

fn get_credentials(params: &UploadParams) -> Result<Credentials> {
    let credentials = match (&params.access_key_id, &params.secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) => Credentials::new(
            Some(access_key_id.as_str()),
            Some(secret_access_key.as_str()),
            None,
            params.session_token.as_deref(),
            None,
        ),
        _ => Credentials::default(),
    };
    credentials.map_err(|err| UploadError::Credentials(err.to_string()))
}

pub fn get_s3_bucket(params: &UploadParams) -> Result<Box<Bucket>> {
    let region = get_region(params)?;
    let credentials = get_credentials(params)?;
    let mut bucket = Bucket::new(&params.bucket, region, credentials)?;
    if params.path_style {
        bucket.set_path_style();
    }
    Ok(bucket)
}
