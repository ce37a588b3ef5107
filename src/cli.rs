use crate::basic::{
    CannedAcl, Source, UploadParams, DEFAULT_CONTENT_TYPE, DEFAULT_PART_SIZE_MB, MIN_PART_SIZE_MB,
};
use clap::Parser;
use std::path::PathBuf;

/// Upload a file or stdin to an s3 bucket
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The canned ACL to use
    #[arg(long, value_enum, default_value_t = CannedAcl::Private)]
    pub acl: CannedAcl,
    /// The content type to assign this object
    #[arg(long, default_value = DEFAULT_CONTENT_TYPE, value_parser = parse_content_type)]
    pub content_type: String,
    /// Size of each multipart part in megabytes, at least 5
    #[arg(long, default_value_t = DEFAULT_PART_SIZE_MB, value_parser = clap::value_parser!(u64).range(MIN_PART_SIZE_MB..))]
    pub part_size: u64,
    /// The region to use
    #[arg(long)]
    pub region: String,
    /// The bucket to upload into
    #[arg(long)]
    pub bucket: String,
    /// Custom endpoint for s3 compatible services
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Address the bucket as a path instead of a subdomain
    #[arg(long)]
    pub path_style: bool,
    /// Static access key id, the default credential chain is used when unset
    #[arg(long, requires = "secret_access_key")]
    pub access_key_id: Option<String>,
    /// Secret access key for `--access-key-id`
    #[arg(long, requires = "access_key_id")]
    pub secret_access_key: Option<String>,
    /// Session token for temporary credentials
    #[arg(long, requires = "access_key_id")]
    pub session_token: Option<String>,
    /// Directory for log files, logs go to stderr when unset
    #[arg(long)]
    pub log_path: Option<PathBuf>,
    /// The file to upload, `-` reads stdin
    pub source: Source,
    /// The name of the object
    pub target: String,
}

impl Args {
    pub fn into_params(self) -> UploadParams {
        UploadParams {
            acl: self.acl,
            content_type: self.content_type,
            part_size: Some(self.part_size),
            region: self.region,
            bucket: self.bucket,
            source: self.source,
            target: self.target,
            endpoint: self.endpoint,
            path_style: self.path_style,
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
            session_token: self.session_token,
        }
    }
}

// the value ends up in a header, so it has to be a valid header value
fn parse_content_type(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err("content type must not be empty".to_string());
    }
    if !value.bytes().all(|b| b == b' ' || b.is_ascii_graphic()) {
        return Err(format!("invalid content type: {:?}", value));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    const REQUIRED: [&str; 7] = [
        "s3-upload",
        "--region",
        "us-east-1",
        "--bucket",
        "mybucket",
        "file.txt",
        "remote/file.txt",
    ];

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec![REQUIRED[0]];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&REQUIRED[1..]);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let params = parse(&[]).unwrap().into_params();
        assert_eq!(params.acl, CannedAcl::Private);
        assert_eq!(params.content_type, "binary/octet-stream");
        assert_eq!(params.part_size, Some(64));
        assert_eq!(params.region, "us-east-1");
        assert_eq!(params.bucket, "mybucket");
        assert_eq!(params.source, Source::Path(PathBuf::from("file.txt")));
        assert_eq!(params.target, "remote/file.txt");
        assert_eq!(params.endpoint, None);
        assert!(!params.path_style);
    }

    #[test]
    fn test_all_flags() {
        let params = parse(&[
            "--acl",
            "bucket-owner-full-control",
            "--content-type",
            "text/plain; charset=utf-8",
            "--part-size",
            "5",
            "--endpoint",
            "http://127.0.0.1:9000",
            "--path-style",
            "--access-key-id",
            "AKID",
            "--secret-access-key",
            "SECRET",
        ])
        .unwrap()
        .into_params();
        assert_eq!(params.acl, CannedAcl::BucketOwnerFullControl);
        assert_eq!(params.content_type, "text/plain; charset=utf-8");
        assert_eq!(params.part_size, Some(5));
        assert_eq!(params.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert!(params.path_style);
        assert_eq!(params.access_key_id.as_deref(), Some("AKID"));
        assert_eq!(params.secret_access_key.as_deref(), Some("SECRET"));
    }

    #[test]
    fn test_stdin_source() {
        let args = Args::try_parse_from([
            "s3-upload", "--region", "eu-west-1", "--bucket", "b", "-", "key",
        ])
        .unwrap();
        assert_eq!(args.source, Source::Stdin);
    }

    #[test]
    fn test_every_canned_acl_accepted() {
        for acl in [
            "private",
            "public-read",
            "public-read-write",
            "aws-exec-read",
            "authenticated-read",
            "bucket-owner-read",
            "bucket-owner-full-control",
            "log-delivery-write",
        ] {
            let args = parse(&["--acl", acl]).unwrap();
            assert_eq!(args.acl.as_str(), acl);
        }
    }

    #[test]
    fn test_invalid_acl() {
        let err = parse(&["--acl", "world-writable"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_missing_required() {
        let err = Args::try_parse_from(["s3-upload", "--bucket", "b", "file.txt", "key"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Args::try_parse_from(["s3-upload", "--region", "r", "file.txt", "key"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Args::try_parse_from(["s3-upload", "--region", "r", "--bucket", "b", "file.txt"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_invalid_part_size() {
        assert_eq!(
            parse(&["--part-size", "0"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["--part-size", "4"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(parse(&["--part-size", "5"]).unwrap().part_size, 5);
        assert_eq!(
            parse(&["--part-size", "big"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert!(parse(&["--part-size", "-1"]).is_err());
    }

    #[test]
    fn test_invalid_content_type() {
        assert!(parse(&["--content-type", ""]).is_err());
        assert!(parse(&["--content-type", "text/plain\n"]).is_err());
        assert!(parse(&["--content-type", "text/plaín"]).is_err());
    }

    #[test]
    fn test_every_flag_has_help() {
        use clap::CommandFactory;
        let command = Args::command();
        for arg in command.get_arguments() {
            if arg.get_id() == "help" || arg.get_id() == "version" {
                continue;
            }
            assert!(arg.get_help().is_some(), "{} has no help", arg.get_id());
        }
    }

    #[test]
    fn test_credentials_come_in_pairs() {
        let err = parse(&["--access-key-id", "AKID"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
