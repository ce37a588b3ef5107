use clap::Parser;
use log::{error, info};
use s3_upload::{cli::Args, init_logger, open_source, run_upload, S3StorageClient, UploadOutcome};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _logger = match init_logger(args.log_path.as_deref()) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("init logger failed: {}", err);
            None
        }
    };
    let params = args.into_params();
    match serde_json::to_string(&params) {
        Ok(json) => info!("upload params: {}", json),
        Err(err) => error!("serialize params failed: {}", err),
    }

    // nothing touches the network until the source is open
    let body = match open_source(&params.source).await {
        Ok(body) => body,
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match S3StorageClient::from_params(&params) {
        Ok(client) => run_upload(&client, &params, body).await,
        Err(err) => {
            error!("create s3 client failed: {}", err);
            UploadOutcome::Failed {
                message: err.to_string(),
            }
        }
    };
    println!("{}", outcome);
    outcome.exit_code()
}
