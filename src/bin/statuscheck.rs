use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use reqwest::{Client, StatusCode};
use session_fresher::utils::constants::DEFAULT_STATUS_URL;

/// Exit 0 when the status endpoint answers 200, 1 otherwise
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "STATUS_URL", default_value = DEFAULT_STATUS_URL)]
    url: String,
    #[arg(short, long, env = "STATUS_TIMEOUT_SECONDS", default_value_t = 5)]
    timeout_seconds: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    match check(&args).await {
        Ok(StatusCode::OK) => {
            println!("Status check passed. Exiting.");
            ExitCode::SUCCESS
        }
        Ok(status) => {
            eprintln!("Received unexpected status: {}", status);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error calling {}: {:#}", args.url, err);
            ExitCode::FAILURE
        }
    }
}

async fn check(args: &Args) -> Result<StatusCode> {
    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout_seconds))
        .build()?;
    let response = client.get(&args.url).send().await?;
    Ok(response.status())
}
