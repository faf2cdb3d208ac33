//! Submit a repository and follow its job until the video is ready.
//!
//! Usage: `starvid-submit <owner> <repo> [dark|light]`

use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use starvid_client::{ApiClient, PollerConfig, StatusPoller};
use starvid_models::{JobStatus, SubmitStarsRequest, Theme};

const USAGE: &str = "usage: starvid-submit <owner> <repo> [dark|light]";

fn parse_args(args: &[String]) -> Result<SubmitStarsRequest, String> {
    let (owner, repo, theme) = match args {
        [owner, repo] => (owner, repo, Theme::default()),
        [owner, repo, theme] => (owner, repo, theme.parse::<Theme>()?),
        _ => return Err(USAGE.to_string()),
    };
    let request = SubmitStarsRequest::new(owner.as_str(), repo.as_str(), theme);
    request.check()?;
    Ok(request)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = rustls::crypto::ring::default_provider().install_default();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = match parse_args(&args) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    let config = PollerConfig::from_env();
    let client = match ApiClient::new(&config.api_url) {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let submitted = match client.submit(&request).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("submission failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("job {} submitted", submitted.job_id);

    let poller = StatusPoller::new(client, &config);
    let mut last_status = None;
    let result = poller
        .poll(&submitted.job_id, |record| {
            if last_status != Some(record.status) {
                println!("status: {}", record.status);
                last_status = Some(record.status);
            }
        })
        .await;

    match result {
        Ok(record) if record.status == JobStatus::Completed => {
            let url = record.video_url.unwrap_or_default();
            println!("video: {}{}", config.api_url.trim_end_matches('/'), url);
            ExitCode::SUCCESS
        }
        Ok(record) => {
            eprintln!("job failed: {}", record.error.unwrap_or_default());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("polling stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let request = parse_args(&args(&["octocat", "Hello-World"])).unwrap();
        assert_eq!(request.theme, Theme::Dark);

        let request = parse_args(&args(&["octocat", "Hello-World", "light"])).unwrap();
        assert_eq!(request.theme, Theme::Light);

        assert!(parse_args(&args(&["octocat"])).is_err());
        assert!(parse_args(&args(&["octocat", "r", "sepia"])).is_err());
        assert!(parse_args(&args(&["", "r"])).is_err());
    }
}
