use std::path::PathBuf;

use clap::Parser;
use prompthub_service::PollConfig;
use url::Url;

use crate::app::AppSettings;

#[derive(Debug, Parser)]
#[command(name = "prompthub", about = "Browse and request shared prompts")]
pub struct Config {
    /// Base URL of the prompt API
    #[arg(long, env = "PROMPTHUB_API_URL")]
    pub api_url: String,

    /// Poll interval in milliseconds
    #[arg(
        long,
        env = "PROMPTHUB_POLL_INTERVAL_MS",
        default_value = "1000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Longest delay between polls while the API keeps failing (milliseconds)
    #[arg(
        long,
        env = "PROMPTHUB_MAX_BACKOFF_MS",
        default_value = "30000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_backoff_ms: u64,

    /// Public address that shared links point at
    #[arg(long, env = "PROMPTHUB_PUBLIC_URL", default_value = "http://localhost:3000/")]
    pub public_url: Url,

    /// Shared link to open on startup, e.g. http://localhost:3000/?id=42
    #[arg(long)]
    pub link: Option<Url>,

    /// Where logs go. Defaults to prompthub.log in the temp directory.
    #[arg(long, env = "PROMPTHUB_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("prompthub.log"))
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            poll: PollConfig::from_millis(self.poll_interval_ms, self.max_backoff_ms),
            start_location: self.link.clone().unwrap_or_else(|| self.public_url.clone()),
        }
    }
}
