//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// framed-avatar: GitHub avatars with themed frames, text and emoji.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "framed-avatar", version, about, long_about = None)]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding `frames/`, `images/fallback.png` and static files.
    #[arg(long, env = "ASSET_ROOT", default_value = "public")]
    pub asset_root: PathBuf,

    /// Where `{identifier}.png` avatars are downloaded from.
    #[arg(long, default_value = "https://github.com")]
    pub avatar_base_url: String,

    /// GitHub REST API root.
    #[arg(long, default_value = "https://api.github.com")]
    pub api_base_url: String,

    /// shields.io root used in badge links.
    #[arg(long, default_value = "https://img.shields.io")]
    pub badge_base_url: String,

    /// Public URL of this service, used in preview links.
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:3000")]
    pub public_base_url: String,

    /// Avatar download timeout for `/api/framed-avatar`.
    #[arg(long, default_value_t = 30)]
    pub avatar_timeout_secs: u64,

    /// Avatar download timeout for `/api/frames`.
    #[arg(long, default_value_t = 10)]
    pub lenient_timeout_secs: u64,

    /// GitHub API timeout.
    #[arg(long, default_value_t = 10)]
    pub api_timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            asset_root: PathBuf::from("public"),
            avatar_base_url: "https://github.com".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            badge_base_url: "https://img.shields.io".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            avatar_timeout_secs: 30,
            lenient_timeout_secs: 10,
            api_timeout_secs: 10,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Host and port in the form accepted by `TcpListener::bind`.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    pub fn avatar_timeout(&self) -> Duration {
        Duration::from_secs(self.avatar_timeout_secs)
    }

    pub fn lenient_timeout(&self) -> Duration {
        Duration::from_secs(self.lenient_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}
