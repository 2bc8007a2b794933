use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the triage service and CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub audio: AudioConfig,
    pub transcriber: TranscriberConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("APP_PORT", 3000u16)?;
        let max_upload_mb = parse_var("APP_MAX_UPLOAD_MB", 64usize)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let sample_rate = parse_var("TRIAGE_SAMPLE_RATE", 16_000u32)?;
        if sample_rate == 0 {
            return Err(ConfigError::Invalid {
                key: "TRIAGE_SAMPLE_RATE",
                value: "0".to_string(),
            });
        }
        let max_audio_seconds = parse_var("TRIAGE_MAX_AUDIO_SECONDS", 60u32)?;
        let temp_dir = PathBuf::from(
            env::var("TRIAGE_TEMP_DIR").unwrap_or_else(|_| ".cache".to_string()),
        );
        let model_cache = PathBuf::from(
            env::var("TRIAGE_MODEL_CACHE").unwrap_or_else(|_| ".models".to_string()),
        );

        let command =
            env::var("TRIAGE_TRANSCRIBER_COMMAND").unwrap_or_else(|_| "whisper-cli".to_string());
        let model = env::var("TRIAGE_TRANSCRIBER_MODEL")
            .map(PathBuf::from)
            .unwrap_or_else(|_| model_cache.join("ggml-tiny.bin"));
        let language = env::var("TRIAGE_LANGUAGE")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                max_upload_bytes: max_upload_mb * 1024 * 1024,
            },
            telemetry: TelemetryConfig { log_level },
            audio: AudioConfig {
                sample_rate,
                max_audio_seconds,
                temp_dir,
                model_cache,
            },
            transcriber: TranscriberConfig {
                command,
                model,
                language,
            },
        })
    }

    /// Creates the scratch and model-cache directories if they are missing.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.audio.temp_dir)?;
        fs::create_dir_all(&self.audio.model_cache)?;
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: raw.clone(),
        }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Audio front end settings: target rate, duration cap and scratch space.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub max_audio_seconds: u32,
    pub temp_dir: PathBuf,
    pub model_cache: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            max_audio_seconds: 60,
            temp_dir: PathBuf::from(".cache"),
            model_cache: PathBuf::from(".models"),
        }
    }
}

impl AudioConfig {
    pub fn max_samples(&self) -> usize {
        self.sample_rate as usize * self.max_audio_seconds as usize
    }
}

/// Local speech-to-text command settings.
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    pub command: String,
    pub model: PathBuf,
    pub language: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
