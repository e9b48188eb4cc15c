use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const PLACEHOLDER_BACKEND_URL: &str = "https://your-project.supabase.co";

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub backend: BackendConfig,
    pub funnel: FunnelConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let backend = BackendConfig {
            url: env::var("APP_BACKEND_URL")
                .unwrap_or_else(|_| PLACEHOLDER_BACKEND_URL.to_string()),
            anon_key: env::var("APP_BACKEND_ANON_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        };

        let defaults = FunnelConfig::default();
        let funnel = FunnelConfig {
            auto_advance_delay: millis_var("APP_AUTO_ADVANCE_MS", defaults.auto_advance_delay)?,
            kyc_completion_delay: millis_var(
                "APP_KYC_COMPLETION_MS",
                defaults.kyc_completion_delay,
            )?,
            eligibility_countdown: number_var(
                "APP_ELIGIBILITY_COUNTDOWN",
                defaults.eligibility_countdown,
            )?,
            fee_processing_delay: millis_var(
                "APP_FEE_PROCESSING_MS",
                defaults.fee_processing_delay,
            )?,
            platform_fee_inr: number_var("APP_PLATFORM_FEE_INR", defaults.platform_fee_inr)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            backend,
            funnel,
        })
    }
}

fn number_var(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn millis_var(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Connection details for the hosted database-and-auth platform.
#[derive(Clone)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: Option<String>,
}

impl BackendConfig {
    /// False while the URL is still the template placeholder or no key was provided.
    pub fn is_configured(&self) -> bool {
        self.url != PLACEHOLDER_BACKEND_URL
            && !self.url.trim().is_empty()
            && self.anon_key.is_some()
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Timing and pricing dials for the funnel pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelConfig {
    pub auto_advance_delay: Duration,
    pub kyc_completion_delay: Duration,
    pub eligibility_countdown: u32,
    pub fee_processing_delay: Duration,
    pub platform_fee_inr: u32,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay: Duration::from_millis(1_000),
            kyc_completion_delay: Duration::from_millis(800),
            eligibility_countdown: 3,
            fee_processing_delay: Duration::from_millis(2_000),
            platform_fee_inr: 299,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_BACKEND_URL",
            "APP_BACKEND_ANON_KEY",
            "APP_AUTO_ADVANCE_MS",
            "APP_KYC_COMPLETION_MS",
            "APP_ELIGIBILITY_COUNTDOWN",
            "APP_FEE_PROCESSING_MS",
            "APP_PLATFORM_FEE_INR",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.funnel, FunnelConfig::default());
        assert!(!config.backend.is_configured());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_funnel_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_AUTO_ADVANCE_MS", "250");
        env::set_var("APP_PLATFORM_FEE_INR", "499");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.funnel.auto_advance_delay, Duration::from_millis(250));
        assert_eq!(config.funnel.platform_fee_inr, 499);
        assert_eq!(config.funnel.eligibility_countdown, 3);
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_KYC_COMPLETION_MS", "soon");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key }) => assert_eq!(key, "APP_KYC_COMPLETION_MS"),
            other => panic!("expected invalid number, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn backend_requires_real_url_and_key() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_BACKEND_URL", "https://abc.supabase.co");
        env::set_var("APP_BACKEND_ANON_KEY", "public-anon");
        let config = AppConfig::load().expect("config loads");
        assert!(config.backend.is_configured());
        assert!(!format!("{:?}", config.backend).contains("public-anon"));
        reset_env();
    }
}
