use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_LISTING_URL: &str = "https://www1.hkexnews.hk/app/appindex.html";

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
    pub data_dir: PathBuf,
    pub scrape: ScrapeConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_dir = PathBuf::from(env::var("APP_DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let scrape = ScrapeConfig {
            listing_url: env::var("SCRAPE_URL").unwrap_or_else(|_| DEFAULT_LISTING_URL.to_string()),
            headless: parse_bool("SCRAPE_HEADLESS", true)?,
            page_timeout: Duration::from_secs(parse_number::<u64>("SCRAPE_TIMEOUT_SECS", 30)?),
            settle: Duration::from_millis(parse_number::<u64>("SCRAPE_SETTLE_MS", 2000)?),
            click_attempts: parse_number::<u32>("SCRAPE_CLICK_ATTEMPTS", 2)?,
        };

        Ok(Self {
            environment,
            data_dir,
            scrape,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Settings for driving the listings page in a headless browser.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub listing_url: String,
    pub headless: bool,
    pub page_timeout: Duration,
    pub settle: Duration,
    pub click_attempts: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            headless: true,
            page_timeout: Duration::from_secs(30),
            settle: Duration::from_millis(2000),
            click_attempts: 2,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// SMTP delivery settings. Only the send path needs these, so they are
/// loaded separately from [`AppConfig`].
#[derive(Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub recipients: Vec<String>,
}

impl MailConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = required("SMTP_HOST")?;
        let port = required("SMTP_PORT")?
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber { name: "SMTP_PORT" })?;
        let username = required("SMTP_USER")?;
        let password = required("SMTP_PASS")?;
        let recipients = parse_recipients(&required("EMAIL_TO")?);
        if recipients.is_empty() {
            return Err(ConfigError::MissingVar { name: "EMAIL_TO" });
        }

        let from = env::var("EMAIL_FROM")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| username.clone());

        Ok(Self {
            host,
            port,
            username,
            password,
            from,
            recipients,
        })
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("from", &self.from)
            .field("recipients", &self.recipients)
            .finish_non_exhaustive()
    }
}

pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).unwrap_or_default();
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::MissingVar { name });
    }
    Ok(value.to_string())
}

fn parse_number<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        _ => Ok(default),
    }
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { name }),
        },
        _ => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVar { name: &'static str },
    InvalidNumber { name: &'static str },
    InvalidBool { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar { name } => write!(f, "missing required env var: {name}"),
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a non-negative integer")
            }
            ConfigError::InvalidBool { name } => {
                write!(f, "{name} must be one of true/false/1/0/yes/no")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    use std::sync::{Mutex, OnceLock};
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "APP_ENV",
        "APP_DATA_DIR",
        "APP_LOG_LEVEL",
        "SCRAPE_URL",
        "SCRAPE_HEADLESS",
        "SCRAPE_TIMEOUT_SECS",
        "SCRAPE_SETTLE_MS",
        "SCRAPE_CLICK_ATTEMPTS",
        "SMTP_HOST",
        "SMTP_PORT",
        "SMTP_USER",
        "SMTP_PASS",
        "EMAIL_TO",
        "EMAIL_FROM",
    ];

    fn reset_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn set_mail_env() {
        env::set_var("SMTP_HOST", "smtp.example.com");
        env::set_var("SMTP_PORT", "587");
        env::set_var("SMTP_USER", "bot@example.com");
        env::set_var("SMTP_PASS", "secret");
        env::set_var("EMAIL_TO", "a@example.com, ,b@example.com");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.scrape.listing_url, DEFAULT_LISTING_URL);
        assert!(config.scrape.headless);
        assert_eq!(config.scrape.page_timeout, Duration::from_secs(30));
        assert_eq!(config.scrape.click_attempts, 2);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn rejects_malformed_scrape_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCRAPE_TIMEOUT_SECS", "soon");
        let err = AppConfig::load().expect_err("timeout must be numeric");
        assert!(err.to_string().contains("SCRAPE_TIMEOUT_SECS"));

        reset_env();
        env::set_var("SCRAPE_HEADLESS", "maybe");
        let err = AppConfig::load().expect_err("headless must be boolean");
        assert!(matches!(err, ConfigError::InvalidBool { name: "SCRAPE_HEADLESS" }));
        reset_env();
    }

    #[test]
    fn click_attempts_out_of_range_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCRAPE_CLICK_ATTEMPTS", "4294967296");
        let err = AppConfig::load().expect_err("click attempts must fit in u32");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                name: "SCRAPE_CLICK_ATTEMPTS"
            }
        ));

        env::set_var("SCRAPE_CLICK_ATTEMPTS", "5");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.scrape.click_attempts, 5);
        reset_env();
    }

    #[test]
    fn mail_config_defaults_sender_to_smtp_user() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_mail_env();
        let config = MailConfig::load().expect("mail config loads");
        assert_eq!(config.port, 587);
        assert_eq!(config.from, "bot@example.com");
        assert_eq!(config.recipients, vec!["a@example.com", "b@example.com"]);
        assert!(!format!("{config:?}").contains("secret"));

        env::set_var("EMAIL_FROM", "  digest@example.com ");
        let config = MailConfig::load().expect("mail config loads");
        assert_eq!(config.from, "digest@example.com");
        reset_env();
    }

    #[test]
    fn mail_config_treats_blank_values_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_mail_env();
        env::set_var("SMTP_PASS", "   ");
        let err = MailConfig::load().expect_err("blank password rejected");
        assert_eq!(err.to_string(), "missing required env var: SMTP_PASS");

        set_mail_env();
        env::set_var("EMAIL_TO", " , ");
        let err = MailConfig::load().expect_err("no recipients rejected");
        assert!(matches!(err, ConfigError::MissingVar { name: "EMAIL_TO" }));
        reset_env();
    }
}
