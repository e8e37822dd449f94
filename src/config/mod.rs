//! Configuration management for the mail relay
//!
//! Everything is read once at startup from the process environment (after
//! `.env` has been loaded) and shared read-only for the life of the process.

use crate::domain::is_valid_email;
use anyhow::{bail, Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// SMTP relay configuration
    pub relay: RelayConfig,
    /// Contact form behaviour
    pub form: FormConfig,
    /// Cross-origin settings for browser-submitted forms
    pub cors: CorsConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

/// SMTP relay connection settings
#[derive(Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Account identifier used for AUTH
    pub username: String,
    /// App-specific password, not the account login password
    pub password: String,
    /// Envelope and From address; defaults to the account identifier
    pub from_email: String,
    /// Where submissions are delivered; defaults to the sending account
    pub to_email: String,
    /// Connect and IO timeout for a single SMTP session
    pub timeout_secs: u64,
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Which form shape the relay accepts.
///
/// - `Strict`: name, a valid email and a message are all required, and the
///   delivered body is the contact-form template.
/// - `Minimal`: only the message is required and it is delivered verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Strict,
    Minimal,
}

impl FromStr for FormMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "minimal" => Ok(Self::Minimal),
            other => bail!("Unknown FORM_MODE '{}', expected 'strict' or 'minimal'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormConfig {
    pub mode: FormMode,
    /// Hidden field that legitimate submissions leave empty
    pub honeypot_field: String,
    /// Tag prepended to every subject, may be empty
    pub subject_prefix: String,
    /// Subject used when the submitter leaves it blank
    pub default_subject: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            mode: FormMode::Strict,
            honeypot_field: "company".to_string(),
            subject_prefix: "[Contact] ".to_string(),
            default_subject: "Website contact".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Allowed origins; empty means any origin
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "pretty" or "json"
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = get("SMTP_USER")
            .or_else(|| get("GMAIL_USER"))
            .context("SMTP_USER (or GMAIL_USER) is required")?;
        let password = get("SMTP_PASSWORD")
            .or_else(|| get("GMAIL_APP_PASSWORD"))
            .context("SMTP_PASSWORD (or GMAIL_APP_PASSWORD) is required")?;
        let from_email = get("FROM_EMAIL").unwrap_or_else(|| username.clone());
        let to_email = get("TO_EMAIL").unwrap_or_else(|| from_email.clone());

        check_relay_address("Relay sender address", &from_email)?;
        check_relay_address("TO_EMAIL", &to_email)?;

        let relay = RelayConfig {
            host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: get("SMTP_PORT")
                .unwrap_or_else(|| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            username,
            password,
            from_email,
            to_email,
            timeout_secs: get("SMTP_TIMEOUT_SECS")
                .unwrap_or_else(|| "20".to_string())
                .parse()
                .context("Invalid SMTP_TIMEOUT_SECS")?,
        };

        let defaults = FormConfig::default();
        let form = FormConfig {
            mode: match get("FORM_MODE") {
                Some(mode) => mode.parse()?,
                None => FormMode::Strict,
            },
            honeypot_field: get("HONEYPOT_FIELD")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.honeypot_field),
            // A prefix may deliberately end in whitespace, so only the
            // empty-string check from `get` applies.
            subject_prefix: lookup("SUBJECT_PREFIX").unwrap_or(defaults.subject_prefix),
            default_subject: get("DEFAULT_SUBJECT").unwrap_or(defaults.default_subject),
        };

        let cors = CorsConfig {
            allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty() && s != "*")
                        .collect()
                })
                .unwrap_or_default(),
        };

        let telemetry = TelemetryConfig {
            log_format: get("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            metrics_enabled: get("METRICS_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        };

        Ok(Self {
            http_host: get("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            http_port: get("HTTP_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            relay,
            form,
            cors,
            telemetry,
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Relay addresses must survive the same parser the SMTP client uses at send
/// time, not only the form-level shape check.
fn check_relay_address(label: &str, value: &str) -> Result<()> {
    if !is_valid_email(value) {
        bail!("{} '{}' is not a valid email", label, value);
    }
    value
        .parse::<lettre::Address>()
        .with_context(|| format!("{} '{}' is not a usable mailbox", label, value))?;
    Ok(())
}
