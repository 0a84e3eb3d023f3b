use crate::validation::EmailPolicy;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "not-a-secret-change-me";

/// Endpoint and credentials of the transactional email API
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

/// Endpoint and credentials of the WhatsApp template message API
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub api_token: String,
    pub rsvp_template: String,
    pub otp_template: String,
    pub country_code: String,
}

/// One object storage provider for flyer images
#[derive(Debug, Clone)]
pub struct FlyerProviderConfig {
    pub name: &'static str,
    pub upload_url: String,
    pub token: Option<String>,
    /// Base of the public URL, defaults to `upload_url`
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub app_env: String,
    pub email_policy: EmailPolicy,
    pub otp_ttl: Duration,
    pub email: Option<EmailConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
    pub flyer_primary: Option<FlyerProviderConfig>,
    pub flyer_fallback: Option<FlyerProviderConfig>,
    pub flyer_timeout: Duration,
    pub pdf_font_dir: PathBuf,
    pub pdf_font_family: String,
}

/// Reads an optional variable, blank values count as unset
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T, what: &str) -> Result<T, String> {
    match optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("Invalid {key}: must be {what}")),
        None => Ok(default),
    }
}

fn flyer_provider(name: &'static str, prefix: &str) -> Option<FlyerProviderConfig> {
    let upload_url = optional(&format!("{prefix}_URL"))?;
    let upload_url = upload_url.trim_end_matches('/').to_string();
    Some(FlyerProviderConfig {
        name,
        token: optional(&format!("{prefix}_TOKEN")),
        public_url: optional(&format!("{prefix}_PUBLIC_URL"))
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| upload_url.clone()),
        upload_url,
    })
}

impl Config {
    /// Loads the configuration from the environment, `.env` included
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url =
            optional("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set in .env file".to_string())?;

        let jwt_secret = optional("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let email = match (optional("EMAIL_API_URL"), optional("EMAIL_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(EmailConfig {
                api_url,
                api_key,
                from: optional("EMAIL_FROM").unwrap_or_else(|| "no-reply@guestlist.local".to_string()),
            }),
            _ => None,
        };

        let whatsapp = match (optional("WHATSAPP_API_URL"), optional("WHATSAPP_API_TOKEN")) {
            (Some(api_url), Some(api_token)) => Some(WhatsAppConfig {
                api_url,
                api_token,
                rsvp_template: optional("WHATSAPP_RSVP_TEMPLATE")
                    .unwrap_or_else(|| "rsvp_confirmation".to_string()),
                otp_template: optional("WHATSAPP_OTP_TEMPLATE").unwrap_or_else(|| "otp_code".to_string()),
                country_code: optional("WHATSAPP_COUNTRY_CODE").unwrap_or_else(|| "91".to_string()),
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or("SERVER_PORT", 3000, "a number between 0-65535")?,
            max_connections: parse_or("MAX_DB_CONNECTIONS", 5, "a positive number")?,
            app_env: optional("APP_ENV").unwrap_or_else(|| "development".to_string()),
            email_policy: optional("ALLOWED_EMAIL_DOMAINS")
                .map(|v| EmailPolicy::parse(&v))
                .unwrap_or_default(),
            otp_ttl: Duration::from_secs(parse_or("OTP_TTL_SECS", 300, "a number of seconds")?),
            email,
            whatsapp,
            flyer_primary: flyer_provider("primary", "FLYER_PRIMARY"),
            flyer_fallback: flyer_provider("fallback", "FLYER_FALLBACK"),
            flyer_timeout: Duration::from_secs(parse_or(
                "FLYER_UPLOAD_TIMEOUT_SECS",
                10,
                "a number of seconds",
            )?),
            pdf_font_dir: PathBuf::from(optional("PDF_FONT_DIR").unwrap_or_else(|| "./fonts".to_string())),
            pdf_font_family: optional("PDF_FONT_FAMILY").unwrap_or_else(|| "LiberationSans".to_string()),
        })
    }

    /// Configuration with every external integration disabled
    pub fn local(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            max_connections: 5,
            app_env: "test".to_string(),
            email_policy: EmailPolicy::default(),
            otp_ttl: Duration::from_secs(300),
            email: None,
            whatsapp: None,
            flyer_primary: None,
            flyer_fallback: None,
            flyer_timeout: Duration::from_secs(10),
            pdf_font_dir: PathBuf::from("./fonts"),
            pdf_font_family: "LiberationSans".to_string(),
        }
    }

    /// Logs the configuration, secrets hidden
    pub fn print_info(&self) {
        info!("Environment: {}", self.app_env);
        info!("Server Address: {}:{}", self.server_host, self.server_port);
        info!("Database: {}", Self::mask_url(&self.database_url));
        info!("Max DB Connections: {}", self.max_connections);
        info!(
            "Accepted email domains: {}",
            if self.email_policy.allowed_domains().is_empty() {
                "any".to_string()
            } else {
                self.email_policy.allowed_domains().join(", ")
            }
        );
        info!("Email sender: {}", if self.email.is_some() { "enabled" } else { "disabled" });
        info!("WhatsApp sender: {}", if self.whatsapp.is_some() { "enabled" } else { "disabled" });
        info!(
            "Flyer storage: primary {}, fallback {}",
            self.flyer_primary.as_ref().map(|p| p.upload_url.as_str()).unwrap_or("none"),
            self.flyer_fallback.as_ref().map(|p| p.upload_url.as_str()).unwrap_or("none"),
        );
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("JWT Secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("JWT Secret: custom secret configured");
        }
    }

    /// Hides the credentials of a database URL
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        // sqlite urls carry no credentials
        if url.starts_with("sqlite:") {
            return url.to_string();
        }
        "***".to_string()
    }
}
