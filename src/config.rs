use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub push: PushConfig,
    pub alert: AlertConfig,
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub api_url: String,
    pub server_key: String,
}

#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Shared secret the alert ingress signature is verified against.
    pub ingress_secret: String,
    /// Base URL the push notification links back to.
    pub app_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a number")?,
            push: PushConfig {
                api_url: env::var("FCM_API_URL")
                    .context("FCM_API_URL must be set in the environment or .env file")?,
                server_key: env::var("FCM_SERVER_KEY")
                    .context("FCM_SERVER_KEY must be set in the environment or .env file")?,
            },
            alert: AlertConfig {
                ingress_secret: env::var("ALERT_INGRESS_SECRET")
                    .context("ALERT_INGRESS_SECRET must be set in the environment or .env file")?,
                app_base_url: env::var("APP_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            },
        })
    }
}
