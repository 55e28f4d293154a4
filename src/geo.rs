//! "System Information" banner
//!
//! Looks up the public IP of the host and its country and timezone. The banner is
//! decoration only: lookups that fail or time out fall back to the local time alone.

use crate::config::GeoConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const TIME_FORMAT: &str = "%d %b %Y, %I:%M %p";

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoLocation {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub timezone: String,
}

pub struct GeoLocator {
    http: reqwest::Client,
    base_url: String,
    enabled: bool,
}

impl GeoLocator {
    pub fn new(config: &GeoConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build geolocation HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            enabled: config.enabled,
        })
    }

    /// A locator that never leaves the process.
    pub fn disabled() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: String::new(),
            enabled: false,
        }
    }

    pub async fn locate(&self) -> Result<GeoLocation> {
        let ip: IpResponse = self
            .http
            .get(format!("{}/ip.json", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode public IP response")?;

        let location = self
            .http
            .get(format!("{}/ip/geo/{}.json", self.base_url, ip.ip))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode geolocation response")?;

        Ok(location)
    }

    /// Banner text for the current moment.
    pub async fn system_info(&self) -> String {
        let now = Local::now();
        if !self.enabled {
            return format_banner(now, None);
        }

        match self.locate().await {
            Ok(location) => format_banner(now, Some(&location)),
            Err(e) => {
                warn!(error = %e, "Geolocation lookup failed");
                format_banner(now, None)
            }
        }
    }
}

fn format_banner(now: DateTime<Local>, location: Option<&GeoLocation>) -> String {
    let time = now.format(TIME_FORMAT);
    match location {
        Some(location) => format!(
            "System Information: {}, {} (Timezone: {})",
            location.country, time, location.timezone
        ),
        None => format!("System Information: {}", time),
    }
}
