//! Error taxonomy
//!
//! [`DashboardError`] describes what went wrong while talking to the dashboard API.
//! [`AppError`] is what request handlers see; each variant maps to an HTTP status and a
//! message that can be shown to the person who submitted the form.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The dashboard reported that the requested entity does not exist
    /// (for usage lookups: the client was never seen on that network).
    #[error("{0}")]
    NotFound(String),

    #[error("dashboard API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("dashboard request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected dashboard response: {0}")]
    Decode(String),
}

impl DashboardError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DashboardError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Dashboard API error: {0}")]
    Upstream(#[from] DashboardError),

    #[error("Organization '{0}' was not found in the dashboard")]
    OrganizationNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No usage report is available; submit a client MAC address first")]
    NoReport,

    #[error("No table named '{0}' in the current report")]
    UnknownTable(String),

    #[error("Failed to build spreadsheet: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) | AppError::OrganizationNotFound(_) => StatusCode::BAD_GATEWAY,
            AppError::NoReport | AppError::UnknownTable(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
