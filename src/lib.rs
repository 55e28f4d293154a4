//! Meraki Client App Usage
//!
//! Reports how much traffic each application generated for one client device across
//! every network of a Meraki organization, with a browser UI and a spreadsheet export.
//!
//! ## Core Features
//!
//! - **Cross-network summary**: per-network application tables plus a summary that sums
//!   received and sent kilobytes for each application across networks
//! - **Partial-failure tolerance**: networks that have never seen the client are shown
//!   as empty instead of failing the report
//! - **Paged tables**: ten applications per page, paged in the browser without
//!   re-querying the dashboard
//! - **Spreadsheet export**: the same data as an `.xlsx` workbook, one sheet per table
//! - **Per-session results**: each browser sees only the report it asked for
//!
//! ## Architecture Overview
//!
//! - [`timespan`] - period selector parsing into a reporting window
//! - [`dashboard`] - REST client for the Meraki dashboard API
//! - [`analyzer`] - per-network fetch loop and cross-network aggregation
//! - [`models`] - report data structures
//! - [`pagination`] - fixed-size paging over a table
//! - [`session`] - per-browser report store
//! - [`display`] - HTML rendering
//! - [`export`] - spreadsheet encoding
//! - [`geo`] - system information banner
//! - [`server`] - HTTP routes
//! - [`config`] - configuration with file and environment variable support
//! - [`logging`] - structured logging with JSON and pretty formats
//!
//! ## Example
//!
//! ```rust,no_run
//! use meraki_app_usage::{analyzer::UsageAnalyzer, config::Config, dashboard::MerakiClient, timespan::Timespan};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let client = MerakiClient::new(&config.dashboard)?;
//! let report = UsageAnalyzer::new(&client)
//!     .build_report(&config.dashboard.org_name, "AA:BB:CC:DD:EE:FF", Timespan::parse("24 Hours")?)
//!     .await?;
//! println!("{} applications", report.summary.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod export;
pub mod geo;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod server;
pub mod session;
pub mod timespan;

pub use analyzer::UsageAnalyzer;
pub use error::{AppError, DashboardError};
pub use models::*;
