//! Usage Analysis Engine
//!
//! [`UsageAnalyzer`] drives one report: it resolves the configured organization, lists
//! its networks, asks the dashboard for the client's application usage on each network
//! in turn, and folds the answers into a [`UsageReport`].
//!
//! ## Pipeline
//!
//! 1. **Organization**: exact name match against the organizations the API key can see
//! 2. **Networks**: every network of that organization, in API order
//! 3. **Usage**: one request per network; applications sorted case-insensitively
//! 4. **Aggregation**: per-network tables plus a summary summed across networks
//!
//! ## Failure handling
//!
//! A network that has never seen the client answers "not found"; it is recorded with an
//! empty table and the loop continues. Any other dashboard failure aborts the report and
//! nothing partial is returned.

use crate::dashboard::DashboardApi;
use crate::error::{AppError, DashboardError};
use crate::models::*;
use crate::timespan::Timespan;
use tracing::{info, instrument, warn};

pub struct UsageAnalyzer<'a> {
    api: &'a dyn DashboardApi,
}

impl<'a> UsageAnalyzer<'a> {
    pub fn new(api: &'a dyn DashboardApi) -> Self {
        Self { api }
    }

    /// Build the full report for `client_mac` across every network of `org_name`.
    #[instrument(skip(self, timespan), fields(timespan = %timespan))]
    pub async fn build_report(
        &self,
        org_name: &str,
        client_mac: &str,
        timespan: Timespan,
    ) -> Result<UsageReport, AppError> {
        let networks = self.network_ids(org_name).await?;
        self.application_usage(client_mac, &networks, timespan).await
    }

    /// Networks of the organization named `org_name`.
    pub async fn network_ids(&self, org_name: &str) -> Result<Vec<Network>, AppError> {
        let organizations = self.api.organizations().await?;
        let organization = organizations
            .into_iter()
            .find(|org| org.name == org_name)
            .ok_or_else(|| AppError::OrganizationNotFound(org_name.to_string()))?;

        let networks = self.api.organization_networks(&organization.id).await?;
        info!(
            organization = %organization.name,
            networks = networks.len(),
            "Found network IDs"
        );

        Ok(networks)
    }

    /// Query each network in order and aggregate the results.
    pub async fn application_usage(
        &self,
        client_mac: &str,
        networks: &[Network],
        timespan: Timespan,
    ) -> Result<UsageReport, AppError> {
        let mut report = UsageReport::new(client_mac);

        for network in networks {
            let response = match self
                .api
                .client_application_usage(&network.id, client_mac, timespan.as_secs())
                .await
            {
                Ok(response) => response,
                Err(DashboardError::NotFound(message)) => {
                    warn!(network = %network.name, %message, "Client not found in network");
                    report.networks.push(NetworkUsage {
                        network_name: table_name(&report, network),
                        applications: UsageTable::new(),
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let mut entries: Vec<ApplicationUsageEntry> = response
                .into_iter()
                .flat_map(|client| client.application_usage)
                .collect();
            entries.sort_by_key(|entry| entry.application.to_lowercase());

            info!(
                network = %network.name,
                applications = entries.len(),
                "Found usage data"
            );

            let mut applications = UsageTable::new();
            for entry in &entries {
                applications.accumulate(&entry.application, entry.usage());
                report.summary.accumulate(&entry.application, entry.usage());
            }

            report.networks.push(NetworkUsage {
                network_name: table_name(&report, network),
                applications,
            });
        }

        Ok(report)
    }
}

/// Table names are unique within a report; a repeated network name gets its id appended.
fn table_name(report: &UsageReport, network: &Network) -> String {
    if report
        .networks
        .iter()
        .any(|existing| existing.network_name == network.name)
    {
        format!("{} ({})", network.name, network.id)
    } else {
        network.name.clone()
    }
}
