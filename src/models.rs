//! Core Data Models
//!
//! This module defines the data structures that flow from the dashboard API into the
//! rendered report.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`Organization`], [`Network`], [`ClientApplicationUsage`] - records
//!    decoded from dashboard API responses
//! 2. **Aggregation**: [`UsageTable`] - ordered application → [`ApplicationUsage`] mapping,
//!    built per network and summed across networks
//! 3. **Report**: [`UsageReport`] - the summary plus one [`NetworkUsage`] per network for a
//!    single client
//!
//! ## Features
//!
//! - **Insertion order**: tables keep the order in which applications were first added,
//!   so the per-network alphabetical ordering survives pagination and export
//! - **Structured counts**: received/sent are named fields instead of positional pairs,
//!   while the JSON form stays `[received, sent]` for the browser

use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::ops::AddAssign;

/// Kilobytes received and sent by one application.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApplicationUsage {
    pub received: f64,
    pub sent: f64,
}

impl ApplicationUsage {
    pub fn new(received: f64, sent: f64) -> Self {
        Self { received, sent }
    }
}

impl AddAssign for ApplicationUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.received += rhs.received;
        self.sent += rhs.sent;
    }
}

impl Serialize for ApplicationUsage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.received)?;
        pair.serialize_element(&self.sent)?;
        pair.end()
    }
}

/// Ordered application name → usage mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageTable {
    entries: Vec<(String, ApplicationUsage)>,
    index: HashMap<String, usize>,
}

impl UsageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `usage` under `name`, or add it to the existing entry.
    pub fn accumulate(&mut self, name: &str, usage: ApplicationUsage) {
        match self.index.get(name) {
            Some(&position) => self.entries[position].1 += usage,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), usage));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ApplicationUsage> {
        self.index.get(name).map(|&position| &self.entries[position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ApplicationUsage)> {
        self.entries.iter().map(|(name, usage)| (name.as_str(), usage))
    }

    /// Entries at positions `start..start + len`, in order.
    pub fn slice(&self, start: usize, len: usize) -> UsageTable {
        self.entries
            .iter()
            .skip(start)
            .take(len)
            .map(|(name, usage)| (name.clone(), *usage))
            .collect()
    }
}

impl FromIterator<(String, ApplicationUsage)> for UsageTable {
    fn from_iter<I: IntoIterator<Item = (String, ApplicationUsage)>>(iter: I) -> Self {
        let mut table = UsageTable::new();
        for (name, usage) in iter {
            table.accumulate(&name, usage);
        }
        table
    }
}

impl Serialize for UsageTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, usage) in &self.entries {
            map.serialize_entry(name, usage)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkUsage {
    pub network_name: String,
    pub applications: UsageTable,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub client_mac: String,
    pub summary: UsageTable,
    pub networks: Vec<NetworkUsage>,
}

impl UsageReport {
    pub fn new(client_mac: impl Into<String>) -> Self {
        Self {
            client_mac: client_mac.into(),
            summary: UsageTable::new(),
            networks: Vec::new(),
        }
    }

    /// Network names sorted case-insensitively, the order tables and sheets are shown in.
    pub fn sorted_network_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .networks
            .iter()
            .map(|network| network.network_name.as_str())
            .collect();
        names.sort_by_key(|name| name.to_lowercase());
        names
    }

    /// Look up a table by name; `"summary"` selects the cross-network summary.
    pub fn table(&self, name: &str) -> Option<&UsageTable> {
        if name == SUMMARY_TABLE {
            return Some(&self.summary);
        }
        self.networks
            .iter()
            .find(|network| network.network_name == name)
            .map(|network| &network.applications)
    }
}

/// Table name the browser uses for the cross-network summary.
pub const SUMMARY_TABLE: &str = "summary";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
}

/// One entry of `GET /networks/{id}/clients/applicationUsage`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientApplicationUsage {
    #[serde(rename = "clientMac", default)]
    pub client_mac: Option<String>,
    #[serde(rename = "applicationUsage", default)]
    pub application_usage: Vec<ApplicationUsageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationUsageEntry {
    pub application: String,
    #[serde(default)]
    pub received: f64,
    #[serde(default)]
    pub sent: f64,
}

impl ApplicationUsageEntry {
    pub fn usage(&self) -> ApplicationUsage {
        ApplicationUsage::new(self.received, self.sent)
    }
}
