#![allow(dead_code)]

use async_trait::async_trait;
use meraki_app_usage::dashboard::DashboardApi;
use meraki_app_usage::geo::GeoLocator;
use meraki_app_usage::models::{ApplicationUsageEntry, ClientApplicationUsage, Network, Organization};
use meraki_app_usage::server::{router, AppState};
use meraki_app_usage::DashboardError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const ORG_NAME: &str = "Acme";
pub const CLIENT_MAC: &str = "AA:BB:CC:DD:EE:FF";

pub enum NetworkReply {
    Usage(Vec<(String, f64, f64)>),
    NotFound,
    Failure,
}

/// In-memory dashboard with one organization whose networks answer from a script.
pub struct FakeDashboard {
    networks: Vec<(Network, NetworkReply)>,
    pub usage_calls: Mutex<Vec<(String, String, u64)>>,
}

impl FakeDashboard {
    pub fn new() -> Self {
        Self {
            networks: Vec::new(),
            usage_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn network(mut self, id: &str, name: &str, reply: NetworkReply) -> Self {
        self.networks.push((
            Network {
                id: id.to_string(),
                name: name.to_string(),
            },
            reply,
        ));
        self
    }
}

pub fn apps(entries: &[(&str, f64, f64)]) -> NetworkReply {
    NetworkReply::Usage(
        entries
            .iter()
            .map(|(name, received, sent)| (name.to_string(), *received, *sent))
            .collect(),
    )
}

#[async_trait]
impl DashboardApi for FakeDashboard {
    async fn organizations(&self) -> Result<Vec<Organization>, DashboardError> {
        Ok(vec![
            Organization { id: "100".into(), name: "Other".into() },
            Organization { id: "200".into(), name: ORG_NAME.into() },
        ])
    }

    async fn organization_networks(&self, organization_id: &str) -> Result<Vec<Network>, DashboardError> {
        assert_eq!(organization_id, "200");
        Ok(self.networks.iter().map(|(network, _)| network.clone()).collect())
    }

    async fn client_application_usage(
        &self,
        network_id: &str,
        client_mac: &str,
        timespan_secs: u64,
    ) -> Result<Vec<ClientApplicationUsage>, DashboardError> {
        self.usage_calls.lock().unwrap().push((
            network_id.to_string(),
            client_mac.to_string(),
            timespan_secs,
        ));

        let reply = self
            .networks
            .iter()
            .find(|(network, _)| network.id == network_id)
            .map(|(_, reply)| reply);

        match reply {
            Some(NetworkReply::Usage(entries)) => Ok(vec![ClientApplicationUsage {
                client_mac: Some(client_mac.to_string()),
                application_usage: entries
                    .iter()
                    .map(|(name, received, sent)| ApplicationUsageEntry {
                        application: name.clone(),
                        received: *received,
                        sent: *sent,
                    })
                    .collect(),
            }]),
            Some(NetworkReply::Failure) => Err(DashboardError::Api {
                status: 500,
                message: "Internal server error".into(),
            }),
            Some(NetworkReply::NotFound) | None => {
                Err(DashboardError::NotFound("Client not found".into()))
            }
        }
    }
}

/// Serve the app on an ephemeral port; returns its base URL.
pub async fn spawn_app(api: Arc<dyn DashboardApi>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(api, GeoLocator::disabled(), ORG_NAME, Duration::from_secs(3600));
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

/// `name=value` part of the session cookie set by a response.
pub fn session_cookie(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
        .expect("response should set a session cookie")
}

pub fn many_apps(count: usize) -> NetworkReply {
    NetworkReply::Usage(
        (0..count)
            .map(|i| (format!("App {:02}", i), i as f64, 1.0))
            .collect(),
    )
}

pub fn shared<T: DashboardApi + 'static>(api: T) -> Arc<dyn DashboardApi> {
    Arc::new(api)
}
