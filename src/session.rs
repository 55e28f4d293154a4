//! Per-browser report store
//!
//! Each browser carries a random session id in a cookie. The most recent report built
//! for that session is kept here until the index page is reloaded, a new report replaces
//! it, or the session goes idle past its lifetime.

use crate::models::UsageReport;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "app_usage_session";

struct StoredReport {
    report: Arc<UsageReport>,
    touched: Instant,
}

pub struct SessionStore {
    reports: DashMap<Uuid, StoredReport>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            reports: DashMap::new(),
            ttl,
        }
    }

    pub fn insert(&self, session: Uuid, report: UsageReport) {
        self.prune_expired();
        self.reports.insert(
            session,
            StoredReport {
                report: Arc::new(report),
                touched: Instant::now(),
            },
        );
    }

    pub fn get(&self, session: &Uuid) -> Option<Arc<UsageReport>> {
        let mut entry = self.reports.get_mut(session)?;
        if entry.touched.elapsed() > self.ttl {
            drop(entry);
            self.reports.remove(session);
            return None;
        }
        entry.touched = Instant::now();
        Some(Arc::clone(&entry.report))
    }

    pub fn clear(&self, session: &Uuid) {
        self.reports.remove(session);
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    fn prune_expired(&self) {
        let before = self.reports.len();
        self.reports.retain(|_, stored| stored.touched.elapsed() <= self.ttl);
        let pruned = before.saturating_sub(self.reports.len());
        if pruned > 0 {
            debug!(pruned, "Dropped expired session reports");
        }
    }
}

/// Session id from the request's cookies, if it carries a well-formed one.
pub fn session_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value binding the browser to `session`.
pub fn session_cookie(session: &Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session)
}
