//! HTTP front end
//!
//! Routes:
//! - `GET /` clears the caller's report and renders the empty form
//! - `POST /display` builds a report and renders its first pages
//! - `GET /get_page_data?network=<name|summary>&page=<n>` returns `[rows, pagination_html]`
//! - `GET /download` returns the report as an `.xlsx` attachment
//! - `GET /health` liveness probe

use crate::analyzer::UsageAnalyzer;
use crate::dashboard::DashboardApi;
use crate::display::{render_index, render_pagination, FormValues, IndexView, ReportView};
use crate::error::AppError;
use crate::export::{build_workbook, WORKBOOK_FILE_NAME, XLSX_CONTENT_TYPE};
use crate::geo::GeoLocator;
use crate::models::{UsageReport, UsageTable};
use crate::pagination::paginate;
use crate::session::{session_cookie, session_from_headers, SessionStore};
use crate::timespan::Timespan;
use axum::{
    extract::{Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared handles behind every request
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppContext>,
}

struct AppContext {
    dashboard: Arc<dyn DashboardApi>,
    geo: GeoLocator,
    sessions: SessionStore,
    org_name: String,
}

impl AppState {
    pub fn new(
        dashboard: Arc<dyn DashboardApi>,
        geo: GeoLocator,
        org_name: impl Into<String>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(AppContext {
                dashboard,
                geo,
                sessions: SessionStore::new(session_ttl),
                org_name: org_name.into(),
            }),
        }
    }

    fn report_for(&self, headers: &HeaderMap) -> Result<Arc<UsageReport>, AppError> {
        session_from_headers(headers)
            .and_then(|session| self.inner.sessions.get(&session))
            .ok_or(AppError::NoReport)
    }
}

#[derive(Debug, Deserialize)]
pub struct DisplayForm {
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub time_period: String,
    #[serde(rename = "custom-interval", default)]
    pub custom_interval: Option<String>,
}

impl DisplayForm {
    fn values(&self) -> FormValues {
        FormValues {
            mac_address: self.mac_address.clone(),
            time_period: self.time_period.clone(),
            custom_interval: self.custom_interval.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub network: String,
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/display", post(display))
        .route("/get_page_data", get(page_data))
        .route("/download", get(download))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
}

fn page(status: StatusCode, session: &Uuid, view: &IndexView) -> Response {
    (
        status,
        [(SET_COOKIE, session_cookie(session))],
        Html(render_index(view)),
    )
        .into_response()
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = session_from_headers(&headers).unwrap_or_else(Uuid::new_v4);
    state.inner.sessions.clear(&session);

    let view = IndexView {
        system_info: state.inner.geo.system_info().await,
        ..IndexView::default()
    };
    page(StatusCode::OK, &session, &view)
}

async fn display(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<DisplayForm>,
) -> Response {
    let session = session_from_headers(&headers).unwrap_or_else(Uuid::new_v4);
    info!(
        mac_address = %form.mac_address,
        time_period = %form.time_period,
        custom_interval = ?form.custom_interval,
        "Submission received"
    );

    let mut view = IndexView {
        system_info: state.inner.geo.system_info().await,
        form: form.values(),
        ..IndexView::default()
    };

    match build_report(&state, &form).await {
        Ok(report) => {
            view.report = Some(ReportView::first_pages(&report));
            state.inner.sessions.insert(session, report);
            page(StatusCode::OK, &session, &view)
        }
        Err(e) => {
            warn!(error = %e, "Report failed");
            // A failed submission leaves no stale report behind
            state.inner.sessions.clear(&session);
            let status = e.status_code();
            view.error = Some(e.to_string());
            page(status, &session, &view)
        }
    }
}

async fn build_report(state: &AppState, form: &DisplayForm) -> Result<UsageReport, AppError> {
    let mac_address = form.mac_address.trim();
    if mac_address.is_empty() {
        return Err(AppError::Input("a client MAC address is required".to_string()));
    }

    let timespan = Timespan::from_form(&form.time_period, form.custom_interval.as_deref())?;
    let analyzer = UsageAnalyzer::new(state.inner.dashboard.as_ref());
    analyzer
        .build_report(&state.inner.org_name, mac_address, timespan)
        .await
}

async fn page_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Json<(UsageTable, String)>, AppError> {
    if query.page == 0 {
        return Err(AppError::Input("page numbers start at 1".to_string()));
    }

    let report = state.report_for(&headers)?;
    let table = report
        .table(&query.network)
        .ok_or_else(|| AppError::UnknownTable(query.network.clone()))?;

    let (rows, pagination) = paginate(table, query.page);
    let controls = render_pagination(&query.network, pagination.as_ref());
    Ok(Json((rows, controls)))
}

async fn download(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let report = state.report_for(&headers)?;
    info!(file = WORKBOOK_FILE_NAME, client_mac = %report.client_mac, "Downloading workbook");

    let bytes = build_workbook(&report)?;
    Ok((
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", WORKBOOK_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}
