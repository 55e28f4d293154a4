//! HTTP route tests against a running router backed by an in-memory dashboard

mod common;

use common::*;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE};
use reqwest::StatusCode;
use serde_json::Value;
use std::io::{Cursor, Read};
use std::sync::Arc;

fn usage_form(mac: &str, period: &str, custom: &str) -> Vec<(&'static str, String)> {
    vec![
        ("mac_address", mac.to_string()),
        ("time_period", period.to_string()),
        ("custom-interval", custom.to_string()),
    ]
}

async fn submit(base: &str, form: &[(&'static str, String)]) -> (reqwest::Response, String) {
    let response = reqwest::Client::new()
        .post(format!("{}/display", base))
        .form(form)
        .send()
        .await
        .unwrap();
    let cookie = session_cookie(&response);
    (response, cookie)
}

async fn page_data(base: &str, cookie: &str, network: &str, page: usize) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{}/get_page_data", base))
        .query(&[("network", network.to_string()), ("page", page.to_string())])
        .header(COOKIE, cookie)
        .send()
        .await
        .unwrap()
}

fn read_zip_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_report_with_missing_network() {
    let api = Arc::new(
        FakeDashboard::new()
            .network("N_1", "Headquarters", apps(&[("Zoom", 10.0, 20.0), ("DNS", 1.0, 2.0), ("Slack", 3.0, 4.0)]))
            .network("N_2", "Lab", NetworkReply::NotFound),
    );
    let base = spawn_app(api.clone()).await;

    let (response, cookie) = submit(&base, &usage_form(CLIENT_MAC, "24 Hours", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Application usage for AA:BB:CC:DD:EE:FF"));
    assert!(html.contains("<h3>Headquarters</h3>"));
    assert!(html.contains("<h3>Lab</h3>"));

    let calls = api.usage_calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            ("N_1".to_string(), CLIENT_MAC.to_string(), 86_400),
            ("N_2".to_string(), CLIENT_MAC.to_string(), 86_400),
        ]
    );

    let summary: Value = page_data(&base, &cookie, "summary", 1).await.json().await.unwrap();
    assert_eq!(summary[0].as_object().unwrap().len(), 3);
    assert_eq!(summary[0]["Zoom"], serde_json::json!([10.0, 20.0]));

    let lab: Value = page_data(&base, &cookie, "Lab", 1).await.json().await.unwrap();
    assert_eq!(lab, serde_json::json!([{}, ""]));

    let hq = page_data(&base, &cookie, "Headquarters", 1).await.text().await.unwrap();
    let dns = hq.find("\"DNS\"").unwrap();
    let slack = hq.find("\"Slack\"").unwrap();
    let zoom = hq.find("\"Zoom\"").unwrap();
    assert!(dns < slack && slack < zoom, "network rows should be alphabetical: {}", hq);
}

#[tokio::test]
async fn test_pages_of_large_table() {
    let api = FakeDashboard::new().network("N_1", "Campus", many_apps(25));
    let base = spawn_app(shared(api)).await;
    let (_, cookie) = submit(&base, &usage_form(CLIENT_MAC, "1 Week", "")).await;

    let first: Value = page_data(&base, &cookie, "summary", 1).await.json().await.unwrap();
    assert_eq!(first[0].as_object().unwrap().len(), 10);
    assert!(first[1].as_str().unwrap().contains("Page 1 of 3"));

    let last: Value = page_data(&base, &cookie, "Campus", 3).await.json().await.unwrap();
    let rows = last[0].as_object().unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.contains_key("App 20"));
    assert!(rows.contains_key("App 24"));

    let again: Value = page_data(&base, &cookie, "Campus", 3).await.json().await.unwrap();
    assert_eq!(last, again);
}

#[tokio::test]
async fn test_invalid_period_is_reported_to_user() {
    let api = Arc::new(FakeDashboard::new().network("N_1", "Campus", many_apps(1)));
    let base = spawn_app(api.clone()).await;

    let (response, _) = submit(&base, &usage_form(CLIENT_MAC, "24 Hours", "soon")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = response.text().await.unwrap();
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("Invalid input"));
    assert!(api.usage_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_discards_report() {
    let api = FakeDashboard::new()
        .network("N_1", "Campus", many_apps(3))
        .network("N_2", "Branch", NetworkReply::Failure);
    let base = spawn_app(shared(api)).await;

    let (response, cookie) = submit(&base, &usage_form(CLIENT_MAC, "", "")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.text().await.unwrap().contains("Dashboard API error"));

    let page = page_data(&base, &cookie, "summary", 1).await;
    assert_eq!(page.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_do_not_share_reports() {
    let api = FakeDashboard::new().network("N_1", "Campus", many_apps(3));
    let base = spawn_app(shared(api)).await;

    let (_, first) = submit(&base, &usage_form(CLIENT_MAC, "24 Hours", "")).await;
    let index = reqwest::get(format!("{}/", base)).await.unwrap();
    let second = session_cookie(&index);
    assert_ne!(first, second);

    assert_eq!(page_data(&base, &first, "summary", 1).await.status(), StatusCode::OK);
    assert_eq!(page_data(&base, &second, "summary", 1).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_index_clears_report() {
    let api = FakeDashboard::new().network("N_1", "Campus", many_apps(3));
    let base = spawn_app(shared(api)).await;
    let (_, cookie) = submit(&base, &usage_form(CLIENT_MAC, "24 Hours", "")).await;

    let index = reqwest::Client::new()
        .get(format!("{}/", base))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    assert!(index.text().await.unwrap().contains("System Information: "));

    assert_eq!(page_data(&base, &cookie, "summary", 1).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_network_and_page_zero() {
    let api = FakeDashboard::new().network("N_1", "Campus", many_apps(3));
    let base = spawn_app(shared(api)).await;
    let (_, cookie) = submit(&base, &usage_form(CLIENT_MAC, "24 Hours", "")).await;

    assert_eq!(page_data(&base, &cookie, "Nowhere", 1).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(page_data(&base, &cookie, "Campus", 0).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pages_past_the_end() {
    let api = FakeDashboard::new().network("N_1", "Campus", many_apps(3));
    let base = spawn_app(shared(api)).await;
    let (_, cookie) = submit(&base, &usage_form(CLIENT_MAC, "24 Hours", "")).await;

    let response = page_data(&base, &cookie, "Campus", 4).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body[0], serde_json::json!({}));
    assert!(body[1].as_str().unwrap().contains("Page 4 of 1"));

    let response = page_data(&base, &cookie, "summary", usize::MAX).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body[0], serde_json::json!({}));
    assert!(body[1]
        .as_str()
        .unwrap()
        .contains(&format!("Page {} of 1", usize::MAX)));
}

#[tokio::test]
async fn test_download_matches_summary() {
    let api = FakeDashboard::new()
        .network("N_1", "Headquarters", apps(&[("Zoom", 10.0, 20.0), ("DNS", 7.0, 8.0)]))
        .network("N_2", "Branch", apps(&[("Zoom", 5.0, 1.0)]));
    let base = spawn_app(shared(api)).await;
    let (_, cookie) = submit(&base, &usage_form(CLIENT_MAC, "24 Hours", "")).await;

    let summary: Value = page_data(&base, &cookie, "summary", 1).await.json().await.unwrap();
    assert_eq!(summary[0]["Zoom"], serde_json::json!([15.0, 21.0]));

    let response = reqwest::Client::new()
        .get(format!("{}/download", base))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(response.headers()[CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("meraki_client_app_usage.xlsx"));

    let bytes = response.bytes().await.unwrap();
    let workbook = read_zip_entry(&bytes, "xl/workbook.xml");
    let summary_at = workbook.find("name=\"Summary\"").unwrap();
    let branch_at = workbook.find("name=\"Branch\"").unwrap();
    let hq_at = workbook.find("name=\"Headquarters\"").unwrap();
    assert!(summary_at < branch_at && branch_at < hq_at);

    let strings = read_zip_entry(&bytes, "xl/sharedStrings.xml");
    for text in ["Application", "Received (kilobytes)", "Sent (kilobytes)", "Zoom", "DNS"] {
        assert!(strings.contains(text), "missing {} in shared strings", text);
    }

    let summary_sheet = read_zip_entry(&bytes, "xl/worksheets/sheet1.xml");
    for value in ["<v>15</v>", "<v>21</v>", "<v>7</v>", "<v>8</v>"] {
        assert!(summary_sheet.contains(value), "missing {} in summary sheet", value);
    }
}

#[tokio::test]
async fn test_download_without_report() {
    let base = spawn_app(shared(FakeDashboard::new())).await;
    let response = reqwest::get(format!("{}/download", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let base = spawn_app(shared(FakeDashboard::new())).await;
    let response = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}
