//! Integration tests for `TrendsClient` using wiremock HTTP mocks.

use chrono::NaiveDate;
use serde_json::json;
use trendrank_core::{KeywordSet, ReportingWindow, Score};
use trendrank_trends::{TrendsClient, TrendsError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> TrendsClient {
    TrendsClient::with_base_url(base_url, 5, "trendrank-test/0.1", "en-US", 0)
        .expect("client construction should not fail")
}

fn window() -> ReportingWindow {
    ReportingWindow::ending_on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
}

/// Wraps a JSON body in the anti-XSSI guard the real API sends.
fn guarded(prefix: &str, body: &serde_json::Value) -> String {
    format!("{prefix}\n{body}")
}

fn explore_body() -> serde_json::Value {
    json!({
        "widgets": [
            {
                "id": "TIMESERIES",
                "title": "Interest over time",
                "token": "ts-token",
                "request": { "time": "now 7-d" }
            },
            {
                "id": "GEO_MAP",
                "title": "Compared breakdown by region",
                "token": "geo-token",
                "request": { "geo": {}, "resolution": "COUNTRY", "locale": "en-US" }
            },
            {
                "id": "GEO_MAP_0",
                "title": "Interest by region",
                "token": "geo-0-token",
                "request": {}
            }
        ]
    })
}

fn comparedgeo_body() -> serde_json::Value {
    json!({
        "default": {
            "geoMapData": [
                {
                    "geoCode": "GB",
                    "geoName": "United Kingdom",
                    "value": [60, 40, 30, 20, 10],
                    "formattedValue": ["60", "40", "30", "20", "10"],
                    "maxValueIndex": 0,
                    "hasData": [true, true, true, true, true]
                },
                {
                    "geoCode": "CH",
                    "geoName": "Switzerland",
                    "value": [60, 60, 60, 90, 100],
                    "formattedValue": ["60", "60", "60", "90", "100"],
                    "maxValueIndex": 4,
                    "hasData": [true, true, true, true, true]
                }
            ]
        }
    })
}

#[tokio::test]
async fn explore_returns_widgets_after_stripping_guard() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore"))
        .and(query_param("hl", "en-US"))
        .and(query_param("tz", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(")]}'", &explore_body())))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let widgets = client
        .explore(&["vpn", "hack"], "now 7-d", "")
        .await
        .expect("should parse widgets");

    assert_eq!(widgets.len(), 3);
    assert_eq!(widgets[1].id, "GEO_MAP");
    assert_eq!(widgets[1].token, "geo-token");
}

#[tokio::test]
async fn fetch_interest_by_country_builds_observation_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(")]}'", &explore_body())))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/widgetdata/comparedgeo"))
        .and(query_param("token", "geo-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(guarded(")]}',", &comparedgeo_body())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let keywords = KeywordSet::reference();
    let table = client
        .fetch_interest_by_country(&keywords, window(), "")
        .await
        .expect("fetch should succeed");

    assert_eq!(table.window, window());
    assert_eq!(table.rows.len(), 2);

    let uk = &table.rows[0];
    assert_eq!(uk.country, "United Kingdom");
    assert_eq!(uk.country_code, "GB");
    assert_eq!(uk.score("VPN"), Some(&Score::Value(60.0)));
    assert_eq!(uk.score("WiFi"), Some(&Score::Value(10.0)));

    let swiss = &table.rows[1];
    assert_eq!(swiss.score("Security"), Some(&Score::Value(90.0)));
}

#[tokio::test]
async fn missing_geo_map_widget_is_an_error() {
    let server = MockServer::start().await;

    let body = json!({ "widgets": [{ "id": "TIMESERIES", "token": "t", "request": {} }] });
    Mock::given(method("GET"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(")]}'", &body)))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .fetch_interest_by_country(&KeywordSet::reference(), window(), "")
        .await;

    assert!(
        matches!(result, Err(TrendsError::MissingWidget { ref widget_id }) if widget_id == "GEO_MAP"),
        "expected MissingWidget, got: {result:?}"
    );
}

#[tokio::test]
async fn rate_limit_is_surfaced_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.explore(&["vpn"], "now 7-d", "").await;

    assert!(
        matches!(result, Err(TrendsError::RateLimited { .. })),
        "expected RateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn server_error_maps_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.explore(&["vpn"], "now 7-d", "").await;

    assert!(
        matches!(result, Err(TrendsError::UnexpectedStatus { status: 500, .. })),
        "expected UnexpectedStatus(500), got: {result:?}"
    );
}

#[tokio::test]
async fn non_json_body_maps_to_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.explore(&["vpn"], "now 7-d", "").await;

    assert!(
        matches!(result, Err(TrendsError::Deserialize { .. })),
        "expected Deserialize, got: {result:?}"
    );
}

#[tokio::test]
async fn comparedgeo_with_unexpected_shape_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guarded(")]}'", &explore_body())))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/widgetdata/comparedgeo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(")]}',\n{\"unexpected\":true}"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .fetch_interest_by_country(&KeywordSet::reference(), window(), "")
        .await;

    assert!(
        matches!(result, Err(TrendsError::Deserialize { .. })),
        "expected Deserialize, got: {result:?}"
    );
}
