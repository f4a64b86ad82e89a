use super::*;

fn test_client(base_url: &str) -> TrendsClient {
    TrendsClient::with_base_url(base_url, 30, "trendrank-test/0.1", "en-US", 0)
        .expect("client construction should not fail")
}

#[test]
fn build_url_appends_endpoint_and_locale_params() {
    let client = test_client("https://trends.example.com/trends/api");
    let url = client.build_url("explore", &[("req", "{}")]);
    assert_eq!(url.path(), "/trends/api/explore");
    assert_eq!(
        url.query(),
        Some("hl=en-US&tz=0&req=%7B%7D"),
        "unexpected query: {url}"
    );
}

#[test]
fn build_url_handles_trailing_slash_and_nested_endpoint() {
    let client = test_client("https://trends.example.com/trends/api/");
    let url = client.build_url("widgetdata/comparedgeo", &[("token", "abc")]);
    assert_eq!(url.path(), "/trends/api/widgetdata/comparedgeo");
    assert!(url.as_str().ends_with("token=abc"));
}

#[test]
fn build_url_encodes_negative_tz_offset() {
    let client = TrendsClient::with_base_url("https://t.example.com", 30, "ua", "de", -60)
        .expect("client construction should not fail");
    let url = client.build_url("explore", &[]);
    assert_eq!(url.query(), Some("hl=de&tz=-60"));
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = TrendsClient::with_base_url("not a url", 30, "ua", "en-US", 0);
    assert!(matches!(result, Err(TrendsError::InvalidBaseUrl { .. })));
}

#[test]
fn explore_request_lists_one_comparison_item_per_term() {
    let req = explore_request(&["vpn", "hack"], "now 7-d", "");
    assert_eq!(
        req,
        json!({
            "comparisonItem": [
                { "keyword": "vpn", "time": "now 7-d", "geo": "" },
                { "keyword": "hack", "time": "now 7-d", "geo": "" }
            ],
            "category": 0,
            "property": ""
        })
    );
}

#[test]
fn region_request_sets_country_resolution_for_worldwide_queries() {
    let widget_req = json!({ "geo": {}, "resolution": "REGION", "locale": "en-US" });
    let req = region_request(&widget_req, "");
    assert_eq!(req["resolution"], "COUNTRY");
    assert_eq!(req["includeLowSearchVolumeGeos"], true);
    assert_eq!(req["locale"], "en-US");
}

#[test]
fn region_request_keeps_resolution_for_geo_filtered_queries() {
    let widget_req = json!({ "geo": { "country": "DE" }, "resolution": "REGION" });
    let req = region_request(&widget_req, "DE");
    assert_eq!(req["resolution"], "REGION");
    assert_eq!(req["includeLowSearchVolumeGeos"], true);
}

#[test]
fn strip_xssi_guard_handles_both_prefixes() {
    assert_eq!(strip_xssi_guard(")]}'\n{\"a\":1}"), "{\"a\":1}");
    assert_eq!(strip_xssi_guard(")]}',\n{\"a\":1}"), "{\"a\":1}");
    assert_eq!(strip_xssi_guard("{\"a\":1}"), "{\"a\":1}");
}
