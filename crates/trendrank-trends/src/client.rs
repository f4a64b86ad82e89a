//! HTTP client for the trends web API.
//!
//! An interest-by-region fetch is two requests: `explore` returns a set of
//! widgets, and the `GEO_MAP` widget's request and token are replayed against
//! `widgetdata/comparedgeo` to get per-region values. Errors are returned to
//! the caller as-is; nothing is retried.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::json;
use trendrank_core::{AppConfig, KeywordSet, ObservationTable, ReportingWindow};

use crate::error::TrendsError;
use crate::observations::to_observation_table;
use crate::types::{ComparedGeoResponse, ExploreResponse, GeoMapEntry, Widget};

/// Widget id of the comparison map covering all keywords.
pub const GEO_MAP_WIDGET: &str = "GEO_MAP";

/// Client for the trends web API.
///
/// Use [`TrendsClient::from_app_config`] for production or
/// [`TrendsClient::with_base_url`] to point at a mock server in tests.
pub struct TrendsClient {
    client: Client,
    base_url: Url,
    language: String,
    tz_offset: i32,
}

impl TrendsClient {
    /// Creates a client from the application config.
    ///
    /// # Errors
    ///
    /// Same as [`TrendsClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, TrendsError> {
        Self::with_base_url(
            &config.trends_base_url,
            config.trends_request_timeout_secs,
            &config.trends_user_agent,
            &config.trends_language,
            config.trends_tz_offset,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TrendsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`TrendsError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        language: &str,
        tz_offset: i32,
    ) -> Result<Self, TrendsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so `Url::join` appends endpoint paths
        // instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| TrendsError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            language: language.to_owned(),
            tz_offset,
        })
    }

    /// Calls `explore` for the given terms and returns its widgets.
    ///
    /// # Errors
    ///
    /// - [`TrendsError::RateLimited`] on HTTP 429.
    /// - [`TrendsError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`TrendsError::Http`] on network failure.
    /// - [`TrendsError::Deserialize`] if the body is not the expected JSON.
    pub async fn explore(
        &self,
        terms: &[&str],
        timeframe: &str,
        geo: &str,
    ) -> Result<Vec<Widget>, TrendsError> {
        let req = explore_request(terms, timeframe, geo).to_string();
        let url = self.build_url("explore", &[("req", req.as_str())]);
        let body = self.request_json(&url).await?;

        let explore: ExploreResponse =
            serde_json::from_value(body).map_err(|e| TrendsError::Deserialize {
                context: format!("explore(terms={})", terms.join(",")),
                source: e,
            })?;

        tracing::debug!(
            widgets = explore.widgets.len(),
            timeframe,
            geo,
            "explore returned widgets"
        );

        Ok(explore.widgets)
    }

    /// Fetches per-region interest for a `GEO_MAP` widget, at country
    /// resolution when the widget covers the whole world.
    ///
    /// # Errors
    ///
    /// Same as [`TrendsClient::explore`].
    pub async fn interest_by_region(
        &self,
        widget: &Widget,
        geo: &str,
    ) -> Result<Vec<GeoMapEntry>, TrendsError> {
        let req = region_request(&widget.request, geo).to_string();
        let url = self.build_url(
            "widgetdata/comparedgeo",
            &[("req", req.as_str()), ("token", widget.token.as_str())],
        );
        let body = self.request_json(&url).await?;

        let response: ComparedGeoResponse =
            serde_json::from_value(body).map_err(|e| TrendsError::Deserialize {
                context: format!("comparedgeo(widget={})", widget.id),
                source: e,
            })?;

        Ok(response.default.geo_map_data)
    }

    /// Fetches the interest-by-country observation table for a keyword set
    /// over `window`.
    ///
    /// # Errors
    ///
    /// [`TrendsError::MissingWidget`] if `explore` returns no `GEO_MAP`
    /// widget, otherwise the errors of the two underlying requests.
    pub async fn fetch_interest_by_country(
        &self,
        keywords: &KeywordSet,
        window: ReportingWindow,
        geo: &str,
    ) -> Result<ObservationTable, TrendsError> {
        let terms: Vec<&str> = keywords.terms().collect();
        let widgets = self.explore(&terms, &window.timeframe(), geo).await?;

        let widget = widgets
            .iter()
            .find(|w| w.id == GEO_MAP_WIDGET)
            .ok_or_else(|| TrendsError::MissingWidget {
                widget_id: GEO_MAP_WIDGET.to_string(),
            })?;

        let entries = self.interest_by_region(widget, geo).await?;
        let table = to_observation_table(entries, keywords, window);

        tracing::info!(
            countries = table.rows.len(),
            keywords = keywords.len(),
            start_date = %window.start_date,
            end_date = %window.end_date,
            "fetched interest by country"
        );

        Ok(table)
    }

    /// Builds an endpoint URL with `hl`, `tz` and the given query parameters,
    /// all percent-encoded.
    fn build_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self
            .base_url
            .join(endpoint)
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("hl", &self.language);
            pairs.append_pair("tz", &self.tz_offset.to_string());
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends a GET request, maps non-2xx statuses to typed errors, strips the
    /// anti-XSSI guard and parses the remaining body as JSON.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, TrendsError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TrendsError::RateLimited {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(TrendsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(strip_xssi_guard(&body)).map_err(|e| TrendsError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })
    }
}

fn explore_request(terms: &[&str], timeframe: &str, geo: &str) -> serde_json::Value {
    let items: Vec<serde_json::Value> = terms
        .iter()
        .map(|term| json!({ "keyword": term, "time": timeframe, "geo": geo }))
        .collect();

    json!({
        "comparisonItem": items,
        "category": 0,
        "property": "",
    })
}

/// The widget's own request with low-volume regions included and, for a
/// worldwide query, country resolution.
fn region_request(widget_request: &serde_json::Value, geo: &str) -> serde_json::Value {
    let mut req = widget_request.clone();
    if let Some(obj) = req.as_object_mut() {
        if geo.is_empty() {
            obj.insert("resolution".to_string(), json!("COUNTRY"));
        }
        obj.insert("includeLowSearchVolumeGeos".to_string(), json!(true));
    }
    req
}

/// Removes the `)]}'` prefix (optionally followed by a comma) that the API
/// puts in front of its JSON bodies.
fn strip_xssi_guard(body: &str) -> &str {
    let trimmed = body.trim_start();
    match trimmed.strip_prefix(")]}'") {
        Some(rest) => rest.trim_start_matches(',').trim_start(),
        None => trimmed,
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
