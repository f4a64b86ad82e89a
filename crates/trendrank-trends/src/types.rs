//! Trends web API response types.
//!
//! Both endpoints prefix their JSON with an anti-XSSI guard (`)]}'`), which
//! the client strips before these types are deserialized.

use serde::Deserialize;
use trendrank_core::Score;

/// Body of the `explore` endpoint.
#[derive(Debug, Deserialize)]
pub struct ExploreResponse {
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

/// One widget from an `explore` response. `request` and `token` are echoed
/// back to the matching `widgetdata` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Widget {
    pub id: String,
    pub token: String,
    pub request: serde_json::Value,
}

/// Body of the `widgetdata/comparedgeo` endpoint.
#[derive(Debug, Deserialize)]
pub struct ComparedGeoResponse {
    pub default: ComparedGeoData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedGeoData {
    #[serde(default)]
    pub geo_map_data: Vec<GeoMapEntry>,
}

/// Interest values for one region.
///
/// `value[i]` is the score of the i-th compared keyword, in request order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoMapEntry {
    pub geo_code: String,
    pub geo_name: String,
    #[serde(default)]
    pub value: Vec<Score>,
}
