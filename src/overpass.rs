//! Overpass API input layer.
//!
//! This module owns everything Overpass-shaped:
//! - Serde models for the interpreter's JSON response
//! - Street-node query construction for a named city
//! - Node extraction and element-level thinning (ids and tags survive)
//! - The downloadable export artifact wrapping the kept nodes
//! - An HTTP client with retry/backoff (requires the `http` feature)

use crate::{thin_mask, GeoPoint, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Public Overpass interpreter endpoint.
///
/// See <https://wiki.openstreetmap.org/wiki/Overpass_API>
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

// ============================================================================
// Wire Model
// ============================================================================

/// An Overpass interpreter JSON response.
///
/// Only the fields the thinning pipeline consumes are modeled; everything
/// else in the payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// A single element from an Overpass response.
///
/// Ways and relations appear in mixed output too; they carry no `lat`/`lon`
/// and are skipped by node extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

impl OverpassResponse {
    /// Parse a response from its JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Extract the node elements as [`GeoPoint`]s, preserving wire order.
    ///
    /// Non-node elements are skipped silently; node elements with missing or
    /// non-finite coordinates are skipped with a warning so that one mangled
    /// record doesn't fail the whole dataset.
    pub fn extract_nodes(&self) -> Vec<GeoPoint> {
        self.elements
            .iter()
            .filter(|el| el.kind == "node")
            .filter_map(|el| match (el.lat, el.lon) {
                (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                    Some(GeoPoint::with_id(el.id, lat, lon))
                }
                _ => {
                    warn!("skipping node {} with unusable coordinates", el.id);
                    None
                }
            })
            .collect()
    }
}

// ============================================================================
// Query Construction
// ============================================================================

/// Build the Overpass QL query that selects street nodes for a city.
///
/// The query resolves the city's administrative area (admin_level 8), then
/// collects the nodes shared between major and minor highway classes, i.e.
/// intersections between the two road networks.
pub fn street_node_query(city: &str) -> String {
    format!(
        r#"[out:json][timeout:90];
area["admin_level"="8"]["name"="{}"]["boundary"="administrative"]->.city;
way(area.city)[highway~"^(motorway|trunk|primary|secondary|tertiary|(motorway|trunk|primary|secondary)_link)$"]->.major;
way(area.city)[highway~"^(unclassified|residential|living_street|service|pedestrian|track)$"]->.minor;
node(w.major)(w.minor);
out;"#,
        city.trim()
    )
}

// ============================================================================
// Element-Level Thinning
// ============================================================================

/// Result of thinning a response's node elements.
///
/// Unlike [`crate::ThinResult`], both sides carry the full wire elements, so
/// OSM ids and tags survive into the export artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinnedNodes {
    pub kept: Vec<OverpassElement>,
    pub rejected: Vec<OverpassElement>,
}

/// Thin a response's node elements by minimum pairwise distance.
///
/// Node elements with unusable coordinates are dropped before filtering (see
/// [`OverpassResponse::extract_nodes`]); the keep mask from the single-pass
/// filter then partitions the surviving elements in wire order.
pub fn thin_response(response: &OverpassResponse, min_distance: f64) -> Result<ThinnedNodes> {
    let points = response.extract_nodes();
    let mask = thin_mask(&points, min_distance)?;

    let mut by_id: BTreeMap<i64, bool> = BTreeMap::new();
    for (point, &keep) in points.iter().zip(&mask) {
        if let Some(id) = point.id {
            by_id.insert(id, keep);
        }
    }

    let mut kept = Vec::new();
    let mut rejected = Vec::new();
    for el in response.elements.iter().filter(|el| el.kind == "node") {
        match by_id.get(&el.id) {
            Some(true) => kept.push(el.clone()),
            Some(false) => rejected.push(el.clone()),
            None => {} // dropped at extraction
        }
    }

    Ok(ThinnedNodes { kept, rejected })
}

// ============================================================================
// Export Artifact
// ============================================================================

/// The downloadable JSON artifact: kept nodes wrapped with the source
/// response's metadata, in the same shape the Overpass interpreter emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    pub elements: Vec<OverpassElement>,
}

impl FilteredExport {
    /// Wrap kept elements with the metadata of the response they came from.
    pub fn new(source: &OverpassResponse, kept: Vec<OverpassElement>) -> Self {
        Self {
            version: source.version,
            generator: source.generator.clone(),
            elements: kept,
        }
    }

    /// Serialize to pretty-printed JSON, ready to be written out.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// HTTP Client (requires "http" feature)
// ============================================================================

#[cfg(feature = "http")]
mod client {
    use super::{OverpassResponse, DEFAULT_ENDPOINT};
    use crate::{Result, ThinningError};
    use log::{info, warn};
    use std::time::Duration;

    const REQUEST_TIMEOUT_SECS: u64 = 90;
    const MAX_RETRIES: u32 = 3;

    /// Overpass interpreter client with retry and exponential backoff.
    pub struct OverpassClient {
        client: reqwest::Client,
        endpoint: String,
    }

    impl OverpassClient {
        /// Create a client against the public interpreter endpoint.
        pub fn new() -> Result<Self> {
            Self::with_endpoint(DEFAULT_ENDPOINT)
        }

        /// Create a client against a custom interpreter endpoint.
        pub fn with_endpoint(endpoint: &str) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .map_err(|e| ThinningError::Http {
                    message: format!("failed to create HTTP client: {}", e),
                })?;

            Ok(Self {
                client,
                endpoint: endpoint.to_string(),
            })
        }

        /// POST an Overpass QL query and decode the JSON response.
        ///
        /// The interpreter expects a form-encoded `data` field. Responses
        /// with 429 or 5xx status are retried up to 3 times with
        /// exponential backoff; everything else fails immediately.
        pub async fn fetch(&self, query: &str) -> Result<OverpassResponse> {
            let mut retries = 0;

            loop {
                let response = self
                    .client
                    .post(&self.endpoint)
                    .form(&[("data", query)])
                    .send()
                    .await;

                match response {
                    Ok(resp) => {
                        let status = resp.status();

                        if (status == reqwest::StatusCode::TOO_MANY_REQUESTS
                            || status.is_server_error())
                            && retries < MAX_RETRIES
                        {
                            retries += 1;
                            // 500ms, 1s, 2s
                            let backoff = Duration::from_millis(500 * (1 << (retries - 1)));
                            warn!(
                                "Overpass returned {}, retry {}/{} after {:?}",
                                status, retries, MAX_RETRIES, backoff
                            );
                            tokio::time::sleep(backoff).await;
                            continue;
                        }

                        if !status.is_success() {
                            return Err(ThinningError::Http {
                                message: format!("HTTP {}", status),
                            });
                        }

                        let parsed: OverpassResponse =
                            resp.json().await.map_err(|e| ThinningError::Http {
                                message: format!("decode error: {}", e),
                            })?;

                        info!("Overpass returned {} elements", parsed.elements.len());
                        return Ok(parsed);
                    }
                    Err(e) => {
                        if retries < MAX_RETRIES {
                            retries += 1;
                            let backoff = Duration::from_millis(500 * (1 << (retries - 1)));
                            warn!(
                                "Overpass request error ({}), retry {}/{} after {:?}",
                                e, retries, MAX_RETRIES, backoff
                            );
                            tokio::time::sleep(backoff).await;
                            continue;
                        }
                        return Err(ThinningError::Http {
                            message: format!("request error: {}", e),
                        });
                    }
                }
            }
        }

        /// Fetch the street nodes of a named city.
        pub async fn fetch_city(&self, city: &str) -> Result<OverpassResponse> {
            info!("fetching street nodes for {}", city);
            self.fetch(&super::street_node_query(city)).await
        }

        /// Blocking convenience wrapper for callers without a runtime.
        pub fn fetch_city_blocking(&self, city: &str) -> Result<OverpassResponse> {
            let runtime = tokio::runtime::Runtime::new().map_err(|e| ThinningError::Http {
                message: format!("failed to create runtime: {}", e),
            })?;
            runtime.block_on(self.fetch_city(city))
        }
    }
}

#[cfg(feature = "http")]
pub use client::OverpassClient;

// ============================================================================
// Tests
// ============================================================================
