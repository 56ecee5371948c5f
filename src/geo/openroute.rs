//! OpenRouteService client: geocoding search plus driving directions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{DistanceEstimator, EstimateError, RouteEstimate};

const METERS_PER_KILOMETER: f64 = 1000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct OpenRouteConfig {
    pub base_url: String,
    pub api_key: String,
    pub directions_path: String,
    pub geocode_path: String,
    pub timeout: Duration,
}

/// `[longitude, latitude]`, the order the provider uses everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    fn as_param(&self) -> String {
        format!("{:.7},{:.7}", self.lon, self.lat)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    features: Vec<DirectionsFeature>,
}

#[derive(Debug, Deserialize)]
struct DirectionsFeature {
    properties: Option<DirectionsProperties>,
}

#[derive(Debug, Deserialize)]
struct DirectionsProperties {
    summary: Option<Summary>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    distance: Option<f64>,
    duration: Option<f64>,
}

impl GeocodeResponse {
    /// Coordinates of the best match, if it has exactly two components.
    pub fn first_coordinates(&self) -> Option<Coordinates> {
        let geometry = self.features.first()?.geometry.as_ref()?;
        match geometry.coordinates.as_slice() {
            [lon, lat] => Some(Coordinates {
                lon: *lon,
                lat: *lat,
            }),
            _ => None,
        }
    }
}

impl DirectionsResponse {
    pub fn first_estimate(&self) -> Option<RouteEstimate> {
        let summary = self.features.first()?.properties.as_ref()?.summary.as_ref()?;
        let meters = summary.distance?;
        let seconds = summary.duration.unwrap_or(0.0);
        Some(RouteEstimate {
            distance_km: meters / METERS_PER_KILOMETER,
            eta_minutes: seconds / SECONDS_PER_MINUTE,
        })
    }
}

/// Appends `path` below the base URL, keeping any prefix such as a proxy
/// mount point.
fn join_endpoint(base_url: &str, path: &str) -> Result<Url, EstimateError> {
    let base = if base_url.ends_with('/') {
        Url::parse(base_url)
    } else {
        Url::parse(&format!("{base_url}/"))
    }
    .map_err(|e| EstimateError::InvalidRequest(format!("{base_url}: {e}")))?;
    base.join(path.trim_start_matches('/'))
        .map_err(|e| EstimateError::InvalidRequest(format!("{path}: {e}")))
}

pub struct OpenRouteService {
    client: Client,
    config: OpenRouteConfig,
}

impl OpenRouteService {
    pub fn new(config: OpenRouteConfig) -> Result<Self, EstimateError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EstimateError> {
        join_endpoint(&self.config.base_url, path)
    }

    /// Resolve an address to coordinates. `Ok(None)` when the provider has no
    /// match or could not be reached.
    pub async fn coordinates(&self, address: &str) -> Result<Option<Coordinates>, EstimateError> {
        let url = self.endpoint(&self.config.geocode_path)?;
        debug!(address, "geocoding address");
        let response: Option<GeocodeResponse> = self
            .fetch(url, &[("api_key", self.config.api_key.as_str()), ("text", address)])
            .await;
        Ok(response.and_then(|r| r.first_coordinates()))
    }

    /// Driving route between two points. Zero when no route is returned.
    pub async fn route(
        &self,
        start: Coordinates,
        end: Coordinates,
    ) -> Result<RouteEstimate, EstimateError> {
        let url = self.endpoint(&self.config.directions_path)?;
        let (start, end) = (start.as_param(), end.as_param());
        debug!(%start, %end, "requesting driving directions");
        let response: Option<DirectionsResponse> = self
            .fetch(
                url,
                &[
                    ("api_key", self.config.api_key.as_str()),
                    ("start", start.as_str()),
                    ("end", end.as_str()),
                ],
            )
            .await;
        Ok(response
            .and_then(|r| r.first_estimate())
            .unwrap_or_else(RouteEstimate::zero))
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Option<T> {
        let response = match self.client.get(url).query(query).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "routing provider unreachable");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "routing provider returned an error");
            return None;
        }

        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(error = %err, "routing provider sent an unreadable body");
                None
            }
        }
    }
}

#[async_trait]
impl DistanceEstimator for OpenRouteService {
    async fn estimate(&self, from: &str, to: &str) -> Result<RouteEstimate, EstimateError> {
        if from.trim().is_empty() || to.trim().is_empty() {
            warn!("missing address, distance not calculated");
            return Ok(RouteEstimate::zero());
        }

        let start = self.coordinates(from).await?;
        let end = self.coordinates(to).await?;
        match (start, end) {
            (Some(start), Some(end)) => self.route(start, end).await,
            _ => {
                warn!(from, to, "could not geocode both addresses, distance not calculated");
                Ok(RouteEstimate::zero())
            }
        }
    }
}
