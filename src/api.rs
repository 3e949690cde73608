//! Blocking HTTP adapter for the route-planning backend.
//!
//! Implements the boundary traits over the backend's REST API. All wire
//! decoding (including GeoJSON path geometry) lives here; the session core
//! only ever sees the crate's own types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{
    ExportArtifact, ExportFormat, FileInput, GeocodedPoint, OptimizeRequest, OptimizeResponse,
    RoutePoint, RouteSummary,
};
use crate::polyline::Polyline;
use crate::traits::{
    Geocoder, NavigationLinkBuilder, RemoteError, RouteEnricher, RouteExporter, RouteOptimizer,
};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }
}

#[derive(Serialize)]
struct OptimizationOptions {
    optimization_mode: &'static str,
}

#[derive(Serialize)]
struct ProcessRequestBody<'a> {
    files: &'a [FileInput],
    links: &'a [String],
    texts: &'a [String],
    existing_points: &'a [RoutePoint],
    options: OptimizationOptions,
}

#[derive(Deserialize)]
struct ProcessResponseBody {
    #[serde(default)]
    message: String,
    optimized_route: Option<Vec<RoutePoint>>,
    summary: Option<RouteSummary>,
    map_geojson: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Extracts the server's `detail` message when present, otherwise a generic
/// status-based one.
fn failure_message(response: reqwest::blocking::Response) -> RemoteError {
    let status = response.status();
    let detail = response
        .json::<ErrorBody>()
        .ok()
        .and_then(|body| body.detail);
    match detail {
        Some(detail) => RemoteError::new(detail),
        None => RemoteError::new(format!("Server rejected the request ({status}).")),
    }
}

/// Pulls the first LineString-shaped coordinate array out of a GeoJSON
/// value. The backend wraps the route path in a FeatureCollection; anything
/// unrecognized decodes to an empty polyline.
fn geojson_polyline(value: &Value) -> Polyline {
    fn find_line(value: &Value) -> Option<Vec<(f64, f64)>> {
        match value {
            Value::Object(map) => {
                if let Some(pairs) = map.get("coordinates").and_then(coordinate_pairs) {
                    return Some(pairs);
                }
                map.values().find_map(find_line)
            }
            Value::Array(items) => items.iter().find_map(find_line),
            _ => None,
        }
    }

    fn coordinate_pairs(value: &Value) -> Option<Vec<(f64, f64)>> {
        let items = value.as_array()?;
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            let pair = item.as_array()?;
            if pair.len() < 2 {
                return None;
            }
            pairs.push((pair[0].as_f64()?, pair[1].as_f64()?));
        }
        if pairs.is_empty() { None } else { Some(pairs) }
    }

    find_line(value)
        .map(Polyline::from_lng_lat)
        .unwrap_or_default()
}

/// Filename from a `Content-Disposition` header, or the conventional
/// download name for the format.
fn artifact_filename(header: Option<&str>, format: ExportFormat) -> String {
    header
        .and_then(|value| {
            let (_, rest) = value.split_once("filename=\"")?;
            let (name, _) = rest.split_once('"')?;
            (!name.is_empty()).then(|| name.to_string())
        })
        .unwrap_or_else(|| format!("rota_otimizada.{}", format.extension()))
}

impl RouteOptimizer for ApiClient {
    fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, RemoteError> {
        let body = ProcessRequestBody {
            files: &request.batch.files,
            links: &request.batch.links,
            texts: &request.batch.texts,
            existing_points: &request.existing_points,
            options: OptimizationOptions {
                optimization_mode: "online",
            },
        };

        let response = self
            .client
            .post(self.url("process/optimize"))
            .json(&body)
            .send()?;
        if !response.status().is_success() {
            return Err(failure_message(response));
        }

        let payload: ProcessResponseBody = response.json()?;
        let (Some(points), Some(summary)) = (payload.optimized_route, payload.summary) else {
            let message = if payload.message.is_empty() {
                "The optimizer returned no route.".to_string()
            } else {
                payload.message
            };
            return Err(RemoteError::new(message));
        };

        Ok(OptimizeResponse {
            points,
            summary,
            geometry: payload
                .map_geojson
                .as_ref()
                .map(geojson_polyline)
                .unwrap_or_default(),
        })
    }
}

impl Geocoder for ApiClient {
    fn search(&self, query: &str) -> Result<GeocodedPoint, RemoteError> {
        let response = self
            .client
            .get(self.url("geocode/search"))
            .query(&[("q", query)])
            .send()?;
        if !response.status().is_success() {
            return Err(failure_message(response));
        }
        Ok(response.json()?)
    }

    fn autocomplete(&self, partial: &str) -> Vec<String> {
        self.client
            .get(self.url("geocode/autocomplete"))
            .query(&[("q", partial)])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<Vec<String>>())
            .unwrap_or_default()
    }
}

impl RouteEnricher for ApiClient {
    fn enrich(&self, points: &[RoutePoint]) -> Result<Vec<RoutePoint>, RemoteError> {
        #[derive(Serialize)]
        struct EnrichRequestBody<'a> {
            points: &'a [RoutePoint],
        }

        let response = self
            .client
            .post(self.url("process/enrich-with-ai"))
            .json(&EnrichRequestBody { points })
            .send()?;
        if !response.status().is_success() {
            return Err(failure_message(response));
        }
        Ok(response.json()?)
    }
}

impl RouteExporter for ApiClient {
    fn export(
        &self,
        format: ExportFormat,
        points: &[RoutePoint],
    ) -> Result<ExportArtifact, RemoteError> {
        let response = self
            .client
            .post(self.url(&format!("export/{}", format.as_str())))
            .json(&points)
            .send()?;
        if !response.status().is_success() {
            return Err(failure_message(response));
        }

        let filename = artifact_filename(
            response
                .headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok()),
            format,
        );
        let bytes = response.bytes()?.to_vec();
        Ok(ExportArtifact { filename, bytes })
    }
}

impl NavigationLinkBuilder for ApiClient {
    fn build_links(&self, points: &[RoutePoint]) -> Result<Vec<String>, RemoteError> {
        let response = self
            .client
            .post(self.url("export/google-maps-links"))
            .json(&points)
            .send()?;
        if !response.status().is_success() {
            return Err(failure_message(response));
        }
        Ok(response.json()?)
    }
}
