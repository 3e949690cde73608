//! Session data model.
//!
//! Wire names follow the backend API (`original_index`, `distance_km`, ...),
//! so the same types serialize for persistence and for HTTP payloads.

use serde::{Deserialize, Serialize};

use crate::polyline::Polyline;

/// Stable identity of a route point.
///
/// Optimizer-issued points carry the integer index assigned when the route
/// was computed; manually added points carry a synthesized `"manual-N"` tag
/// from a session-local counter, so the two spaces can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Optimized(i64),
    Manual(String),
}

impl PointId {
    pub fn manual(counter: u64) -> Self {
        Self::Manual(format!("manual-{counter}"))
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual(_))
    }
}

/// A single stop on the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub original_index: PointId,
    /// 1-based display position; recomputed whenever the route changes.
    pub order: u32,
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub observations: Option<String>,
    /// Absent on the wire means active; only an explicit `false` deactivates.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Totals reported by the optimizer for the current route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_min: f64,
}

impl RouteSummary {
    pub fn zero() -> Self {
        Self {
            distance_km: 0.0,
            duration_min: 0.0,
        }
    }
}

/// The last computed route. Replaced wholesale by reconciliation; mutated in
/// place only by delete/toggle/manual-add/enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    pub points: Vec<RoutePoint>,
    pub summary: RouteSummary,
    pub geometry: Polyline,
}

/// A file contribution: name plus base64 payload, opaque to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInput {
    pub filename: String,
    pub content: String,
}

/// Accumulated raw input not yet submitted to the optimizer.
///
/// Three independent ordered sequences; drained atomically only by a
/// successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingBatch {
    pub files: Vec<FileInput>,
    pub links: Vec<String>,
    pub texts: Vec<String>,
}

impl PendingBatch {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.links.is_empty() && self.texts.is_empty()
    }
}

/// One arrival of user input, merged into the pending batch additively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contribution {
    pub files: Vec<FileInput>,
    pub links: Vec<String>,
    pub texts: Vec<String>,
}

/// The durable unit: everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub optimized_route: Option<OptimizedRoute>,
}

/// Assembled input for one optimization call: the pending batch plus the
/// points already fixed into the route.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeRequest {
    pub batch: PendingBatch,
    pub existing_points: Vec<RoutePoint>,
}

/// Successful optimizer output.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeResponse {
    pub points: Vec<RoutePoint>,
    pub summary: RouteSummary,
    pub geometry: Polyline,
}

/// Geocoder hit for a free-text query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodedPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
}

/// Export formats supported by the file-generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Kml,
    Gpx,
    GeoJson,
    MyMaps,
}

impl ExportFormat {
    /// Path segment used by the export endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Kml => "kml",
            Self::Gpx => "gpx",
            Self::GeoJson => "geojson",
            Self::MyMaps => "mymaps",
        }
    }

    /// File extension for the downloaded artifact. MyMaps ships as CSV.
    pub fn extension(self) -> &'static str {
        match self {
            Self::MyMaps => "csv",
            other => other.as_str(),
        }
    }
}

/// A downloadable artifact returned by the export service.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Lifecycle of one externally backed action kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActionStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

impl ActionStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_active_deserializes_as_true() {
        let json = concat!(
            r#"{"original_index": 3, "order": 1, "name": "A","#,
            r#" "latitude": -19.9, "longitude": -43.9}"#
        );
        let point: RoutePoint = serde_json::from_str(json).unwrap();
        assert!(point.active);
        assert_eq!(point.original_index, PointId::Optimized(3));
    }

    #[test]
    fn explicit_false_deserializes_as_inactive() {
        let json = concat!(
            r#"{"original_index": 0, "order": 1, "latitude": 0.0,"#,
            r#" "longitude": 0.0, "active": false}"#
        );
        let point: RoutePoint = serde_json::from_str(json).unwrap();
        assert!(!point.active);
    }

    #[test]
    fn manual_id_round_trips_as_string() {
        let id = PointId::manual(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""manual-7""#);
        let back: PointId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(back.is_manual());
    }

    #[test]
    fn optimizer_id_round_trips_as_integer() {
        let id = PointId::Optimized(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: PointId = serde_json::from_str(&json).unwrap();
        assert!(!back.is_manual());
    }

    #[test]
    fn pending_batch_empty_only_when_all_sequences_empty() {
        let mut batch = PendingBatch::default();
        assert!(batch.is_empty());
        batch.links.push("https://maps.example/route".to_string());
        assert!(!batch.is_empty());
    }

    #[test]
    fn export_format_mymaps_ships_as_csv() {
        assert_eq!(ExportFormat::MyMaps.as_str(), "mymaps");
        assert_eq!(ExportFormat::MyMaps.extension(), "csv");
        assert_eq!(ExportFormat::Gpx.extension(), "gpx");
    }
}
