//! Boundary traits for the external collaborators.
//!
//! These are intentionally minimal. The session core only ever talks to the
//! optimization backend through them; `api::ApiClient` implements them over
//! HTTP and tests implement them with in-memory fixtures.

use std::fmt;

use crate::model::{
    ExportArtifact, ExportFormat, GeocodedPoint, OptimizeRequest, OptimizeResponse, RoutePoint,
};

/// A remote call failed. Carries the single human-readable message shown to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::new("Could not reach the server.")
        } else {
            Self::new(err.to_string())
        }
    }
}

/// The route-optimization service: raw contributions plus fixed points in,
/// ordered route plus summary and path geometry out.
pub trait RouteOptimizer {
    fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, RemoteError>;
}

/// Free-text address lookup and live suggestions.
pub trait Geocoder {
    fn search(&self, query: &str) -> Result<GeocodedPoint, RemoteError>;

    /// Suggestions for a partial query. Failure degrades to an empty list;
    /// it is never surfaced as an error.
    fn autocomplete(&self, partial: &str) -> Vec<String>;
}

/// Per-point attribute enrichment. The response must preserve point count,
/// identity, and relative order; composition never changes.
pub trait RouteEnricher {
    fn enrich(&self, points: &[RoutePoint]) -> Result<Vec<RoutePoint>, RemoteError>;
}

/// Route export to a downloadable file.
pub trait RouteExporter {
    fn export(
        &self,
        format: ExportFormat,
        points: &[RoutePoint],
    ) -> Result<ExportArtifact, RemoteError>;
}

/// Navigation-link generation for the active route.
pub trait NavigationLinkBuilder {
    fn build_links(&self, points: &[RoutePoint]) -> Result<Vec<String>, RemoteError>;
}
