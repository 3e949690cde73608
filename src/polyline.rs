//! Route-path geometry as a decoded coordinate sequence.
//!
//! The session core stores the path the optimizer returned for rendering;
//! it never interprets it. Decoding from the wire format (GeoJSON from the
//! optimization service) happens at the HTTP boundary, not here.

use serde::{Deserialize, Serialize};

/// An ordered sequence of `(latitude, longitude)` pairs tracing the route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Builds a polyline from `(latitude, longitude)` pairs.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Empty geometry, used before any route exists and for manually
    /// started single-point routes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a polyline from GeoJSON-ordered `[longitude, latitude]`
    /// pairs, swapping each into `(latitude, longitude)`.
    pub fn from_lng_lat(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            points: pairs.into_iter().map(|(lng, lat)| (lat, lng)).collect(),
        }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
