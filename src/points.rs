//! Point lifecycle reducers.
//!
//! Pure helpers over the current route's point sequence. Each returns a new
//! sequence; the session shell swaps it in and persists.

use crate::model::{GeocodedPoint, PointId, RoutePoint};

/// Removes the point with the given id. An absent id leaves the sequence
/// untouched, so repeated deletes are idempotent. No renumbering happens
/// here; `order` is recomputed by the next reconciliation.
pub fn delete_point(points: &[RoutePoint], id: &PointId) -> Vec<RoutePoint> {
    points
        .iter()
        .filter(|p| &p.original_index != id)
        .cloned()
        .collect()
}

/// Flips the `active` flag of the point with the given id; absent ids are a
/// no-op. Deactivated points stay in the sequence so they can be
/// re-activated without re-adding.
pub fn toggle_active(points: &[RoutePoint], id: &PointId) -> Vec<RoutePoint> {
    points
        .iter()
        .map(|p| {
            if &p.original_index == id {
                let mut toggled = p.clone();
                toggled.active = !p.active;
                toggled
            } else {
                p.clone()
            }
        })
        .collect()
}

/// The points currently included in optimization, export, and link
/// generation.
pub fn active_points(points: &[RoutePoint]) -> Vec<RoutePoint> {
    points.iter().filter(|p| p.active).cloned().collect()
}

/// Builds a manually added point from a geocoder hit.
pub fn manual_point(hit: GeocodedPoint, order: u32, id: PointId) -> RoutePoint {
    RoutePoint {
        original_index: id,
        order,
        name: hit.name,
        latitude: hit.latitude,
        longitude: hit.longitude,
        address: hit.address,
        category: None,
        observations: None,
        active: true,
    }
}

/// First manual counter value not already taken by a `manual-N` id in the
/// sequence. Keeps synthesized ids unique across a session reload without
/// persisting the counter.
pub fn next_manual_counter(points: &[RoutePoint]) -> u64 {
    points
        .iter()
        .filter_map(|p| match &p.original_index {
            PointId::Manual(tag) => tag.strip_prefix("manual-")?.parse::<u64>().ok(),
            PointId::Optimized(_) => None,
        })
        .max()
        .map_or(0, |max| max + 1)
}
